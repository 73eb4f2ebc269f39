//! Command definitions and entry points for the `abx2xml` and `xml2abx`
//! binaries.

use crate::{pretty, AbxError, AbxToXmlConverter, Options, Result, XmlToAbxConverter};
use clap::{Arg, Command};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};

/// CLI for the `abx2xml` binary
pub struct Abx2XmlCli;

impl Abx2XmlCli {
    pub fn build_command() -> Command {
        Command::new("abx2xml")
            .about("Converts Android Binary XML (ABX) to human-readable XML")
            .long_about("Converts between Android Binary XML and human-readable XML.\n\nWhen invoked with the '-i' argument, the output of a successful conversion will overwrite the original input file. Input can be '-' to use stdin, and output can be '-' to use stdout.")
            .arg(
                Arg::new("in-place")
                    .short('i')
                    .long("in-place")
                    .help("Overwrite input file with converted output")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("pretty")
                    .short('p')
                    .long("pretty")
                    .help("Re-indent the emitted XML")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("input")
                    .help("Input file path (use '-' for stdin)")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("output")
                    .help("Output file path (use '-' for stdout)")
                    .index(2),
            )
    }

    pub fn run() -> Result<()> {
        let matches = Self::build_command().get_matches();
        Self::run_with_matches(matches)
    }

    pub fn run_with_matches(matches: clap::ArgMatches) -> Result<()> {
        let input_path = matches
            .get_one::<String>("input")
            .ok_or_else(|| AbxError::ParseError("Missing required argument: INPUT".to_string()))?;
        let output_path = matches.get_one::<String>("output");
        let in_place = matches.get_flag("in-place");
        let pretty = matches.get_flag("pretty");

        if in_place && input_path == "-" {
            return Err(AbxError::ParseError(
                "Cannot use -i option with stdin input".to_string(),
            ));
        }

        let output_path = resolve_output(output_path, input_path, in_place);

        if pretty {
            let abx = read_input(input_path)?;
            let xml = AbxToXmlConverter::convert_bytes(&abx)?;
            let mut formatted = pretty::reformat(&xml)?;
            formatted.push('\n');
            return write_output(&output_path, formatted.as_bytes());
        }

        match (input_path.as_str(), output_path.as_str()) {
            ("-", "-") => AbxToXmlConverter::convert_stdin_stdout(),
            ("-", output) => AbxToXmlConverter::convert_stdin_to_file(output),
            (input, "-") => AbxToXmlConverter::convert_file_to_stdout(input),
            (input, output) => AbxToXmlConverter::convert_file(input, output),
        }
    }
}

/// CLI for the `xml2abx` binary
pub struct Xml2AbxCli;

impl Xml2AbxCli {
    pub fn build_command() -> Command {
        Command::new("xml2abx")
            .about("Converts human-readable XML to Android Binary XML (ABX)")
            .long_about("Converts between human-readable XML and Android Binary XML.\n\nWhen invoked with the '-i' argument, the output of a successful conversion will overwrite the original input file. Input can be '-' to use stdin, and output can be '-' to use stdout.")
            .arg(
                Arg::new("in-place")
                    .short('i')
                    .long("in-place")
                    .help("Overwrite input file with converted output")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("collapse-whitespace")
                    .long("collapse-whitespace")
                    .help("Drop whitespace-only text nodes instead of preserving them")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("input")
                    .help("Input file path (use '-' for stdin)")
                    .required(true)
                    .index(1),
            )
            .arg(
                Arg::new("output")
                    .help("Output file path (use '-' for stdout)")
                    .index(2),
            )
    }

    pub fn run() -> Result<()> {
        let matches = Self::build_command().get_matches();
        Self::run_with_matches(matches)
    }

    pub fn run_with_matches(matches: clap::ArgMatches) -> Result<()> {
        let input_path = matches
            .get_one::<String>("input")
            .ok_or_else(|| AbxError::ParseError("Missing required argument: INPUT".to_string()))?;
        let output_path = matches.get_one::<String>("output");
        let in_place = matches.get_flag("in-place");
        let collapse = matches.get_flag("collapse-whitespace");

        if in_place && input_path == "-" {
            return Err(AbxError::ParseError(
                "Cannot use -i option with stdin input".to_string(),
            ));
        }

        let output_path = resolve_output(output_path, input_path, in_place);
        let options = || Options::new().collapse_whitespace(collapse);

        match (input_path.as_str(), output_path.as_str()) {
            ("-", "-") => {
                let stdout = io::stdout();
                let writer = BufWriter::new(stdout.lock());
                XmlToAbxConverter::convert_stdin(writer, options())
            }
            ("-", output) => {
                let file = File::create(output)?;
                XmlToAbxConverter::convert_stdin(BufWriter::new(file), options())
            }
            (input, "-") => {
                let xml = std::fs::read_to_string(input)?;
                let abx = XmlToAbxConverter::convert_str_with_options(&xml, options())?;
                let stdout = io::stdout();
                let mut writer = stdout.lock();
                writer.write_all(&abx)?;
                writer.flush()?;
                Ok(())
            }
            (input, output) => {
                XmlToAbxConverter::convert_file_with_options(input, output, options())
            }
        }
    }
}

fn resolve_output(output: Option<&String>, input: &str, in_place: bool) -> String {
    match output {
        Some(path) => path.clone(),
        None => {
            if in_place {
                input.to_string()
            } else {
                "-".to_string()
            }
        }
    }
}

fn read_input(path: &str) -> Result<Vec<u8>> {
    if path == "-" {
        let mut data = Vec::new();
        io::stdin().lock().read_to_end(&mut data)?;
        Ok(data)
    } else {
        Ok(std::fs::read(path)?)
    }
}

fn write_output(path: &str, content: &[u8]) -> Result<()> {
    if path == "-" {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        writer.write_all(content)?;
        writer.flush()?;
    } else {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(content)?;
        writer.flush()?;
    }
    Ok(())
}
