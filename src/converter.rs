use crate::driver::Driver;
use crate::{AbxError, BinaryXmlDeserializer, Options, Result};
use quick_xml::Reader as XmlReader;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Read, Write};

/// High-level converter for ABX to XML conversion
pub struct AbxToXmlConverter;

impl AbxToXmlConverter {
    /// Convert ABX from a reader to a writer.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use apiary::AbxToXmlConverter;
    /// use std::fs::File;
    ///
    /// let input = File::open("input.abx").unwrap();
    /// let output = File::create("output.xml").unwrap();
    /// AbxToXmlConverter::convert(input, output).unwrap();
    /// ```
    pub fn convert<R: Read, W: Write>(reader: R, writer: W) -> Result<()> {
        Self::convert_with_options(reader, writer, Options::new())
    }

    /// Convert ABX from a reader to a writer with explicit options
    pub fn convert_with_options<R: Read, W: Write>(
        reader: R,
        writer: W,
        options: Options,
    ) -> Result<()> {
        let mut deserializer = BinaryXmlDeserializer::with_options(reader, writer, options)?;
        deserializer.deserialize()
    }

    /// Convert an ABX file to an XML file.
    ///
    /// When both paths are equal the conversion happens in place.
    pub fn convert_file(input_path: &str, output_path: &str) -> Result<()> {
        if input_path == output_path {
            return Self::convert_file_in_place(input_path);
        }

        let input_file = File::open(input_path)?;
        let reader = BufReader::new(input_file);
        let output_file = File::create(output_path)?;
        let writer = BufWriter::new(output_file);
        Self::convert(reader, writer)
    }

    /// Convert ABX from stdin to stdout
    pub fn convert_stdin_stdout() -> Result<()> {
        let stdin = io::stdin();
        let reader = stdin.lock();
        let stdout = io::stdout();
        let writer = BufWriter::new(stdout.lock());
        Self::convert(reader, writer)
    }

    /// Convert ABX from stdin to a file
    pub fn convert_stdin_to_file(output_path: &str) -> Result<()> {
        let stdin = io::stdin();
        let reader = stdin.lock();
        let output_file = File::create(output_path)?;
        let writer = BufWriter::new(output_file);
        Self::convert(reader, writer)
    }

    /// Convert an ABX file to stdout
    pub fn convert_file_to_stdout(input_path: &str) -> Result<()> {
        let input_file = File::open(input_path)?;
        let reader = BufReader::new(input_file);
        let writer = io::stdout();
        Self::convert(reader, writer)
    }

    /// Convert an ABX file in place (overwrites the original file).
    ///
    /// The whole conversion runs in memory first so a failure leaves the
    /// original file untouched.
    fn convert_file_in_place(file_path: &str) -> Result<()> {
        let input_file = File::open(file_path)?;
        let mut reader = BufReader::new(input_file);
        let mut file_data = Vec::new();
        reader.read_to_end(&mut file_data)?;

        let output_data = Self::convert_bytes(&file_data)?;

        let output_file = File::create(file_path)?;
        let mut writer = BufWriter::new(output_file);
        writer.write_all(output_data.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Convert in-memory ABX data to an XML string.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use apiary::AbxToXmlConverter;
    ///
    /// let abx_data = std::fs::read("input.abx").unwrap();
    /// let xml = AbxToXmlConverter::convert_bytes(&abx_data).unwrap();
    /// println!("{}", xml);
    /// ```
    pub fn convert_bytes(abx_data: &[u8]) -> Result<String> {
        let cursor = Cursor::new(abx_data);
        let mut output_data = Vec::new();
        {
            let writer = Cursor::new(&mut output_data);
            Self::convert(cursor, writer)?;
        }
        String::from_utf8(output_data)
            .map_err(|_| AbxError::ParseError("Invalid UTF-8 in output".to_string()))
    }
}

/// High-level converter for XML to ABX conversion
pub struct XmlToAbxConverter;

impl XmlToAbxConverter {
    /// Convert an XML string into ABX bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// use apiary::XmlToAbxConverter;
    ///
    /// let abx = XmlToAbxConverter::convert_str(r#"<r a="42"/>"#).unwrap();
    /// assert_eq!(&abx[0..4], b"ABX\0");
    /// ```
    pub fn convert_str(xml: &str) -> Result<Vec<u8>> {
        Self::convert_str_with_options(xml, Options::new())
    }

    /// Convert an XML string into ABX bytes with explicit options
    pub fn convert_str_with_options(xml: &str, options: Options) -> Result<Vec<u8>> {
        let mut abx = Vec::new();
        let driver = Driver::new(&mut abx, options)?;
        driver.run(XmlReader::from_str(xml))?;
        Ok(abx)
    }

    /// Convert XML from a buffered reader to an ABX writer
    pub fn convert_reader<R: BufRead, W: Write>(input: R, writer: W) -> Result<()> {
        Self::convert_reader_with_options(input, writer, Options::new())
    }

    /// Convert XML from a buffered reader to an ABX writer with options
    pub fn convert_reader_with_options<R: BufRead, W: Write>(
        input: R,
        writer: W,
        options: Options,
    ) -> Result<()> {
        let driver = Driver::new(writer, options)?;
        driver.run(XmlReader::from_reader(input))
    }

    /// Convert an XML file to an ABX file.
    ///
    /// When both paths are equal the conversion happens in place.
    pub fn convert_file(input_path: &str, output_path: &str) -> Result<()> {
        Self::convert_file_with_options(input_path, output_path, Options::new())
    }

    /// Convert an XML file to an ABX file with explicit options
    pub fn convert_file_with_options(
        input_path: &str,
        output_path: &str,
        options: Options,
    ) -> Result<()> {
        if input_path == output_path {
            return Self::convert_file_in_place(input_path, options);
        }

        let input_file = File::open(input_path)?;
        let reader = BufReader::new(input_file);
        let output_file = File::create(output_path)?;
        let writer = BufWriter::new(output_file);
        Self::convert_reader_with_options(reader, writer, options)
    }

    /// Convert XML from stdin to an ABX writer
    pub fn convert_stdin<W: Write>(writer: W, options: Options) -> Result<()> {
        let stdin = io::stdin();
        Self::convert_reader_with_options(stdin.lock(), writer, options)
    }

    fn convert_file_in_place(file_path: &str, options: Options) -> Result<()> {
        let xml = std::fs::read_to_string(file_path)?;
        let abx = Self::convert_str_with_options(&xml, options)?;

        let output_file = File::create(file_path)?;
        let mut writer = BufWriter::new(output_file);
        writer.write_all(&abx)?;
        writer.flush()?;
        Ok(())
    }
}
