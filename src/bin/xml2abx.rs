use apiary::cli::Xml2AbxCli;

fn main() {
    if let Err(e) = Xml2AbxCli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
