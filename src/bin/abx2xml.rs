use apiary::cli::Abx2XmlCli;

fn main() {
    if let Err(e) = Abx2XmlCli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
