use clap::Parser;

fn main() {
    codegraph::observability::init_logging();

    let cli = codegraph::cli::Cli::parse();
    if let Err(err) = codegraph::cli::run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
