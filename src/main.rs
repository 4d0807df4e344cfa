use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "foxlang", about = "Runs a FoxLang script")]
struct Cli {
    /// The script file to execute
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Seed for random(), for reproducible runs
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match foxlang::run_file(&cli.file, cli.seed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
