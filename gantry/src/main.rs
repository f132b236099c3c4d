use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use gantry_cli::{Cli, run};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(report) => {
            print!("{}", report.output);
            report.exit_code()
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
