use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use ampliclust::command::Commands;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut cli = Cli::parse();
    let result = cli.command.try_execute();

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    return ExitCode::SUCCESS;
}
