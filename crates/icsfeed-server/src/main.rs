//! icsfeed entry point.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::Parser;

use icsfeed_core::init_tracing;
use icsfeed_server::cli::{Cli, Command};
use icsfeed_server::commands;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.tracing_config(io::stdout().is_terminal())) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Some(Command::CheckConfig) => commands::check_config(&cli),
        Some(Command::Serve) | None => commands::serve(&cli).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
