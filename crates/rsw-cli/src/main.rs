//! Redshift writer CLI - loads exported CSV tables from object storage into Redshift

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod logging;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    ExitCode::from(commands::execute(&cli).await)
}
