//! CLI argument definitions using clap derive API

use clap::Parser;
use std::path::PathBuf;

/// Redshift writer - loads exported CSV tables into Redshift
///
/// The action, connection parameters and tables are read from
/// `<data>/config.json`; table manifests from `<data>/in/tables/`.
#[derive(Parser, Debug)]
#[command(name = "rsw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Data directory containing config.json
    #[arg(short, long, env = "RSW_DATA_DIR")]
    pub data: Option<PathBuf>,

    /// Enable debug logging (run action only)
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
