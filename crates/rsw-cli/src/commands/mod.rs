//! Action dispatch
//!
//! The action is peeked from the raw configuration first: it decides whether
//! logs are written and whether errors are echoed to stdout, even when the
//! rest of the configuration turns out to be invalid.

pub(crate) mod common;
pub(crate) mod get_tables_info;
pub(crate) mod run;
pub(crate) mod test_connection;

use anyhow::Result;
use rsw_core::{Action, AppConfig, CoreError};
use serde::Serialize;
use std::path::Path;

use crate::cli::Cli;
use crate::logging;

/// Run the requested action and return the process exit code.
pub(crate) async fn execute(cli: &Cli) -> u8 {
    let Some(data_dir) = cli.data.as_deref() else {
        logging::init(cli.verbose);
        return common::report(&CoreError::DataDirNotSet.into(), true);
    };

    let content = match AppConfig::read_raw(data_dir) {
        Ok(content) => content,
        Err(err) => {
            logging::init(cli.verbose);
            return common::report(&err.into(), true);
        }
    };

    let action = AppConfig::requested_action(&content);
    let is_run = action.as_deref().map_or(true, |a| a == Action::Run.as_str());
    if is_run {
        logging::init(cli.verbose);
    }

    match dispatch(&content, data_dir).await {
        Ok(output) => {
            println!("{output}");
            common::EXIT_SUCCESS
        }
        Err(err) => common::report(&err, is_run),
    }
}

async fn dispatch(content: &str, data_dir: &Path) -> Result<String> {
    let config = AppConfig::from_json(content, data_dir)?;
    match config.action {
        Action::Run => to_json(&run::execute(&config).await?),
        Action::TestConnection => to_json(&test_connection::execute(&config).await?),
        Action::GetTablesInfo => to_json(&get_tables_info::execute(&config).await?),
    }
}

fn to_json<T: Serialize>(output: &T) -> Result<String> {
    Ok(serde_json::to_string(output)?)
}
