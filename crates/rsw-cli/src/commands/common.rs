//! Shared utilities for CLI commands: error classification and reporting

use rsw_core::CoreError;
use rsw_db::{DbError, LoadDiagnostic};
use rsw_load::{ErrorKind, LoadError, RunFailure};
use std::fmt;

pub(crate) const EXIT_SUCCESS: u8 = 0;
/// Configuration, data or credentials need fixing
pub(crate) const EXIT_USER_ERROR: u8 = 1;
/// The tool itself failed
pub(crate) const EXIT_APPLICATION_ERROR: u8 = 2;

/// User-caused failure detected by the CLI itself.
#[derive(Debug)]
pub(crate) struct UserError(pub(crate) String);

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UserError {}

/// Map an error chain onto the failure classification.
pub(crate) fn classify(err: &anyhow::Error) -> ErrorKind {
    if let Some(e) = err.downcast_ref::<RunFailure>() {
        e.kind()
    } else if let Some(e) = err.downcast_ref::<LoadError>() {
        e.kind()
    } else if let Some(e) = err.downcast_ref::<DbError>() {
        ErrorKind::of_db_error(e)
    } else if err.is::<CoreError>() || err.is::<UserError>() {
        ErrorKind::Configuration
    } else {
        ErrorKind::Internal
    }
}

pub(crate) fn exit_code(kind: ErrorKind) -> u8 {
    if kind.is_user_error() {
        EXIT_USER_ERROR
    } else {
        EXIT_APPLICATION_ERROR
    }
}

fn diagnostics(err: &anyhow::Error) -> &[LoadDiagnostic] {
    if let Some(e) = err.downcast_ref::<RunFailure>() {
        e.source.diagnostics()
    } else if let Some(e) = err.downcast_ref::<LoadError>() {
        e.diagnostics()
    } else if let Some(e) = err.downcast_ref::<DbError>() {
        e.diagnostics()
    } else {
        &[]
    }
}

/// Log the failure and return its exit code. For actions other than `run`,
/// user errors are also echoed to stdout where the supervisor reads them.
pub(crate) fn report(err: &anyhow::Error, is_run: bool) -> u8 {
    let kind = classify(err);
    let message = err.to_string();

    let diagnostics = diagnostics(err);
    if diagnostics.is_empty() {
        log::error!("{message}");
    } else {
        let payload = serde_json::to_string(diagnostics).unwrap_or_default();
        log::error!("{message} {payload}");
    }

    if kind.is_user_error() && !is_run {
        println!("{message}");
    }
    exit_code(kind)
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
