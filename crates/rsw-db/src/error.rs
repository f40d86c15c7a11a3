//! Error types for rsw-db

use crate::traits::LoadDiagnostic;
use rsw_core::CoreError;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Statement failed on every attempt (D003)
    ///
    /// `statement` is redacted; `diagnostics` holds the warehouse load-error
    /// rows captured after the last failure.
    #[error("[D003] {message}")]
    QueryFailed {
        statement: String,
        message: String,
        diagnostics: Vec<LoadDiagnostic>,
    },

    /// Mutex poisoned (D004)
    #[error("[D004] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// Internal error (D005)
    #[error("[D005] Internal database error: {0}")]
    Internal(String),

    /// Invalid connection configuration
    #[error(transparent)]
    Config(#[from] CoreError),
}

impl DbError {
    /// Whether retrying the statement on a fresh connection may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::ConnectionError(_) | DbError::ExecutionError(_))
    }

    /// Warehouse load-error rows attached to the error, if any.
    pub fn diagnostics(&self) -> &[LoadDiagnostic] {
        match self {
            DbError::QueryFailed { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}

/// Server-side message with its SQLSTATE, or the client-side description.
pub(crate) fn pg_error_message(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => format!("{}: {}", db.code().code(), db.message()),
        None => err.to_string(),
    }
}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        let message = pg_error_message(&err);
        if err.is_closed() {
            DbError::ConnectionError(message)
        } else {
            DbError::ExecutionError(message)
        }
    }
}
