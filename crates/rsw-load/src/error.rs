//! Error types for rsw-load

use rsw_core::{CoreError, RunResult};
use rsw_db::{DbError, LoadDiagnostic};
use thiserror::Error;

/// Who is expected to fix a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration, manifest or input mapping
    Configuration,
    /// Statement or bulk-load failure that survived every retry
    Query,
    /// Anything unexpected
    Internal,
}

/// Load engine errors
#[derive(Error, Debug)]
pub enum LoadError {
    /// No column left after dropping ignored ones (L001)
    #[error("[L001] Table '{table}' has no columns to create")]
    EmptyColumns { table: String },

    /// DDL or catalog statement failed (L002)
    #[error("[L002] Schema operation on '{table}' failed: {source}")]
    Schema {
        table: String,
        #[source]
        source: DbError,
    },

    /// COPY failed (L003)
    #[error("[L003] Bulk load into '{table}' failed: {source}")]
    Bulk {
        table: String,
        #[source]
        source: DbError,
    },

    /// Upsert step failed (L004)
    #[error("[L004] Merge into '{table}' failed: {source}")]
    Merge {
        table: String,
        #[source]
        source: DbError,
    },

    /// Manifest-of-parts could not be read (L005)
    #[error("[L005] Failed to read parts manifest '{url}': {message}")]
    RemoteManifest { url: String, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type alias for LoadError
pub type LoadResult<T> = Result<T, LoadError>;

impl LoadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::EmptyColumns { .. } | LoadError::Core(_) => ErrorKind::Configuration,
            LoadError::RemoteManifest { .. } => ErrorKind::Query,
            LoadError::Schema { source, .. }
            | LoadError::Bulk { source, .. }
            | LoadError::Merge { source, .. }
            | LoadError::Db(source) => ErrorKind::of_db_error(source),
        }
    }

    /// Warehouse load-error rows behind the failure, if any.
    pub fn diagnostics(&self) -> &[LoadDiagnostic] {
        match self {
            LoadError::Schema { source, .. }
            | LoadError::Bulk { source, .. }
            | LoadError::Merge { source, .. }
            | LoadError::Db(source) => source.diagnostics(),
            _ => &[],
        }
    }
}

impl ErrorKind {
    /// Classification of a bare warehouse error.
    pub fn of_db_error(err: &DbError) -> Self {
        match err {
            DbError::Config(_) => ErrorKind::Configuration,
            DbError::ConnectionError(_)
            | DbError::ExecutionError(_)
            | DbError::QueryFailed { .. } => ErrorKind::Query,
            DbError::MutexPoisoned(_) | DbError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the user (configuration, data, credentials) is expected to fix it.
    pub fn is_user_error(self) -> bool {
        !matches!(self, ErrorKind::Internal)
    }
}

/// A run aborted at its first failed table.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct RunFailure {
    /// Table whose load failed
    pub table_id: String,
    /// Run result at the time of failure (status `failure`, tables loaded so far)
    pub result: RunResult,
    #[source]
    pub source: LoadError,
}

impl RunFailure {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}
