//! Database trait definitions

use crate::error::DbResult;
use async_trait::async_trait;
use serde::Serialize;

/// Rows returned by a query, every value coerced to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Column names from the result set
    pub columns: Vec<String>,
    /// Rows of text values (`None` for SQL NULL)
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    /// Build a result from column names and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Build a one-column result, e.g. for catalog lookups.
    pub fn single_column(column: &str, values: &[&str]) -> Self {
        Self {
            columns: vec![column.to_string()],
            rows: values
                .iter()
                .map(|v| vec![Some((*v).to_string())])
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value at (`row`, `col`) as a string slice; `None` for NULL or out of range.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

/// One row of the warehouse load-error diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadDiagnostic {
    /// Column the error was raised on
    pub column: String,
    /// Line of the input file, when reported
    pub line: Option<u64>,
    /// Reason reported by the warehouse
    pub reason: String,
}

impl std::fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "Column '{}', line {}: {}", self.column, line, self.reason),
            None => write!(f, "Column '{}': {}", self.column, self.reason),
        }
    }
}

/// A live warehouse connection.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a statement, returning affected rows
    async fn execute(&self, sql: &str) -> DbResult<u64>;

    /// Execute a query and collect every row as text
    async fn query(&self, sql: &str) -> DbResult<QueryResult>;

    /// Load-error rows for the most recent statement on this connection.
    ///
    /// Backends without a load-error view report none.
    async fn load_errors(&self) -> DbResult<Vec<LoadDiagnostic>> {
        Ok(Vec::new())
    }

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Opens warehouse connections from stored connection parameters.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a new connection
    async fn connect(&self) -> DbResult<Box<dyn Database>>;

    /// Human-readable target description for logs (never includes secrets)
    fn describe(&self) -> String;
}
