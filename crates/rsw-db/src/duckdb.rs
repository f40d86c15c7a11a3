//! DuckDB database backend implementation
//!
//! A local stand-in for the warehouse: it runs the same DDL and merge
//! statements the Redshift backend receives, which makes it the backend of
//! choice for exercising schema and merge logic without a cluster. It cannot
//! execute the Redshift `COPY ... FROM 's3://...'` form.

use crate::error::{DbError, DbResult};
use crate::traits::{Connector, Database, QueryResult};
use async_trait::async_trait;
use duckdb::Connection;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an open connection
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str) -> DbResult<u64> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map(|n| n as u64)
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    /// Query synchronously, coercing every value to text.
    ///
    /// DuckDB panics on `stmt.column_count()` before execution, so rows are
    /// collected via `query_map` first and column metadata is read after.
    fn query_sync(&self, sql: &str) -> DbResult<QueryResult> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;

        let rows: Vec<Vec<Option<String>>> = stmt
            .query_map([], |row| {
                let col_count = row.as_ref().column_count();
                Ok((0..col_count).map(|i| column_as_string(row, i)).collect())
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let columns = (0..stmt.column_count())
            .map(|i| stmt.column_name(i).map_or("?".to_string(), |v| v.to_string()))
            .collect();

        Ok(QueryResult { columns, rows })
    }
}

/// Read a column value as text, trying the DuckDB types a catalog or a
/// loaded table produces. NULL maps to `None`.
fn column_as_string(row: &duckdb::Row<'_>, idx: usize) -> Option<String> {
    if let Ok(v) = row.get::<_, Option<String>>(idx) {
        return v;
    }
    if let Ok(v) = row.get::<_, Option<i64>>(idx) {
        return v.map(|n| n.to_string());
    }
    if let Ok(v) = row.get::<_, Option<f64>>(idx) {
        return v.map(|f| f.to_string());
    }
    if let Ok(v) = row.get::<_, Option<bool>>(idx) {
        return v.map(|b| b.to_string());
    }
    None
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<u64> {
        self.execute_sync(sql)
    }

    async fn query(&self, sql: &str) -> DbResult<QueryResult> {
        self.query_sync(sql)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Hands out connections to one shared DuckDB database.
///
/// Every connection is a clone of the root connection, so a reconnect sees
/// the same tables, including for in-memory databases.
pub struct DuckDbConnector {
    root: Mutex<Connection>,
    label: String,
}

impl DuckDbConnector {
    /// Shared in-memory database
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            root: Mutex::new(conn),
            label: ":memory:".to_string(),
        })
    }

    /// Open a backend directly (outside of the `Connector` trait).
    pub fn open(&self) -> DbResult<DuckDbBackend> {
        let root = self
            .root
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))?;
        let conn = root
            .try_clone()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(DuckDbBackend::from_connection(conn))
    }
}

#[async_trait]
impl Connector for DuckDbConnector {
    async fn connect(&self) -> DbResult<Box<dyn Database>> {
        Ok(Box::new(self.open()?))
    }

    fn describe(&self) -> String {
        format!("duckdb '{}'", self.label)
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
