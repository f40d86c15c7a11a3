//! rsw-db - Warehouse abstraction layer for the Redshift writer
//!
//! This crate provides the `Database` and `Connector` traits, the Redshift
//! backend (Postgres wire protocol), a local DuckDB backend, and the
//! `SqlExecutor` that every statement goes through: credential redaction,
//! bounded retries, diagnostics capture, and reconnects.

pub mod duckdb;
pub mod error;
pub mod executor;
pub mod redshift;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use self::duckdb::{DuckDbBackend, DuckDbConnector};
pub use error::{DbError, DbResult};
pub use executor::{RetryPolicy, SqlExecutor};
pub use redshift::{RedshiftBackend, RedshiftConnector};
pub use traits::{Connector, Database, LoadDiagnostic, QueryResult};
