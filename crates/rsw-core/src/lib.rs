//! rsw-core - Core library for the Redshift writer
//!
//! This crate provides the data model shared by every other crate: table load
//! specifications, export manifests, connection parameters, the run result,
//! configuration parsing, and the pure SQL helpers used to build statements.

pub mod config;
pub mod error;
pub mod manifest;
pub mod run_result;
pub(crate) mod serde_helpers;
pub mod sql_utils;
pub mod table;

pub use config::{Action, AppConfig, ConnectionParams, InputMapping, InputTable, DEFAULT_PORT};
pub use error::{CoreError, CoreResult};
pub use manifest::{Credentials, Manifest, PartEntry, PartsManifest, StorageLocator};
pub use run_result::{RunResult, RunStatus};
pub use table::{ColumnDefinition, ColumnType, TableLoadSpec};
