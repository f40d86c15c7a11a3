//! rsw-load - Load engine for the Redshift writer
//!
//! Turns table load specifications and export manifests into warehouse
//! statements:
//!
//! - [`schema`]: drop, create and existence checks
//! - [`bulk`]: the manifest-driven `COPY` from object storage
//! - [`merge`]: the incremental upsert (update, delete matched, insert, drop staging)
//! - [`orchestrator`]: the per-table state machine and run aggregation
//!
//! Every statement is executed through [`rsw_db::SqlExecutor`].

pub mod bulk;
pub mod error;
pub mod merge;
pub mod orchestrator;
pub mod remote;
pub mod schema;

pub use bulk::{load_from_remote, CopyOutcome};
pub use error::{ErrorKind, LoadError, LoadResult, RunFailure};
pub use orchestrator::{DataDirManifests, ManifestSource, Orchestrator, TableState};
pub use remote::{ObjectStoreRemote, RemoteStorage, S3Remote};
