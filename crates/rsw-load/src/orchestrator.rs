//! Load orchestrator: per-table state machine and run aggregation
//!
//! Tables are loaded one at a time in configured order over the single
//! connection owned by the executor. The first failed table aborts the run.

use crate::bulk::{self, CopyOutcome};
use crate::error::{LoadResult, RunFailure};
use crate::merge;
use crate::remote::RemoteStorage;
use crate::schema;
use rsw_core::{CoreError, CoreResult, InputMapping, Manifest, RunResult, TableLoadSpec};
use rsw_db::SqlExecutor;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Separator between the target name and the uniqueness token of a staging table
const STAGING_SEPARATOR: &str = "_temp_";

/// Lifecycle of one table within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Pending,
    /// Incremental only: staging table created
    Staging,
    /// Data copied into the target (full) or staging table (incremental)
    Loaded,
    /// Incremental only: staging merged into the target
    Merged,
    Done,
    /// Not exported, or no column left after ignoring
    Skipped,
    Failed,
}

impl fmt::Display for TableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TableState::Pending => "pending",
            TableState::Staging => "staging",
            TableState::Loaded => "loaded",
            TableState::Merged => "merged",
            TableState::Done => "done",
            TableState::Skipped => "skipped",
            TableState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Resolves the export manifest of a table.
pub trait ManifestSource: Send + Sync {
    fn manifest(&self, table_id: &str) -> CoreResult<Manifest>;
}

/// Manifests stored as `<data>/in/tables/<tableId>.csv.manifest`
#[derive(Debug, Clone)]
pub struct DataDirManifests {
    data_dir: PathBuf,
}

impl DataDirManifests {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl ManifestSource for DataDirManifests {
    fn manifest(&self, table_id: &str) -> CoreResult<Manifest> {
        Manifest::load(&self.data_dir, table_id)
    }
}

impl ManifestSource for HashMap<String, Manifest> {
    fn manifest(&self, table_id: &str) -> CoreResult<Manifest> {
        self.get(table_id)
            .cloned()
            .ok_or_else(|| CoreError::ManifestNotFound {
                table_id: table_id.to_string(),
                path: format!("<memory>/{table_id}"),
            })
    }
}

/// Staging table name for `target`: `<target>_temp_<32 hex chars>`.
pub fn staging_table_name(target: &str) -> String {
    format!(
        "{}{}{}",
        target,
        STAGING_SEPARATOR,
        uuid::Uuid::new_v4().simple()
    )
}

/// Drives table loads over one executor.
pub struct Orchestrator {
    executor: SqlExecutor,
    remote: Arc<dyn RemoteStorage>,
    manifests: Box<dyn ManifestSource>,
    input_mapping: InputMapping,
}

impl Orchestrator {
    pub fn new(
        executor: SqlExecutor,
        remote: Arc<dyn RemoteStorage>,
        manifests: Box<dyn ManifestSource>,
    ) -> Self {
        Self {
            executor,
            remote,
            manifests,
            input_mapping: InputMapping::default(),
        }
    }

    /// Check every table against the job's input mapping before loading.
    pub fn with_input_mapping(mut self, input_mapping: InputMapping) -> Self {
        self.input_mapping = input_mapping;
        self
    }

    pub fn executor_mut(&mut self) -> &mut SqlExecutor {
        &mut self.executor
    }

    /// Load every table in order, stopping at the first failure.
    ///
    /// Tables loaded before the failure stay loaded; the failure carries the
    /// partial result.
    pub async fn run(&mut self, tables: &[TableLoadSpec]) -> Result<RunResult, RunFailure> {
        let mut result = RunResult::new();
        for spec in tables {
            match self.load_table(spec).await {
                Ok(TableState::Done) => result.mark_uploaded(spec.table_id.clone()),
                Ok(state) => log::debug!("Table '{}' finished as {}", spec.table_id, state),
                Err(source) => {
                    let state = self.transition(spec, TableState::Failed);
                    log::error!("Table '{}' {}: {}", spec.table_id, state, source);
                    result.mark_failed();
                    return Err(RunFailure {
                        table_id: spec.table_id.clone(),
                        result,
                        source,
                    });
                }
            }
        }
        Ok(result)
    }

    /// Load one table; returns its final state (`Done` or `Skipped`).
    pub async fn load_table(&mut self, spec: &TableLoadSpec) -> LoadResult<TableState> {
        if !spec.export {
            log::info!("Table '{}' is not exported, skipping", spec.table_id);
            return Ok(self.transition(spec, TableState::Skipped));
        }
        if spec.has_no_loaded_columns() {
            log::info!("Table '{}' has no columns to load, skipping", spec.table_id);
            return Ok(self.transition(spec, TableState::Skipped));
        }

        self.transition(spec, TableState::Pending);
        spec.validate()?;
        self.input_mapping.check_table(spec)?;
        let manifest = self.manifests.manifest(&spec.table_id)?;
        manifest.check_columns(&spec.table_id, &spec.loaded_column_names())?;

        log::info!(
            "Loading table '{}' into '{}' ({})",
            spec.table_id,
            spec.db_name,
            if spec.incremental { "incremental" } else { "full" }
        );
        if spec.incremental {
            self.load_incremental(spec, &manifest).await
        } else {
            self.load_full(spec, &manifest).await
        }
    }

    async fn load_full(
        &mut self,
        spec: &TableLoadSpec,
        manifest: &Manifest,
    ) -> LoadResult<TableState> {
        schema::drop(&mut self.executor, &spec.db_name).await?;
        schema::create(&mut self.executor, spec).await?;
        self.copy_into(&spec.db_name, manifest).await?;
        self.transition(spec, TableState::Loaded);
        Ok(self.transition(spec, TableState::Done))
    }

    async fn load_incremental(
        &mut self,
        spec: &TableLoadSpec,
        manifest: &Manifest,
    ) -> LoadResult<TableState> {
        let staging = spec.retarget(staging_table_name(&spec.db_name));

        schema::drop(&mut self.executor, &staging.db_name).await?;
        schema::create(&mut self.executor, &staging).await?;
        self.transition(spec, TableState::Staging);

        self.copy_into(&staging.db_name, manifest).await?;
        self.transition(spec, TableState::Loaded);

        if !schema::exists(&mut self.executor, &spec.db_name).await? {
            log::info!("Target table '{}' does not exist, creating it", spec.db_name);
            schema::create(&mut self.executor, spec).await?;
        }

        merge::upsert(&mut self.executor, &staging, &spec.db_name).await?;
        self.transition(spec, TableState::Merged);
        Ok(self.transition(spec, TableState::Done))
    }

    async fn copy_into(&mut self, table: &str, manifest: &Manifest) -> LoadResult<CopyOutcome> {
        bulk::load_from_remote(
            &mut self.executor,
            self.remote.as_ref(),
            &manifest.storage,
            table,
        )
        .await
    }

    fn transition(&self, spec: &TableLoadSpec, state: TableState) -> TableState {
        log::debug!("Table '{}' -> {}", spec.table_id, state);
        state
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
