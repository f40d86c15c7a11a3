//! `run` action: load every exported table

use anyhow::Result;
use rsw_core::{AppConfig, RunResult, TableLoadSpec};
use rsw_db::{RedshiftConnector, SqlExecutor};
use rsw_load::{DataDirManifests, Orchestrator, S3Remote};
use std::sync::Arc;

pub(crate) async fn execute(config: &AppConfig) -> Result<RunResult> {
    let connector = RedshiftConnector::new(config.db.clone())?;
    let executor = SqlExecutor::connect(Arc::new(connector)).await?;

    let mut orchestrator = Orchestrator::new(
        executor,
        Arc::new(S3Remote),
        Box::new(DataDirManifests::new(&config.data_dir)),
    )
    .with_input_mapping(config.input_mapping.clone());

    let tables: Vec<TableLoadSpec> = config.exported_tables().cloned().collect();
    log::info!("Loading {} table(s)", tables.len());

    let result = orchestrator.run(&tables).await?;
    log::info!(
        "Run finished, uploaded: [{}]",
        result.uploaded.join(", ")
    );
    Ok(result)
}
