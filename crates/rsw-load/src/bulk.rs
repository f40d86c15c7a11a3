//! Bulk loader: manifest-driven `COPY` from object storage

use crate::error::{LoadError, LoadResult};
use crate::remote::RemoteStorage;
use rsw_core::sql_utils::{escape_sql_string, quote_ident};
use rsw_core::StorageLocator;
use rsw_db::SqlExecutor;

/// What a bulk load did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The `COPY` statement ran
    Copied,
    /// Sliced export with no parts; nothing was copied
    NoData,
}

/// `COPY` statement loading `table` from the object `storage` points at.
///
/// Sliced exports are read in manifest mode; single files skip their header
/// row. Everything else is fixed: comma-delimited quoted CSV, literal `NULL`
/// token, lenient dates, truncation instead of overflow errors, gzip.
pub fn build_copy_sql(table: &str, storage: &StorageLocator) -> String {
    let credentials = &storage.credentials;
    let mut sql = format!(
        "COPY {} FROM '{}'",
        quote_ident(table),
        escape_sql_string(&storage.url())
    );
    sql.push_str(&format!(
        " CREDENTIALS 'aws_access_key_id={};aws_secret_access_key={};token={}'",
        escape_sql_string(&credentials.access_key_id),
        escape_sql_string(&credentials.secret_access_key),
        escape_sql_string(&credentials.session_token)
    ));
    sql.push_str(&format!(
        " REGION AS '{}' DELIMITER ',' CSV QUOTE '\"'",
        escape_sql_string(&storage.region)
    ));
    sql.push_str(" NULL AS 'NULL' ACCEPTANYDATE TRUNCATECOLUMNS");
    if storage.is_sliced {
        sql.push_str(" MANIFEST");
    } else {
        sql.push_str(" IGNOREHEADER 1");
    }
    sql.push_str(" GZIP;");
    sql
}

/// Load `table` from the export described by `storage`.
///
/// A sliced export whose parts manifest lists no entries is treated as an
/// empty table: no statement is issued.
pub async fn load_from_remote(
    executor: &mut SqlExecutor,
    remote: &dyn RemoteStorage,
    storage: &StorageLocator,
    table: &str,
) -> LoadResult<CopyOutcome> {
    if storage.is_sliced {
        let parts = remote.fetch_parts_manifest(storage).await?;
        if parts.is_empty() {
            log::info!(
                "Export '{}' has no data parts, skipping copy into '{}'",
                storage.url(),
                table
            );
            return Ok(CopyOutcome::NoData);
        }
        log::debug!("Export '{}' has {} parts", storage.url(), parts.entries.len());
    }

    executor
        .execute(&build_copy_sql(table, storage))
        .await
        .map_err(|source| LoadError::Bulk {
            table: table.to_string(),
            source,
        })?;
    Ok(CopyOutcome::Copied)
}

#[cfg(test)]
#[path = "bulk_test.rs"]
mod tests;
