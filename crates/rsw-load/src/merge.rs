//! Merge engine: incremental upsert from a staging table into its target
//!
//! With a primary key the merge runs, in order:
//!
//! 1. `UPDATE target ... FROM staging` for rows matching on the key
//! 2. `DELETE FROM staging USING target` to drop the rows just applied
//! 3. `INSERT INTO target ... SELECT * FROM staging` for the new rows
//! 4. drop the staging table
//!
//! Without a key only steps 3 and 4 run. The steps are not wrapped in a
//! transaction; a failure part-way leaves the staging table in place.

use crate::error::{LoadError, LoadResult};
use crate::schema;
use rsw_core::sql_utils::quote_ident;
use rsw_core::TableLoadSpec;
use rsw_db::SqlExecutor;

/// Join predicate `"target"."pk" = "staging"."pk" AND ...`
fn join_predicate(staging: &str, target: &str, primary_key: &[String]) -> String {
    primary_key
        .iter()
        .map(|pk| {
            let pk = quote_ident(pk);
            format!("{}.{pk} = {}.{pk}", quote_ident(target), quote_ident(staging))
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

pub fn build_update_sql(
    staging: &str,
    target: &str,
    columns: &[&str],
    primary_key: &[String],
) -> String {
    let assignments = columns
        .iter()
        .map(|c| {
            let c = quote_ident(c);
            format!("{c} = {}.{c}", quote_ident(staging))
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {} FROM {} WHERE {}",
        quote_ident(target),
        assignments,
        quote_ident(staging),
        join_predicate(staging, target, primary_key)
    )
}

pub fn build_delete_sql(staging: &str, target: &str, primary_key: &[String]) -> String {
    format!(
        "DELETE FROM {} USING {} WHERE {}",
        quote_ident(staging),
        quote_ident(target),
        join_predicate(staging, target, primary_key)
    )
}

pub fn build_insert_sql(staging: &str, target: &str, columns: &[&str]) -> String {
    let columns = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) SELECT * FROM {}",
        quote_ident(target),
        columns,
        quote_ident(staging)
    )
}

/// Every statement of an upsert from `staging` (a spec whose `db_name` is
/// the staging table) into `target`, cleanup included.
pub fn upsert_statements(staging: &TableLoadSpec, target: &str) -> Vec<String> {
    let staging_name = staging.db_name.as_str();
    let columns: Vec<&str> = staging
        .loaded_columns()
        .map(|c| c.db_name.as_str())
        .collect();

    let mut statements = Vec::with_capacity(4);
    if !staging.primary_key.is_empty() {
        statements.push(build_update_sql(
            staging_name,
            target,
            &columns,
            &staging.primary_key,
        ));
        statements.push(build_delete_sql(staging_name, target, &staging.primary_key));
    }
    statements.push(build_insert_sql(staging_name, target, &columns));
    statements.push(schema::build_drop_sql(staging_name));
    statements
}

/// Merge the staging table described by `staging` into `target`, then drop
/// the staging table.
pub async fn upsert(
    executor: &mut SqlExecutor,
    staging: &TableLoadSpec,
    target: &str,
) -> LoadResult<()> {
    if staging.has_no_loaded_columns() {
        return Err(LoadError::EmptyColumns {
            table: staging.db_name.clone(),
        });
    }
    if staging.primary_key.is_empty() {
        log::info!(
            "No primary key on '{}', appending all rows from '{}'",
            target,
            staging.db_name
        );
    }

    for sql in upsert_statements(staging, target) {
        executor
            .execute(&sql)
            .await
            .map_err(|source| LoadError::Merge {
                table: target.to_string(),
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "merge_test.rs"]
mod tests;
