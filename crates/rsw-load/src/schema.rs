//! Schema writer: DDL and catalog lookups for load targets

use crate::error::{LoadError, LoadResult};
use rsw_core::sql_utils::{quote_ident, quote_literal};
use rsw_core::{ColumnDefinition, TableLoadSpec};
use rsw_db::SqlExecutor;

/// `DROP TABLE IF EXISTS "<table>";`
pub fn build_drop_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {};", quote_ident(table))
}

/// `CREATE TABLE` statement for the loaded columns of `spec`.
///
/// Fails with [`LoadError::EmptyColumns`] when every column is ignored.
pub fn build_create_sql(spec: &TableLoadSpec) -> LoadResult<String> {
    let columns: Vec<String> = spec.loaded_columns().map(column_ddl).collect();
    if columns.is_empty() {
        return Err(LoadError::EmptyColumns {
            table: spec.db_name.clone(),
        });
    }
    Ok(format!(
        "CREATE TABLE {} ({});",
        quote_ident(&spec.db_name),
        columns.join(", ")
    ))
}

fn column_ddl(column: &ColumnDefinition) -> String {
    let mut ddl = format!(
        "{} {}",
        quote_ident(&column.db_name),
        column.column_type.ddl_name()
    );
    if let Some(size) = column.size.as_deref().filter(|s| !s.is_empty()) {
        ddl.push_str(&format!("({})", size));
    }
    ddl.push_str(if column.nullable { " NULL" } else { " NOT NULL" });

    // Redshift rejects DEFAULT on TEXT columns
    if !column.column_type.is_free_text() {
        if let Some(default) = column.default.as_deref().filter(|d| !d.is_empty()) {
            ddl.push_str(&format!(" DEFAULT {}", quote_literal(default)));
        }
    }
    ddl
}

/// Case-insensitive catalog lookup for `table` in the session schema.
///
/// Redshift folds identifiers to lower case while DuckDB keeps the case of
/// quoted names, so both sides are compared lower-cased.
pub fn build_exists_sql(table: &str) -> String {
    format!(
        "SELECT table_name FROM information_schema.tables \
         WHERE lower(table_name) = {} AND table_schema = current_schema()",
        quote_literal(&table.to_lowercase())
    )
}

/// Drop `table` if present. Never fails because the table is missing.
pub async fn drop(executor: &mut SqlExecutor, table: &str) -> LoadResult<()> {
    executor
        .execute(&build_drop_sql(table))
        .await
        .map_err(|source| LoadError::Schema {
            table: table.to_string(),
            source,
        })?;
    Ok(())
}

/// Create the target table of `spec`. Nothing is executed when the column
/// list is empty.
pub async fn create(executor: &mut SqlExecutor, spec: &TableLoadSpec) -> LoadResult<()> {
    let sql = build_create_sql(spec)?;
    executor
        .execute(&sql)
        .await
        .map_err(|source| LoadError::Schema {
            table: spec.db_name.clone(),
            source,
        })?;
    Ok(())
}

/// Whether `table` exists in the session schema.
pub async fn exists(executor: &mut SqlExecutor, table: &str) -> LoadResult<bool> {
    let result = executor
        .query(&build_exists_sql(table))
        .await
        .map_err(|source| LoadError::Schema {
            table: table.to_string(),
            source,
        })?;
    Ok(!result.is_empty())
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
