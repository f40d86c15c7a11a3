//! `getTablesInfo` action: describe the base tables of the configured schema

use anyhow::Result;
use rsw_core::sql_utils::quote_literal;
use rsw_core::AppConfig;
use rsw_db::{QueryResult, RedshiftConnector, SqlExecutor};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct ColumnInfo {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) data_type: String,
    pub(crate) nullable: bool,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub(crate) struct TableInfo {
    pub(crate) columns: Vec<ColumnInfo>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TablesInfo {
    pub(crate) status: &'static str,
    pub(crate) tables: BTreeMap<String, TableInfo>,
}

pub(crate) async fn execute(config: &AppConfig) -> Result<TablesInfo> {
    let connector = RedshiftConnector::new(config.db.clone())?;
    let mut executor = SqlExecutor::connect(Arc::new(connector)).await?;
    let tables = describe_tables(&mut executor, config.db.schema_name()).await?;
    Ok(TablesInfo {
        status: "success",
        tables,
    })
}

fn tables_sql(schema: &str) -> String {
    format!(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = {} AND table_type = 'BASE TABLE' ORDER BY table_name",
        quote_literal(schema)
    )
}

fn columns_sql(schema: &str) -> String {
    format!(
        "SELECT table_name, column_name, data_type, is_nullable \
         FROM information_schema.columns \
         WHERE table_schema = {} ORDER BY table_name, ordinal_position",
        quote_literal(schema)
    )
}

/// Base tables of `schema` with their columns in ordinal order.
pub(crate) async fn describe_tables(
    executor: &mut SqlExecutor,
    schema: &str,
) -> Result<BTreeMap<String, TableInfo>> {
    let tables = executor.query(&tables_sql(schema)).await?;
    let columns = executor.query(&columns_sql(schema)).await?;
    Ok(collect_tables(&tables, &columns))
}

fn collect_tables(tables: &QueryResult, columns: &QueryResult) -> BTreeMap<String, TableInfo> {
    let mut out: BTreeMap<String, TableInfo> = (0..tables.len())
        .filter_map(|row| tables.value(row, 0))
        .map(|name| (name.to_string(), TableInfo::default()))
        .collect();

    for row in 0..columns.len() {
        let (Some(table), Some(name)) = (columns.value(row, 0), columns.value(row, 1)) else {
            continue;
        };
        // views show up in information_schema.columns too
        if let Some(info) = out.get_mut(table) {
            info.columns.push(ColumnInfo {
                name: name.to_string(),
                data_type: columns.value(row, 2).unwrap_or_default().to_string(),
                nullable: columns
                    .value(row, 3)
                    .is_some_and(|v| v.eq_ignore_ascii_case("yes")),
            });
        }
    }
    out
}

#[cfg(test)]
#[path = "get_tables_info_test.rs"]
mod tests;
