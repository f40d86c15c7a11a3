use super::*;
use rsw_core::ColumnType;
use rsw_db::testing::{RecordingConnector, RecordingDatabase};
use rsw_db::{DuckDbConnector, QueryResult};
use std::sync::Arc;

fn col(name: &str, ty: &str) -> ColumnDefinition {
    ColumnDefinition::new(name, ColumnType::parse(ty).unwrap())
}

fn spec(db_name: &str, items: Vec<ColumnDefinition>) -> TableLoadSpec {
    TableLoadSpec {
        table_id: "in.c-main.simple".to_string(),
        db_name: db_name.to_string(),
        export: true,
        incremental: false,
        primary_key: vec![],
        items,
    }
}

async fn recording() -> (RecordingDatabase, SqlExecutor) {
    let db = RecordingDatabase::new();
    let connector = RecordingConnector::new(db.clone());
    let executor = SqlExecutor::connect(Arc::new(connector)).await.unwrap();
    (db, executor)
}

#[test]
fn test_drop_sql_quotes_name() {
    assert_eq!(build_drop_sql("simple"), r#"DROP TABLE IF EXISTS "simple";"#);
    assert_eq!(build_drop_sql(r#"we"ird"#), r#"DROP TABLE IF EXISTS "we""ird";"#);
}

#[test]
fn test_create_sql_full_column_shape() {
    let spec = spec(
        "simple",
        vec![
            col("id", "int").with_nullable(false),
            col("name", "varchar").with_size("255").with_default("n/a"),
            col("skip", "ignore"),
            col("amount", "decimal").with_size("10,2"),
        ],
    );

    assert_eq!(
        build_create_sql(&spec).unwrap(),
        r#"CREATE TABLE "simple" ("id" INT NOT NULL, "name" VARCHAR(255) NULL DEFAULT 'n/a', "amount" DECIMAL(10,2) NULL);"#
    );
}

#[test]
fn test_create_sql_suppresses_default_on_text() {
    let spec = spec("notes", vec![col("body", "TEXT").with_default("empty")]);
    assert_eq!(
        build_create_sql(&spec).unwrap(),
        r#"CREATE TABLE "notes" ("body" TEXT NULL);"#
    );
}

#[test]
fn test_create_sql_escapes_default() {
    let spec = spec("t", vec![col("c", "varchar").with_default("it's")]);
    assert!(build_create_sql(&spec).unwrap().contains("DEFAULT 'it''s'"));
}

#[test]
fn test_create_sql_uses_db_names() {
    let mut column = col("csv_name", "int");
    column.db_name = "warehouse_name".to_string();
    let sql = build_create_sql(&spec("t", vec![column])).unwrap();
    assert!(sql.contains(r#""warehouse_name" INT"#));
    assert!(!sql.contains("csv_name"));
}

#[test]
fn test_create_sql_rejects_all_ignored() {
    let spec = spec("t", vec![col("a", "ignore"), col("b", "ignore")]);
    let err = build_create_sql(&spec).unwrap_err();
    assert!(matches!(err, LoadError::EmptyColumns { .. }));
    assert_eq!(err.kind(), crate::ErrorKind::Configuration);
}

#[test]
fn test_exists_sql_lowercases_name() {
    let sql = build_exists_sql("MyTable");
    assert!(sql.contains("lower(table_name) = 'mytable'"));
    assert!(sql.contains("current_schema()"));
}

#[tokio::test]
async fn test_create_with_only_ignored_columns_executes_nothing() {
    let (db, mut executor) = recording().await;
    let spec = spec("t", vec![col("a", "ignore")]);

    assert!(create(&mut executor, &spec).await.is_err());
    assert!(db.statements().is_empty());
}

#[tokio::test]
async fn test_exists_reads_catalog() {
    let (db, mut executor) = recording().await;
    db.respond_to(
        "information_schema.tables",
        QueryResult::single_column("table_name", &["present"]),
    );

    assert!(exists(&mut executor, "present").await.unwrap());
    assert_eq!(db.statements(), vec![build_exists_sql("present")]);
}

#[tokio::test]
async fn test_exists_false_on_empty_catalog() {
    let (_db, mut executor) = recording().await;
    assert!(!exists(&mut executor, "absent").await.unwrap());
}

#[tokio::test]
async fn test_drop_missing_table_succeeds_on_duckdb() {
    let connector = DuckDbConnector::in_memory().unwrap();
    let mut executor = SqlExecutor::connect(Arc::new(connector)).await.unwrap();

    drop(&mut executor, "never_created").await.unwrap();
    drop(&mut executor, "never_created").await.unwrap();
}

#[tokio::test]
async fn test_create_then_exists_on_duckdb() {
    let connector = DuckDbConnector::in_memory().unwrap();
    let mut executor = SqlExecutor::connect(Arc::new(connector)).await.unwrap();
    let spec = spec(
        "people",
        vec![
            col("id", "integer").with_nullable(false),
            col("name", "varchar").with_size("255"),
            col("bio", "text").with_default("none"),
        ],
    );

    assert!(!exists(&mut executor, "people").await.unwrap());
    create(&mut executor, &spec).await.unwrap();
    assert!(exists(&mut executor, "people").await.unwrap());
    assert!(exists(&mut executor, "PEOPLE").await.unwrap());

    drop(&mut executor, "people").await.unwrap();
    assert!(!exists(&mut executor, "people").await.unwrap());
}

#[tokio::test]
async fn test_mixed_case_table_is_found_on_duckdb() {
    let connector = DuckDbConnector::in_memory().unwrap();
    let mut executor = SqlExecutor::connect(Arc::new(connector)).await.unwrap();
    let spec = spec("People", vec![col("id", "integer")]);

    create(&mut executor, &spec).await.unwrap();
    assert!(exists(&mut executor, "People").await.unwrap());
    assert!(exists(&mut executor, "people").await.unwrap());
}
