use super::*;
use rsw_core::{ColumnDefinition, ColumnType};
use rsw_db::testing::{RecordingConnector, RecordingDatabase};
use rsw_db::DuckDbConnector;
use std::sync::Arc;

fn staging_spec(primary_key: &[&str]) -> TableLoadSpec {
    TableLoadSpec {
        table_id: "in.c-main.people".to_string(),
        db_name: "people_temp_abc".to_string(),
        export: true,
        incremental: true,
        primary_key: primary_key.iter().map(|s| s.to_string()).collect(),
        items: vec![
            ColumnDefinition::new("id", ColumnType::parse("int").unwrap()),
            ColumnDefinition::new("name", ColumnType::parse("varchar").unwrap()),
            ColumnDefinition::new("note", ColumnType::Ignore),
        ],
    }
}

async fn duckdb_executor() -> SqlExecutor {
    let connector = DuckDbConnector::in_memory().unwrap();
    SqlExecutor::connect(Arc::new(connector)).await.unwrap()
}

async fn rows(executor: &mut SqlExecutor, sql: &str) -> Vec<Vec<Option<String>>> {
    executor.query(sql).await.unwrap().rows
}

#[test]
fn test_update_sql() {
    let sql = build_update_sql("s", "t", &["id", "name"], &["id".to_string()]);
    assert_eq!(
        sql,
        r#"UPDATE "t" SET "id" = "s"."id", "name" = "s"."name" FROM "s" WHERE "t"."id" = "s"."id""#
    );
}

#[test]
fn test_delete_sql_with_composite_key() {
    let sql = build_delete_sql("s", "t", &["a".to_string(), "b".to_string()]);
    assert_eq!(
        sql,
        r#"DELETE FROM "s" USING "t" WHERE "t"."a" = "s"."a" AND "t"."b" = "s"."b""#
    );
}

#[test]
fn test_insert_sql() {
    assert_eq!(
        build_insert_sql("s", "t", &["id", "name"]),
        r#"INSERT INTO "t" ("id", "name") SELECT * FROM "s""#
    );
}

#[test]
fn test_statement_order_with_key() {
    let statements = upsert_statements(&staging_spec(&["id"]), "people");

    assert_eq!(statements.len(), 4);
    assert!(statements[0].starts_with("UPDATE \"people\""));
    assert!(statements[1].starts_with("DELETE FROM \"people_temp_abc\""));
    assert!(statements[2].starts_with("INSERT INTO \"people\""));
    assert_eq!(statements[3], r#"DROP TABLE IF EXISTS "people_temp_abc";"#);
    assert!(statements.iter().all(|s| !s.contains("note")));
}

#[test]
fn test_ignored_column_left_out_of_update_and_insert() {
    let mut spec = staging_spec(&["id"]);
    spec.items.insert(
        1,
        ColumnDefinition::new("legacy", ColumnType::parse("ignore").unwrap()),
    );

    let statements = upsert_statements(&spec, "people");

    assert_eq!(
        statements[0],
        r#"UPDATE "people" SET "id" = "people_temp_abc"."id", "name" = "people_temp_abc"."name" FROM "people_temp_abc" WHERE "people"."id" = "people_temp_abc"."id""#
    );
    assert_eq!(
        statements[2],
        r#"INSERT INTO "people" ("id", "name") SELECT * FROM "people_temp_abc""#
    );
    assert!(statements.iter().all(|s| !s.contains("legacy")));
}

#[test]
fn test_statements_without_key_only_append() {
    let statements = upsert_statements(&staging_spec(&[]), "people");

    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("INSERT INTO \"people\""));
    assert!(statements[1].starts_with("DROP TABLE IF EXISTS"));
}

#[tokio::test]
async fn test_upsert_updates_and_inserts_on_duckdb() {
    let mut executor = duckdb_executor().await;
    for sql in [
        "CREATE TABLE people (id INT, name VARCHAR)",
        "INSERT INTO people VALUES (1, 'A'), (2, 'B')",
        "CREATE TABLE people_temp_abc (id INT, name VARCHAR)",
        "INSERT INTO people_temp_abc VALUES (2, 'B updated'), (3, 'C')",
    ] {
        executor.execute(sql).await.unwrap();
    }

    upsert(&mut executor, &staging_spec(&["id"]), "people")
        .await
        .unwrap();

    assert_eq!(
        rows(&mut executor, "SELECT id, name FROM people ORDER BY id").await,
        vec![
            vec![Some("1".to_string()), Some("A".to_string())],
            vec![Some("2".to_string()), Some("B updated".to_string())],
            vec![Some("3".to_string()), Some("C".to_string())],
        ]
    );
    assert!(rows(
        &mut executor,
        "SELECT table_name FROM information_schema.tables WHERE table_name = 'people_temp_abc'"
    )
    .await
    .is_empty());
}

#[tokio::test]
async fn test_upsert_without_key_appends_on_duckdb() {
    let mut executor = duckdb_executor().await;
    for sql in [
        "CREATE TABLE people (id INT, name VARCHAR)",
        "INSERT INTO people VALUES (1, 'A')",
        "CREATE TABLE people_temp_abc (id INT, name VARCHAR)",
        "INSERT INTO people_temp_abc VALUES (1, 'A again')",
    ] {
        executor.execute(sql).await.unwrap();
    }

    upsert(&mut executor, &staging_spec(&[]), "people")
        .await
        .unwrap();

    let result = rows(&mut executor, "SELECT count(*) FROM people").await;
    assert_eq!(result, vec![vec![Some("2".to_string())]]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_insert_leaves_staging_table() {
    let db = RecordingDatabase::new();
    db.fail_on("INSERT INTO");
    let mut executor = SqlExecutor::connect(Arc::new(RecordingConnector::new(db.clone())))
        .await
        .unwrap();

    let err = upsert(&mut executor, &staging_spec(&["id"]), "people")
        .await
        .unwrap_err();

    assert!(matches!(err, LoadError::Merge { .. }));
    assert_eq!(db.statements_containing("UPDATE").len(), 1);
    assert_eq!(db.statements_containing("DELETE").len(), 1);
    assert_eq!(db.statements_containing("INSERT INTO").len(), 3);
    assert!(db.statements_containing("DROP TABLE").is_empty());
}
