use super::*;

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
}

#[tokio::test]
async fn test_execute_returns_affected_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE t (id INT)").await.unwrap();

    let inserted = db
        .execute("INSERT INTO t VALUES (1), (2), (3)")
        .await
        .unwrap();
    assert_eq!(inserted, 3);
}

#[tokio::test]
async fn test_query_coerces_values_to_text() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute("CREATE TABLE t (id INT, name VARCHAR, ok BOOLEAN)")
        .await
        .unwrap();
    db.execute("INSERT INTO t VALUES (1, 'a', true), (2, NULL, false)")
        .await
        .unwrap();

    let result = db
        .query("SELECT id, name, ok FROM t ORDER BY id")
        .await
        .unwrap();

    assert_eq!(result.columns, vec!["id", "name", "ok"]);
    assert_eq!(result.len(), 2);
    assert_eq!(result.value(0, 0), Some("1"));
    assert_eq!(result.value(0, 1), Some("a"));
    assert_eq!(result.value(1, 1), None);
    assert_eq!(result.value(1, 2), Some("false"));
}

#[tokio::test]
async fn test_execution_error_is_transient() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db.execute("SELECT * FROM missing_table").await.unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_load_errors_default_to_empty() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert!(db.load_errors().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connector_connections_share_database() {
    let connector = DuckDbConnector::in_memory().unwrap();

    let first = connector.connect().await.unwrap();
    first.execute("CREATE TABLE shared (id INT)").await.unwrap();
    first.execute("INSERT INTO shared VALUES (7)").await.unwrap();

    let second = connector.connect().await.unwrap();
    let result = second.query("SELECT id FROM shared").await.unwrap();
    assert_eq!(result.value(0, 0), Some("7"));
}

#[tokio::test]
async fn test_connector_describe() {
    let connector = DuckDbConnector::in_memory().unwrap();
    assert_eq!(connector.describe(), "duckdb ':memory:'");
}
