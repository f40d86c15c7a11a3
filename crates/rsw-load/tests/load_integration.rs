//! End-to-end loads over DuckDB.
//!
//! DuckDB cannot run the Redshift `COPY ... FROM 's3://...'` form, so the
//! connector below rewrites each COPY into an insert from a local CSV file
//! named after the object key. Everything else runs unchanged.

use async_trait::async_trait;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectStorePath;
use object_store::{ObjectStore, PutPayload};
use regex::Regex;
use rsw_core::{ColumnDefinition, ColumnType, RunStatus, TableLoadSpec};
use rsw_db::{
    Connector, Database, DbResult, DuckDbBackend, DuckDbConnector, QueryResult, SqlExecutor,
};
use rsw_load::{DataDirManifests, ObjectStoreRemote, Orchestrator};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;

fn copy_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^COPY "([^"]+)" FROM 's3://[^/]+/([^']+)'"#).unwrap())
}

struct LocalCopyDatabase {
    inner: DuckDbBackend,
    files: PathBuf,
}

#[async_trait]
impl Database for LocalCopyDatabase {
    async fn execute(&self, sql: &str) -> DbResult<u64> {
        match copy_regex().captures(sql) {
            Some(caps) => {
                let csv = self.files.join(&caps[2]);
                let insert = format!(
                    "INSERT INTO \"{}\" SELECT * FROM read_csv('{}', header = true, nullstr = 'NULL')",
                    &caps[1],
                    csv.display()
                );
                self.inner.execute(&insert).await
            }
            None => self.inner.execute(sql).await,
        }
    }

    async fn query(&self, sql: &str) -> DbResult<QueryResult> {
        self.inner.query(sql).await
    }

    fn db_type(&self) -> &'static str {
        "duckdb-local-copy"
    }
}

struct LocalCopyConnector {
    duck: DuckDbConnector,
    files: PathBuf,
}

#[async_trait]
impl Connector for LocalCopyConnector {
    async fn connect(&self) -> DbResult<Box<dyn Database>> {
        Ok(Box::new(LocalCopyDatabase {
            inner: self.duck.open()?,
            files: self.files.clone(),
        }))
    }

    fn describe(&self) -> String {
        "duckdb with local copy".to_string()
    }
}

struct Harness {
    dir: TempDir,
    store: Arc<InMemory>,
    orchestrator: Orchestrator,
}

impl Harness {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("in").join("tables")).unwrap();
        std::fs::create_dir_all(dir.path().join("objects")).unwrap();

        let connector = LocalCopyConnector {
            duck: DuckDbConnector::in_memory().unwrap(),
            files: dir.path().join("objects"),
        };
        let executor = SqlExecutor::connect(Arc::new(connector)).await.unwrap();
        let store = Arc::new(InMemory::new());
        let orchestrator = Orchestrator::new(
            executor,
            Arc::new(ObjectStoreRemote::new(store.clone())),
            Box::new(DataDirManifests::new(dir.path())),
        );
        Self {
            dir,
            store,
            orchestrator,
        }
    }

    fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Write the export object and the table manifest.
    fn export(&self, table_id: &str, columns: &[&str], key: &str, csv: &str, sliced: bool) {
        std::fs::write(self.data_dir().join("objects").join(key), csv).unwrap();
        let columns = columns
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(",");
        let manifest = format!(
            r#"{{
                "columns": [{columns}],
                "s3": {{
                    "isSliced": {sliced},
                    "region": "us-east-1",
                    "bucket": "exports",
                    "key": "{key}",
                    "credentials": {{
                        "access_key_id": "AKIA",
                        "secret_access_key": "secret",
                        "session_token": "token"
                    }}
                }}
            }}"#
        );
        std::fs::write(
            self.data_dir()
                .join("in")
                .join("tables")
                .join(format!("{table_id}.csv.manifest")),
            manifest,
        )
        .unwrap();
    }

    async fn put_object(&self, key: &str, body: &str) {
        self.store
            .put(
                &ObjectStorePath::from(key),
                PutPayload::from(body.as_bytes().to_vec()),
            )
            .await
            .unwrap();
    }

    async fn rows(&mut self, sql: &str) -> Vec<Vec<Option<String>>> {
        self.orchestrator
            .executor_mut()
            .query(sql)
            .await
            .unwrap()
            .rows
    }
}

fn spec(table_id: &str, incremental: bool) -> TableLoadSpec {
    TableLoadSpec {
        table_id: table_id.to_string(),
        db_name: table_id.to_string(),
        export: true,
        incremental,
        primary_key: if incremental {
            vec!["id".to_string()]
        } else {
            vec![]
        },
        items: vec![
            ColumnDefinition::new("id", ColumnType::parse("int").unwrap()),
            ColumnDefinition::new("name", ColumnType::parse("varchar").unwrap()).with_size("255"),
        ],
    }
}

fn row(id: &str, name: &str) -> Vec<Option<String>> {
    vec![Some(id.to_string()), Some(name.to_string())]
}

#[tokio::test]
async fn test_full_load_of_simple_table() {
    let mut h = Harness::new().await;
    h.export(
        "simple",
        &["id", "name"],
        "simple.csv",
        "id,name\n1,alpha\n2,beta\n3,gamma\n",
        false,
    );

    let result = h.orchestrator.run(&[spec("simple", false)]).await.unwrap();

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.uploaded, vec!["simple"]);
    assert_eq!(
        h.rows("SELECT id, name FROM simple ORDER BY id").await,
        vec![row("1", "alpha"), row("2", "beta"), row("3", "gamma")]
    );
}

#[tokio::test]
async fn test_full_load_replaces_previous_rows() {
    let mut h = Harness::new().await;
    h.export(
        "simple",
        &["id", "name"],
        "simple.csv",
        "id,name\n1,alpha\n2,beta\n3,gamma\n",
        false,
    );

    h.orchestrator.run(&[spec("simple", false)]).await.unwrap();
    h.orchestrator.run(&[spec("simple", false)]).await.unwrap();

    assert_eq!(
        h.rows("SELECT count(*) FROM simple").await,
        vec![vec![Some("3".to_string())]]
    );
}

#[tokio::test]
async fn test_null_token_loads_as_null() {
    let mut h = Harness::new().await;
    h.export(
        "simple",
        &["id", "name"],
        "simple.csv",
        "id,name\n1,NULL\n",
        false,
    );

    h.orchestrator.run(&[spec("simple", false)]).await.unwrap();

    assert_eq!(
        h.rows("SELECT id, name FROM simple").await,
        vec![vec![Some("1".to_string()), None]]
    );
}

#[tokio::test]
async fn test_incremental_loads_merge_by_key() {
    let mut h = Harness::new().await;
    h.export(
        "people",
        &["id", "name"],
        "people.csv",
        "id,name\n1,A\n2,B\n",
        false,
    );
    h.orchestrator.run(&[spec("people", true)]).await.unwrap();

    h.export(
        "people",
        &["id", "name"],
        "people.csv",
        "id,name\n2,B updated\n3,C\n",
        false,
    );
    let result = h.orchestrator.run(&[spec("people", true)]).await.unwrap();

    assert_eq!(result.uploaded, vec!["people"]);
    assert_eq!(
        h.rows("SELECT id, name FROM people ORDER BY id").await,
        vec![row("1", "A"), row("2", "B updated"), row("3", "C")]
    );
    assert!(h
        .rows("SELECT table_name FROM information_schema.tables WHERE table_name LIKE 'people_temp_%'")
        .await
        .is_empty());
}

#[tokio::test]
async fn test_empty_sliced_export_creates_empty_table() {
    let mut h = Harness::new().await;
    h.export("sliced", &["id", "name"], "sliced.csv", "id,name\n", true);
    h.put_object("sliced.csvmanifest", r#"{"entries":[]}"#).await;

    let result = h.orchestrator.run(&[spec("sliced", false)]).await.unwrap();

    assert_eq!(result.uploaded, vec!["sliced"]);
    assert_eq!(
        h.rows("SELECT count(*) FROM sliced").await,
        vec![vec![Some("0".to_string())]]
    );
}

#[tokio::test]
async fn test_column_mismatch_leaves_warehouse_untouched() {
    let mut h = Harness::new().await;
    h.export(
        "simple",
        &["name", "id"],
        "simple.csv",
        "name,id\nalpha,1\n",
        false,
    );

    let failure = h
        .orchestrator
        .run(&[spec("simple", false)])
        .await
        .unwrap_err();

    assert_eq!(failure.kind(), rsw_load::ErrorKind::Configuration);
    assert!(h
        .rows("SELECT table_name FROM information_schema.tables WHERE table_name = 'simple'")
        .await
        .is_empty());
}
