//! In-memory test doubles for `Database` and `Connector`.
//!
//! Available to this crate's tests and, behind the `test-support` feature,
//! to downstream crates.

use crate::error::{DbError, DbResult};
use crate::traits::{Connector, Database, LoadDiagnostic, QueryResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Recording {
    statements: Vec<String>,
    responses: Vec<(String, QueryResult)>,
    failures: Vec<String>,
}

/// Records every statement; answers queries from canned responses.
///
/// Clones share the same log, so a connector can hand out "new" connections
/// that all report into one place.
#[derive(Clone, Default)]
pub struct RecordingDatabase {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer queries containing `pattern` with `result`.
    pub fn respond_to(&self, pattern: &str, result: QueryResult) -> &Self {
        self.state().responses.push((pattern.to_string(), result));
        self
    }

    /// Fail every statement containing `pattern` with a transient error.
    pub fn fail_on(&self, pattern: &str) -> &Self {
        self.state().failures.push(pattern.to_string());
        self
    }

    /// Every statement received, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state().statements.clone()
    }

    /// Statements containing `needle`.
    pub fn statements_containing(&self, needle: &str) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter(|s| s.contains(needle))
            .collect()
    }

    fn record(&self, sql: &str) -> DbResult<()> {
        let mut state = self.state();
        state.statements.push(sql.to_string());
        if state.failures.iter().any(|p| sql.contains(p.as_str())) {
            return Err(DbError::ExecutionError(format!("forced failure: {}", sql)));
        }
        Ok(())
    }
}

#[async_trait]
impl Database for RecordingDatabase {
    async fn execute(&self, sql: &str) -> DbResult<u64> {
        self.record(sql)?;
        Ok(0)
    }

    async fn query(&self, sql: &str) -> DbResult<QueryResult> {
        self.record(sql)?;
        let state = self.state();
        Ok(state
            .responses
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default())
    }

    fn db_type(&self) -> &'static str {
        "recording"
    }
}

/// Hands out clones of one `RecordingDatabase`.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    db: RecordingDatabase,
    connects: Arc<AtomicU32>,
}

impl RecordingConnector {
    pub fn new(db: RecordingDatabase) -> Self {
        Self {
            db,
            connects: Arc::default(),
        }
    }

    pub fn database(&self) -> &RecordingDatabase {
        &self.db
    }

    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self) -> DbResult<Box<dyn Database>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.db.clone()))
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}

struct FlakyState {
    remaining_failures: AtomicU32,
    attempts: AtomicU32,
    connects: AtomicU32,
    diagnostics: Vec<LoadDiagnostic>,
    refuse_reconnect: bool,
}

/// Connections whose statements fail a fixed number of times in total,
/// counted across reconnects, then succeed.
#[derive(Clone)]
pub struct FlakyConnector {
    state: Arc<FlakyState>,
    db: RecordingDatabase,
}

impl FlakyConnector {
    pub fn new(failures: u32) -> Self {
        Self {
            state: Arc::new(FlakyState {
                remaining_failures: AtomicU32::new(failures),
                attempts: AtomicU32::new(0),
                connects: AtomicU32::new(0),
                diagnostics: Vec::new(),
                refuse_reconnect: false,
            }),
            db: RecordingDatabase::new(),
        }
    }

    /// Report `diagnostics` from `load_errors` after each failure.
    pub fn with_diagnostics(self, diagnostics: Vec<LoadDiagnostic>) -> Self {
        self.rebuild(|s| s.diagnostics = diagnostics)
    }

    /// Accept the first connection, refuse every later one.
    pub fn refusing_reconnect(self) -> Self {
        self.rebuild(|s| s.refuse_reconnect = true)
    }

    fn rebuild(self, f: impl FnOnce(&mut FlakyState)) -> Self {
        let mut state = FlakyState {
            remaining_failures: AtomicU32::new(self.state.remaining_failures.load(Ordering::SeqCst)),
            attempts: AtomicU32::new(self.state.attempts.load(Ordering::SeqCst)),
            connects: AtomicU32::new(self.state.connects.load(Ordering::SeqCst)),
            diagnostics: self.state.diagnostics.clone(),
            refuse_reconnect: self.state.refuse_reconnect,
        };
        f(&mut state);
        Self {
            state: Arc::new(state),
            db: self.db,
        }
    }

    /// Statements that reached the database after the failures ran out.
    pub fn database(&self) -> &RecordingDatabase {
        &self.db
    }

    /// Statement attempts, failed or not
    pub fn attempt_count(&self) -> u32 {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// Connection attempts, successful or not
    pub fn connect_count(&self) -> u32 {
        self.state.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FlakyConnector {
    async fn connect(&self) -> DbResult<Box<dyn Database>> {
        let previous = self.state.connects.fetch_add(1, Ordering::SeqCst);
        if self.state.refuse_reconnect && previous > 0 {
            return Err(DbError::ConnectionError("connection refused".to_string()));
        }
        Ok(Box::new(FlakyDatabase {
            state: Arc::clone(&self.state),
            db: self.db.clone(),
        }))
    }

    fn describe(&self) -> String {
        "flaky".to_string()
    }
}

struct FlakyDatabase {
    state: Arc<FlakyState>,
    db: RecordingDatabase,
}

impl FlakyDatabase {
    fn attempt(&self) -> DbResult<()> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .state
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(DbError::ConnectionError("connection reset by peer".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Database for FlakyDatabase {
    async fn execute(&self, sql: &str) -> DbResult<u64> {
        self.attempt()?;
        self.db.execute(sql).await
    }

    async fn query(&self, sql: &str) -> DbResult<QueryResult> {
        self.attempt()?;
        self.db.query(sql).await
    }

    async fn load_errors(&self) -> DbResult<Vec<LoadDiagnostic>> {
        Ok(self.state.diagnostics.clone())
    }

    fn db_type(&self) -> &'static str {
        "flaky"
    }
}
