//! Retrying SQL executor
//!
//! Every warehouse statement goes through [`SqlExecutor`]. It redacts
//! credentials before anything is logged, retries transient failures a
//! bounded number of times, captures load diagnostics after each failure,
//! and replaces the live connection on every failed attempt.

use crate::error::{DbError, DbResult};
use crate::traits::{Connector, Database, LoadDiagnostic, QueryResult};
use rsw_core::sql_utils::redact_credentials;
use std::sync::Arc;
use std::time::Duration;

/// Bounded retry schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per statement, including the first
    pub max_attempts: u32,
    /// Base unit of the quadratic backoff
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Pause taken after failed attempt `attempt` (1-based) before the next
    /// one: `(attempt - 1)²` units, i.e. 0s, 1s, 4s...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let previous = attempt.saturating_sub(1);
        self.backoff_unit * previous.saturating_mul(previous)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Clone, Copy)]
enum Op {
    Execute,
    Query,
}

enum Outcome {
    Affected(u64),
    Rows(QueryResult),
}

/// Owns the live warehouse connection and runs statements against it.
pub struct SqlExecutor {
    conn: Box<dyn Database>,
    connector: Arc<dyn Connector>,
    policy: RetryPolicy,
    reconnects: u32,
}

impl SqlExecutor {
    /// Open the first connection through `connector`.
    pub async fn connect(connector: Arc<dyn Connector>) -> DbResult<Self> {
        let conn = connector.connect().await?;
        Ok(Self::new(conn, connector))
    }

    /// Wrap an already-open connection.
    pub fn new(conn: Box<dyn Database>, connector: Arc<dyn Connector>) -> Self {
        Self {
            conn,
            connector,
            policy: RetryPolicy::default(),
            reconnects: 0,
        }
    }

    /// Replace the retry schedule.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Successful reconnects since creation
    pub fn reconnect_count(&self) -> u32 {
        self.reconnects
    }

    /// Run a statement, returning affected rows.
    pub async fn execute(&mut self, sql: &str) -> DbResult<u64> {
        match self.run(sql, Op::Execute).await? {
            Outcome::Affected(n) => Ok(n),
            Outcome::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    /// Run a query, collecting rows as text.
    pub async fn query(&mut self, sql: &str) -> DbResult<QueryResult> {
        match self.run(sql, Op::Query).await? {
            Outcome::Rows(rows) => Ok(rows),
            Outcome::Affected(_) => Ok(QueryResult::default()),
        }
    }

    async fn run(&mut self, sql: &str, op: Op) -> DbResult<Outcome> {
        let redacted = redact_credentials(sql);
        log::info!("Executing query: '{}'", redacted);

        let attempts = self.policy.attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match op {
                Op::Execute => self.conn.execute(sql).await.map(Outcome::Affected),
                Op::Query => self.conn.query(sql).await.map(Outcome::Rows),
            };

            let err = match result {
                Ok(outcome) => return Ok(outcome),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => err,
            };

            let diagnostics = self.capture_diagnostics().await;
            let failure = query_failed(&redacted, &err, diagnostics);
            log::error!("{}", failure);

            self.reconnect().await;

            if attempt >= attempts {
                return Err(failure);
            }
            log::info!("{}. Retrying... [{}x]", failure_message(&failure), attempt);
            let delay = self.policy.delay_after(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn capture_diagnostics(&self) -> Vec<LoadDiagnostic> {
        match self.conn.load_errors().await {
            Ok(rows) => rows,
            Err(e) => {
                log::debug!("Load diagnostics unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Swap in a fresh connection. A failed reconnect keeps the old handle so
    /// the original error stays the one reported.
    async fn reconnect(&mut self) {
        match self.connector.connect().await {
            Ok(conn) => {
                self.conn = conn;
                self.reconnects += 1;
            }
            Err(e) => log::warn!("Reconnect to {} failed: {}", self.connector.describe(), e),
        }
    }
}

fn query_failed(redacted: &str, err: &DbError, diagnostics: Vec<LoadDiagnostic>) -> DbError {
    let message = if diagnostics.is_empty() {
        redact_credentials(&driver_message(err))
    } else {
        diagnostics
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    };
    DbError::QueryFailed {
        statement: redacted.to_string(),
        message,
        diagnostics,
    }
}

fn driver_message(err: &DbError) -> String {
    match err {
        DbError::ConnectionError(m) | DbError::ExecutionError(m) => m.clone(),
        other => other.to_string(),
    }
}

fn failure_message(err: &DbError) -> &str {
    match err {
        DbError::QueryFailed { message, .. } => message,
        _ => "",
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
