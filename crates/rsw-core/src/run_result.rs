//! Run result reported to the orchestrating supervisor.

use serde::{Deserialize, Serialize};

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

/// Result of a run: status plus the ids of the tables that were loaded.
///
/// Created empty when orchestration starts and appended to as each table
/// completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub uploaded: Vec<String>,
}

impl RunResult {
    /// Empty, successful result
    pub fn new() -> Self {
        Self {
            status: RunStatus::Success,
            uploaded: Vec::new(),
        }
    }

    /// Record a table as loaded
    pub fn mark_uploaded(&mut self, table_id: impl Into<String>) {
        self.uploaded.push(table_id.into());
    }

    /// Flag the run as failed, keeping the tables already loaded
    pub fn mark_failed(&mut self) {
        self.status = RunStatus::Failure;
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

impl Default for RunResult {
    fn default() -> Self {
        Self::new()
    }
}
