//! Fan-out result types.

use chrono::{DateTime, Utc};
use fanout_table::{CombinedTable, TaskKey, Value};
use serde::Serialize;

use crate::error::TaskFailure;

/// Final state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
  Succeeded,
  Failed,
  Cancelled,
}

/// What happened to one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
  /// Position of the task in the cross product (instance-major).
  pub index: usize,
  pub key: TaskKey,
  pub status: TaskStatus,
  /// Rows the task contributed to the combined table.
  pub row_count: usize,
  /// Identity read back from the first row, when content key columns are
  /// configured and present.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content_key: Option<(Value, Value)>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  pub started_at: DateTime<Utc>,
  pub completed_at: DateTime<Utc>,
  pub elapsed_ms: u64,
}

/// Result of a complete fan-out.
///
/// Every task appears exactly once in `reports`. Tasks that failed also
/// appear in `failures`; their rows are absent from `table`.
#[derive(Debug)]
pub struct FanoutOutcome {
  /// Unique execution ID.
  pub execution_id: String,
  /// Rows of every successful task.
  pub table: CombinedTable,
  /// One report per task, in merge order.
  pub reports: Vec<TaskReport>,
  /// Per-task failures, in merge order.
  pub failures: Vec<TaskFailure>,
}

impl FanoutOutcome {
  /// True when every task succeeded.
  pub fn is_complete(&self) -> bool {
    self.failures.is_empty()
  }

  pub fn task_count(&self) -> usize {
    self.reports.len()
  }

  pub fn succeeded_count(&self) -> usize {
    self
      .reports
      .iter()
      .filter(|r| r.status == TaskStatus::Succeeded)
      .count()
  }
}
