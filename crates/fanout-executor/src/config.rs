use std::time::Duration;

use fanout_config::{ContentKeyDef, JobDef, MergeOrder, ProvenanceDef};

/// Configuration for the fan-out executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
  /// Maximum number of tasks holding an open connection at once.
  pub max_parallelism: usize,
  /// Limit on connect plus query time for a single task.
  pub task_timeout: Option<Duration>,
  /// How result tables are ordered in the combined table.
  pub merge_order: MergeOrder,
  /// Columns appended to every row naming its instance and query.
  pub provenance: Option<ProvenanceDef>,
  /// Columns to read each table's self-reported identity from.
  pub content_key: Option<ContentKeyDef>,
}

impl Default for ExecutorConfig {
  fn default() -> Self {
    Self {
      max_parallelism: 4,
      task_timeout: None,
      merge_order: MergeOrder::Completion,
      provenance: None,
      content_key: None,
    }
  }
}

impl ExecutorConfig {
  /// Take executor settings from a job definition.
  pub fn from_job(job: &JobDef) -> Self {
    Self {
      max_parallelism: job.max_parallelism,
      task_timeout: job.task_timeout_ms.map(Duration::from_millis),
      merge_order: job.merge_order,
      provenance: job.provenance.clone(),
      content_key: job.content_key.clone(),
    }
  }
}
