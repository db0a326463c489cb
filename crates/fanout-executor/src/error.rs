//! Executor error types.

use fanout_connector::ConnectorError;
use fanout_table::{TableError, TaskKey};

/// Errors that fail a whole fan-out call.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
  /// Bad input at the call site; raised before any connection is attempted.
  #[error("invalid argument: {message}")]
  InvalidArgument { message: String },

  /// Result tables could not be concatenated.
  #[error("result tables cannot be merged: {source}")]
  SchemaMismatch {
    #[source]
    source: TableError,
  },
}

/// Why a single task did not produce a table.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
  /// Could not reach or authenticate to the instance.
  #[error("connection failed: {source}")]
  ConnectionFailed {
    #[source]
    source: ConnectorError,
  },

  /// The statement failed to execute.
  #[error("query failed: {source}")]
  QueryFailed {
    #[source]
    source: ConnectorError,
  },

  /// The rows returned do not form a valid table.
  #[error("invalid result: {source}")]
  InvalidResult {
    #[source]
    source: TableError,
  },

  /// The task ran past its timeout.
  #[error("timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  /// The fan-out was cancelled before the task finished.
  #[error("task cancelled")]
  Cancelled,

  /// The worker panicked.
  #[error("worker panicked: {message}")]
  Panicked { message: String },
}

/// A task failure, labeled with the instance and query it belongs to.
#[derive(Debug, thiserror::Error)]
#[error("task failed for instance '{instance}' query '{query}': {error}")]
pub struct TaskFailure {
  pub instance: String,
  pub query: String,
  #[source]
  pub error: TaskError,
}

impl TaskFailure {
  pub(crate) fn new(key: &TaskKey, error: TaskError) -> Self {
    Self {
      instance: key.instance.clone(),
      query: key.query.clone(),
      error,
    }
  }

  pub fn key(&self) -> TaskKey {
    TaskKey::new(&self.instance, &self.query)
  }
}
