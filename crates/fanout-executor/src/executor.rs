//! Fan-out executor implementation.

use std::collections::HashSet;
use std::sync::Arc;

use fanout_config::{InstanceDescriptor, MergeOrder, QueryDef};
use fanout_connector::Connector;
use fanout_table::CombinedTable;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::ExecutorConfig;
use crate::error::{FanoutError, TaskError, TaskFailure};
use crate::result::{FanoutOutcome, TaskReport, TaskStatus};
use crate::task::{Task, TaskOutcome, WorkerContext, cross_product, run_task};

/// The fan-out/gather executor.
///
/// Expands instances and queries into their cross product, runs every task
/// on a worker pool bounded by `max_parallelism`, and concatenates the
/// result tables. Task failures never abort sibling tasks; they are returned
/// alongside the rows of the tasks that succeeded.
pub struct FanoutExecutor {
  connector: Arc<dyn Connector>,
  config: ExecutorConfig,
}

impl FanoutExecutor {
  /// Create a new executor.
  pub fn new(connector: Arc<dyn Connector>, config: ExecutorConfig) -> Self {
    Self { connector, config }
  }

  pub fn config(&self) -> &ExecutorConfig {
    &self.config
  }

  /// Validate the inputs and build the task set, without running anything.
  pub fn plan(
    &self,
    instances: &[InstanceDescriptor],
    queries: &[QueryDef],
  ) -> Result<Vec<Task>, FanoutError> {
    if self.config.max_parallelism < 1 {
      return Err(invalid_argument("max_parallelism must be at least 1"));
    }
    if self.config.task_timeout.is_some_and(|timeout| timeout.is_zero()) {
      return Err(invalid_argument("task_timeout must be greater than zero"));
    }
    if instances.is_empty() {
      return Err(invalid_argument("at least one instance is required"));
    }
    if queries.is_empty() {
      return Err(invalid_argument("at least one query is required"));
    }

    let mut names = HashSet::new();
    for instance in instances {
      if !names.insert(instance.name.as_str()) {
        return Err(invalid_argument(&format!(
          "duplicate instance name '{}'",
          instance.name
        )));
      }
    }

    let mut query_ids = HashSet::new();
    for query in queries {
      if !query_ids.insert(query.query_id.as_str()) {
        return Err(invalid_argument(&format!(
          "duplicate query id '{}'",
          query.query_id
        )));
      }
      if query.sql.trim().is_empty() {
        return Err(invalid_argument(&format!(
          "query '{}' has no SQL",
          query.query_id
        )));
      }
    }

    Ok(cross_product(instances, queries))
  }

  /// Run every query against every instance and merge the results.
  ///
  /// Returns `Err` only for invalid input or when the successful tables
  /// cannot be concatenated. Per-task failures, including timeouts and
  /// cancellation, are reported in [`FanoutOutcome::failures`].
  #[instrument(
    name = "fanout_execute",
    skip(self, instances, queries, cancel),
    fields(
      instances = instances.len(),
      queries = queries.len(),
      max_parallelism = self.config.max_parallelism,
    )
  )]
  pub async fn execute(
    &self,
    instances: &[InstanceDescriptor],
    queries: &[QueryDef],
    cancel: CancellationToken,
  ) -> Result<FanoutOutcome, FanoutError> {
    let tasks = self.plan(instances, queries)?;
    // Dropping this future cancels the workers it spawned.
    let cancel = cancel.child_token();
    let _abandon_guard = cancel.clone().drop_guard();
    let task_count = tasks.len();
    let execution_id = uuid::Uuid::new_v4().to_string();

    info!(
      execution_id = %execution_id,
      tasks = task_count,
      max_parallelism = self.config.max_parallelism,
      "fanout_started"
    );

    let ctx = Arc::new(WorkerContext {
      execution_id: execution_id.clone(),
      connector: self.connector.clone(),
      semaphore: Arc::new(Semaphore::new(self.config.max_parallelism)),
      task_timeout: self.config.task_timeout,
      provenance: self.config.provenance.clone(),
      cancel: cancel.clone(),
    });

    let mut pending: FuturesUnordered<_> = tasks
      .into_iter()
      .map(|task| {
        let index = task.index;
        let key = task.key.clone();
        let handle = tokio::spawn(run_task(task, ctx.clone()));
        async move { (index, key, handle.await) }
      })
      .collect();

    // One slot per task. Slot `i` is filled once, from task `i`'s own result.
    let mut slots: Vec<Option<TaskOutcome>> = std::iter::repeat_with(|| None)
      .take(task_count)
      .collect();
    let mut completion_order = Vec::with_capacity(task_count);

    while let Some((index, key, joined)) = pending.next().await {
      let outcome = joined.unwrap_or_else(|e| TaskOutcome::panicked(index, key, e.to_string()));

      match &outcome.result {
        Ok(table) => {
          info!(
            execution_id = %execution_id,
            instance = %outcome.key.instance,
            query = %outcome.key.query,
            rows = table.len(),
            "task_completed"
          );
        }
        Err(TaskError::Cancelled) => {
          warn!(
            execution_id = %execution_id,
            instance = %outcome.key.instance,
            query = %outcome.key.query,
            "task_cancelled"
          );
        }
        Err(e) => {
          error!(
            execution_id = %execution_id,
            instance = %outcome.key.instance,
            query = %outcome.key.query,
            error = %e,
            "task_failed"
          );
        }
      }

      slots[index] = Some(outcome);
      completion_order.push(index);
    }

    let result = self.gather(execution_id.clone(), slots, completion_order);

    match &result {
      Ok(outcome) => {
        info!(
          execution_id = %execution_id,
          tasks = outcome.task_count(),
          succeeded = outcome.succeeded_count(),
          failed = outcome.failures.len(),
          rows = outcome.table.len(),
          "fanout_completed"
        );
      }
      Err(e) => {
        error!(execution_id = %execution_id, error = %e, "fanout_failed");
      }
    }

    result
  }

  /// Turn the filled slots into reports, failures and the combined table.
  fn gather(
    &self,
    execution_id: String,
    mut slots: Vec<Option<TaskOutcome>>,
    completion_order: Vec<usize>,
  ) -> Result<FanoutOutcome, FanoutError> {
    let order = match self.config.merge_order {
      MergeOrder::Completion => completion_order,
      MergeOrder::Task => (0..slots.len()).collect(),
    };

    let mut reports = Vec::with_capacity(order.len());
    let mut failures = Vec::new();
    let mut tables = Vec::with_capacity(order.len());

    for outcome in order.into_iter().filter_map(|index| slots[index].take()) {
      let report = self.report(&outcome);
      match outcome.result {
        Ok(table) => tables.push(table),
        Err(error) => failures.push(TaskFailure::new(&outcome.key, error)),
      }
      reports.push(report);
    }

    let table =
      CombinedTable::concat(tables).map_err(|source| FanoutError::SchemaMismatch { source })?;

    Ok(FanoutOutcome {
      execution_id,
      table,
      reports,
      failures,
    })
  }

  fn report(&self, outcome: &TaskOutcome) -> TaskReport {
    let (status, row_count, content_key, error) = match &outcome.result {
      Ok(table) => {
        let content_key = self.config.content_key.as_ref().and_then(|columns| {
          table.content_key(&columns.instance_column, &columns.statement_column)
        });
        (TaskStatus::Succeeded, table.len(), content_key, None)
      }
      Err(TaskError::Cancelled) => (
        TaskStatus::Cancelled,
        0,
        None,
        Some(TaskError::Cancelled.to_string()),
      ),
      Err(e) => (TaskStatus::Failed, 0, None, Some(e.to_string())),
    };

    let elapsed_ms = (outcome.completed_at - outcome.started_at)
      .num_milliseconds()
      .max(0) as u64;

    TaskReport {
      index: outcome.index,
      key: outcome.key.clone(),
      status,
      row_count,
      content_key,
      error,
      started_at: outcome.started_at,
      completed_at: outcome.completed_at,
      elapsed_ms,
    }
  }
}

fn invalid_argument(message: &str) -> FanoutError {
  FanoutError::InvalidArgument {
    message: message.to_string(),
  }
}
