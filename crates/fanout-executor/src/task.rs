//! Task construction and the per-task worker.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use fanout_config::{InstanceDescriptor, ProvenanceDef, QueryDef};
use fanout_connector::Connector;
use fanout_table::{ResultTable, TaskKey};
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::TaskError;

/// Upper bound on closing a connection, which may be dead after a timeout.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// One (instance, query) pairing.
#[derive(Debug, Clone)]
pub struct Task {
  /// Position in the cross product (instance-major, query-minor).
  pub index: usize,
  pub key: TaskKey,
  pub instance: InstanceDescriptor,
  pub query: QueryDef,
}

/// Build the full cross product of instances and queries.
pub(crate) fn cross_product(instances: &[InstanceDescriptor], queries: &[QueryDef]) -> Vec<Task> {
  instances
    .iter()
    .flat_map(|instance| queries.iter().map(move |query| (instance, query)))
    .enumerate()
    .map(|(index, (instance, query))| Task {
      index,
      key: TaskKey::new(&instance.name, &query.query_id),
      instance: instance.clone(),
      query: query.clone(),
    })
    .collect()
}

/// State shared by all workers of one fan-out.
pub(crate) struct WorkerContext {
  pub execution_id: String,
  pub connector: Arc<dyn Connector>,
  pub semaphore: Arc<Semaphore>,
  pub task_timeout: Option<Duration>,
  pub provenance: Option<ProvenanceDef>,
  pub cancel: CancellationToken,
}

/// What a worker hands back to the collector.
pub(crate) struct TaskOutcome {
  pub index: usize,
  pub key: TaskKey,
  pub result: Result<ResultTable, TaskError>,
  pub started_at: DateTime<Utc>,
  pub completed_at: DateTime<Utc>,
}

impl TaskOutcome {
  /// Outcome for a worker that never returned.
  pub fn panicked(index: usize, key: TaskKey, message: String) -> Self {
    let now = Utc::now();
    Self {
      index,
      key,
      result: Err(TaskError::Panicked { message }),
      started_at: now,
      completed_at: now,
    }
  }
}

/// Run one task: wait for a permit, connect, query, close.
///
/// The permit is held until the connection is closed, so the number of open
/// connections never exceeds the semaphore size.
#[instrument(
  name = "fanout_task",
  skip_all,
  fields(
    execution_id = %ctx.execution_id,
    instance = %task.key.instance,
    query = %task.key.query,
  )
)]
pub(crate) async fn run_task(task: Task, ctx: Arc<WorkerContext>) -> TaskOutcome {
  let started_at = Utc::now();
  let result = run_task_inner(&task, &ctx).await;

  TaskOutcome {
    index: task.index,
    key: task.key,
    result,
    started_at,
    completed_at: Utc::now(),
  }
}

async fn run_task_inner(task: &Task, ctx: &WorkerContext) -> Result<ResultTable, TaskError> {
  let _permit = tokio::select! {
    biased;
    _ = ctx.cancel.cancelled() => return Err(TaskError::Cancelled),
    permit = ctx.semaphore.clone().acquire_owned() => {
      permit.map_err(|_| TaskError::Cancelled)?
    }
  };

  info!(index = task.index, "task_started");

  let deadline = ctx.task_timeout.map(|timeout| Instant::now() + timeout);
  let timeout_ms = ctx
    .task_timeout
    .map(|timeout| timeout.as_millis() as u64)
    .unwrap_or_default();

  let mut connection = bounded(
    ctx.connector.connect(&task.instance),
    deadline,
    timeout_ms,
    &ctx.cancel,
  )
  .await?
  .map_err(|source| TaskError::ConnectionFailed { source })?;

  let fetched = bounded(
    connection.query(&task.query.sql),
    deadline,
    timeout_ms,
    &ctx.cancel,
  )
  .await
  .and_then(|result| result.map_err(|source| TaskError::QueryFailed { source }));

  // Closed on every path once opened, before the permit is released.
  match tokio::time::timeout(CLOSE_TIMEOUT, connection.close()).await {
    Ok(Ok(())) => {}
    Ok(Err(e)) => warn!(error = %e, "failed to close connection"),
    Err(_) => warn!(
      timeout_ms = CLOSE_TIMEOUT.as_millis() as u64,
      "connection close timed out"
    ),
  }

  let rows = fetched?;
  let table = ResultTable::new(task.key.clone(), rows.columns, rows.rows)
    .map_err(|source| TaskError::InvalidResult { source })?;

  match &ctx.provenance {
    Some(provenance) => table
      .with_provenance(&provenance.instance_column, &provenance.query_column)
      .map_err(|source| TaskError::InvalidResult { source }),
    None => Ok(table),
  }
}

/// Await `fut` unless the deadline passes or the fan-out is cancelled first.
async fn bounded<F>(
  fut: F,
  deadline: Option<Instant>,
  timeout_ms: u64,
  cancel: &CancellationToken,
) -> Result<F::Output, TaskError>
where
  F: Future,
{
  let timed = async move {
    match deadline {
      Some(deadline) => tokio::time::timeout_at(deadline, fut)
        .await
        .map_err(|_| TaskError::Timeout { timeout_ms }),
      None => Ok(fut.await),
    }
  };

  tokio::select! {
    biased;
    _ = cancel.cancelled() => Err(TaskError::Cancelled),
    result = timed => result,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use fanout_config::{Driver, Secret};

  fn instance(name: &str) -> InstanceDescriptor {
    InstanceDescriptor {
      name: name.to_string(),
      driver: Driver::Sqlite,
      username: String::new(),
      password: Secret::default(),
      password_env: None,
      host: String::new(),
      port: None,
      service_name: format!("/tmp/{}.db", name),
    }
  }

  #[test]
  fn test_cross_product_is_instance_major() {
    let instances = vec![instance("a"), instance("b"), instance("c")];
    let queries = vec![QueryDef::new("q1", "SELECT 1"), QueryDef::new("q2", "SELECT 2")];

    let tasks = cross_product(&instances, &queries);

    assert_eq!(tasks.len(), 6);
    let keys: Vec<String> = tasks.iter().map(|t| t.key.to_string()).collect();
    assert_eq!(keys, ["a/q1", "a/q2", "b/q1", "b/q2", "c/q1", "c/q2"]);
    assert!(tasks.iter().enumerate().all(|(i, t)| t.index == i));
    assert_eq!(tasks[3].query.sql, "SELECT 2");
    assert_eq!(tasks[3].instance.name, "b");
  }

  #[tokio::test]
  async fn test_bounded_passes_output_through() {
    let cancel = CancellationToken::new();
    let result = bounded(async { 7 }, None, 0, &cancel).await;
    assert!(matches!(result, Ok(7)));
  }

  #[tokio::test]
  async fn test_bounded_times_out() {
    let cancel = CancellationToken::new();
    let deadline = Some(Instant::now() + Duration::from_millis(10));
    let result = bounded(
      tokio::time::sleep(Duration::from_secs(5)),
      deadline,
      10,
      &cancel,
    )
    .await;
    assert!(matches!(result, Err(TaskError::Timeout { timeout_ms: 10 })));
  }

  #[tokio::test]
  async fn test_bounded_observes_cancellation() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = bounded(std::future::pending::<()>(), None, 0, &cancel).await;
    assert!(matches!(result, Err(TaskError::Cancelled)));
  }
}
