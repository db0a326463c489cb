//! Fanout Executor
//!
//! Runs every query against every instance with a bounded worker pool and
//! gathers the results into one table.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      FanoutExecutor                         │
//! │  - plan(instances, queries) → Vec<Task> (cross product)     │
//! │  - execute(instances, queries, cancel) → FanoutOutcome      │
//! │  - semaphore caps open connections at max_parallelism       │
//! └─────────────────────────────────────────────────────────────┘
//!                               │ one spawned worker per task
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         run_task                            │
//! │  - acquire permit → connect → query → close                 │
//! │  - timeout / cancellation recorded as task errors           │
//! └─────────────────────────────────────────────────────────────┘
//!                               │ completion order
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          gather                             │
//! │  - one slot per task, written once                          │
//! │  - failures collected, tables concatenated                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use fanout_connector::SqlxConnector;
//! use fanout_executor::{ExecutorConfig, FanoutExecutor};
//! use tokio_util::sync::CancellationToken;
//!
//! let executor = FanoutExecutor::new(Arc::new(SqlxConnector::new()), ExecutorConfig::default());
//! let outcome = executor
//!   .execute(&job.instances, &job.queries, CancellationToken::new())
//!   .await?;
//!
//! for failure in &outcome.failures {
//!   eprintln!("{failure}");
//! }
//! ```

mod config;
mod error;
mod executor;
mod result;
mod task;

pub use config::ExecutorConfig;
pub use error::{FanoutError, TaskError, TaskFailure};
pub use executor::FanoutExecutor;
pub use result::{FanoutOutcome, TaskReport, TaskStatus};
pub use task::Task;
