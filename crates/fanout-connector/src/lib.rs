//! Fanout Connector
//!
//! The database capability the executor runs tasks against. The
//! [`Connector`] trait opens one [`Connection`] to an instance; a connection
//! runs SQL and returns its rows, and is closed explicitly when the task is
//! done with it.
//!
//! [`SqlxConnector`] implements the traits on top of sqlx's `Any` driver, so
//! PostgreSQL, MySQL and SQLite instances can be mixed in one job. Tests
//! substitute their own implementations.

mod sqlx_connector;

pub use sqlx_connector::{SqlxConnector, connection_url};

use async_trait::async_trait;
use fanout_config::InstanceDescriptor;
use fanout_table::Row;

/// Error type for connector operations.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
  /// The descriptor cannot be turned into a connection target.
  #[error("invalid descriptor for instance '{instance}': {message}")]
  InvalidDescriptor { instance: String, message: String },

  /// A column value has a type the connector cannot represent.
  #[error("cannot decode column '{column}': {message}")]
  Decode { column: String, message: String },

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Any other failure, used by alternative connector implementations.
  #[error("{0}")]
  Other(String),
}

/// Rows returned by one statement, with their column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
  pub columns: Vec<String>,
  pub rows: Vec<Row>,
}

/// Opens connections to database instances.
#[async_trait]
pub trait Connector: Send + Sync {
  /// Open one connection to the given instance.
  async fn connect(
    &self,
    instance: &InstanceDescriptor,
  ) -> Result<Box<dyn Connection>, ConnectorError>;
}

/// A single open connection, owned by one task.
#[async_trait]
pub trait Connection: Send {
  /// Execute a statement and fetch all of its rows.
  async fn query(&mut self, sql: &str) -> Result<QueryRows, ConnectorError>;

  /// Close the connection.
  async fn close(self: Box<Self>) -> Result<(), ConnectorError>;
}
