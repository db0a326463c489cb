use serde::{Deserialize, Serialize};

/// Database driver used to reach an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
  Postgres,
  Mysql,
  Sqlite,
}

impl Driver {
  /// URL scheme understood by the connector.
  pub fn scheme(&self) -> &'static str {
    match self {
      Driver::Postgres => "postgres",
      Driver::Mysql => "mysql",
      Driver::Sqlite => "sqlite",
    }
  }

  /// Port used when the descriptor does not name one.
  pub fn default_port(&self) -> Option<u16> {
    match self {
      Driver::Postgres => Some(5432),
      Driver::Mysql => Some(3306),
      Driver::Sqlite => None,
    }
  }
}

/// Order in which result tables are concatenated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOrder {
  /// Tables appear in the order their tasks finished.
  #[default]
  Completion,
  /// Tables appear in task order (instance-major, query-minor).
  Task,
}
