use thiserror::Error;

use crate::table::TaskKey;

#[derive(Debug, Error)]
pub enum TableError {
  #[error("row {row} of '{key}' has {found} values, expected {expected}")]
  RowWidth {
    key: TaskKey,
    row: usize,
    expected: usize,
    found: usize,
  },

  #[error("columns of '{key}' {found:?} do not match {expected:?}")]
  SchemaMismatch {
    key: TaskKey,
    expected: Vec<String>,
    found: Vec<String>,
  },

  #[error("unknown column: {0}")]
  UnknownColumn(String),

  #[error("column '{0}' already exists")]
  DuplicateColumn(String),

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),
}
