//! Result tables produced by a single task.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::value::Value;

/// One row, aligned with its table's column list.
pub type Row = Vec<Value>;

/// Identity of the task that produced a table: (instance name, query id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskKey {
  pub instance: String,
  pub query: String,
}

impl TaskKey {
  pub fn new(instance: impl Into<String>, query: impl Into<String>) -> Self {
    Self {
      instance: instance.into(),
      query: query.into(),
    }
  }
}

impl fmt::Display for TaskKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.instance, self.query)
  }
}

/// The rows returned by executing one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
  key: TaskKey,
  columns: Vec<String>,
  rows: Vec<Row>,
}

impl ResultTable {
  /// Create a table, checking that every row has one value per column.
  pub fn new(key: TaskKey, columns: Vec<String>, rows: Vec<Row>) -> Result<Self, TableError> {
    if let Some((index, row)) = rows
      .iter()
      .enumerate()
      .find(|(_, row)| row.len() != columns.len())
    {
      return Err(TableError::RowWidth {
        key,
        row: index,
        expected: columns.len(),
        found: row.len(),
      });
    }

    Ok(Self { key, columns, rows })
  }

  /// A table with no rows (and no known columns).
  pub fn empty(key: TaskKey) -> Self {
    Self {
      key,
      columns: Vec::new(),
      rows: Vec::new(),
    }
  }

  pub fn key(&self) -> &TaskKey {
    &self.key
  }

  pub fn columns(&self) -> &[String] {
    &self.columns
  }

  pub fn rows(&self) -> &[Row] {
    &self.rows
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn column_index(&self, column: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == column)
  }

  /// Value of `column` in row `row`.
  pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
    let index = self.column_index(column)?;
    self.rows.get(row).map(|r| &r[index])
  }

  /// Key read back from the table's own content: the values of the
  /// instance and statement columns in the first row.
  ///
  /// Returns `None` for an empty table or when either column is missing.
  pub fn content_key(
    &self,
    instance_column: &str,
    statement_column: &str,
  ) -> Option<(Value, Value)> {
    let instance = self.value(0, instance_column)?.clone();
    let statement = self.value(0, statement_column)?.clone();
    Some((instance, statement))
  }

  /// Append two columns holding this table's instance name and query id.
  ///
  /// Empty tables are returned unchanged.
  pub fn with_provenance(
    mut self,
    instance_column: &str,
    query_column: &str,
  ) -> Result<Self, TableError> {
    if self.rows.is_empty() {
      return Ok(self);
    }

    for column in [instance_column, query_column] {
      if self.column_index(column).is_some() {
        return Err(TableError::DuplicateColumn(column.to_string()));
      }
    }

    self.columns.push(instance_column.to_string());
    self.columns.push(query_column.to_string());
    for row in &mut self.rows {
      row.push(Value::Text(self.key.instance.clone()));
      row.push(Value::Text(self.key.query.clone()));
    }

    Ok(self)
  }

  pub fn into_parts(self) -> (TaskKey, Vec<String>, Vec<Row>) {
    (self.key, self.columns, self.rows)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key() -> TaskKey {
    TaskKey::new("east", "sessions")
  }

  fn sample() -> ResultTable {
    ResultTable::new(
      key(),
      vec!["INSTANCE_NAME".to_string(), "SQL_ID".to_string(), "N".to_string()],
      vec![
        vec![Value::from("EAST1"), Value::from("abc123"), Value::Int(7)],
        vec![Value::from("EAST1"), Value::from("abc123"), Value::Int(9)],
      ],
    )
    .unwrap()
  }

  #[test]
  fn test_row_width_is_checked() {
    let err = ResultTable::new(
      key(),
      vec!["a".to_string(), "b".to_string()],
      vec![vec![Value::Int(1), Value::Int(2)], vec![Value::Int(3)]],
    )
    .unwrap_err();

    assert!(matches!(
      err,
      TableError::RowWidth {
        row: 1,
        expected: 2,
        found: 1,
        ..
      }
    ));
  }

  #[test]
  fn test_content_key_from_first_row() {
    let table = sample();
    assert_eq!(
      table.content_key("INSTANCE_NAME", "SQL_ID"),
      Some((Value::from("EAST1"), Value::from("abc123")))
    );
    assert_eq!(table.content_key("INSTANCE_NAME", "MISSING"), None);
  }

  #[test]
  fn test_content_key_of_empty_table() {
    let table = ResultTable::empty(key());
    assert_eq!(table.content_key("INSTANCE_NAME", "SQL_ID"), None);
    assert_eq!(table.key(), &key());
  }

  #[test]
  fn test_with_provenance() {
    let table = sample().with_provenance("instance_name", "query_id").unwrap();

    assert_eq!(table.columns().len(), 5);
    assert_eq!(table.value(1, "instance_name"), Some(&Value::from("east")));
    assert_eq!(table.value(1, "query_id"), Some(&Value::from("sessions")));
  }

  #[test]
  fn test_with_provenance_rejects_existing_column() {
    let err = sample().with_provenance("N", "query_id").unwrap_err();
    assert!(matches!(err, TableError::DuplicateColumn(c) if c == "N"));
  }

  #[test]
  fn test_with_provenance_leaves_empty_table() {
    let table = ResultTable::empty(key())
      .with_provenance("instance_name", "query_id")
      .unwrap();
    assert!(table.columns().is_empty());
  }
}
