//! Concatenation of result tables.

use std::io;

use serde::{Deserialize, Serialize};

use crate::error::TableError;
use crate::table::{ResultTable, Row};

/// All rows of many result tables, under one column list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedTable {
  columns: Vec<String>,
  rows: Vec<Row>,
}

impl CombinedTable {
  /// Concatenate tables in the given order, keeping each table's row order.
  ///
  /// The first non-empty table fixes the column list; every later non-empty
  /// table must have exactly the same columns in the same order. Empty tables
  /// contribute nothing and are not checked, since drivers do not report
  /// columns for an empty result.
  pub fn concat<I>(tables: I) -> Result<Self, TableError>
  where
    I: IntoIterator<Item = ResultTable>,
  {
    let mut combined = CombinedTable::default();
    let mut schema_set = false;

    for table in tables {
      if table.is_empty() {
        continue;
      }

      let (key, columns, rows) = table.into_parts();
      if !schema_set {
        combined.columns = columns;
        schema_set = true;
      } else if columns != combined.columns {
        return Err(TableError::SchemaMismatch {
          key,
          expected: combined.columns,
          found: columns,
        });
      }
      combined.rows.extend(rows);
    }

    Ok(combined)
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

  /// Stable sort by the values of the given columns, in order.
  pub fn sort_by(&mut self, columns: &[&str]) -> Result<(), TableError> {
    let indices = columns
      .iter()
      .map(|name| {
        self
          .columns
          .iter()
          .position(|c| c == name)
          .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
      })
      .collect::<Result<Vec<_>, _>>()?;

    self.rows.sort_by(|a, b| {
      indices
        .iter()
        .map(|&i| a[i].total_cmp(&b[i]))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(())
  }

  /// Rows as JSON objects keyed by column name.
  pub fn to_json(&self) -> serde_json::Value {
    let rows = self
      .rows
      .iter()
      .map(|row| {
        let object = self
          .columns
          .iter()
          .zip(row)
          .map(|(column, value)| (column.clone(), value.to_json()))
          .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
      })
      .collect();
    serde_json::Value::Array(rows)
  }

  /// Write the table as CSV with a header row.
  pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), TableError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&self.columns)?;
    for row in &self.rows {
      csv_writer.write_record(row.iter().map(|value| value.to_string()))?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
  }
}
