//! Fanout Table
//!
//! Explicit tabular values for query results. A [`ResultTable`] holds the
//! rows one task produced, labeled with the [`TaskKey`] of the task. A
//! [`CombinedTable`] is the concatenation of many result tables that share
//! one column list.

mod combined;
mod error;
mod table;
mod value;

pub use combined::CombinedTable;
pub use error::TableError;
pub use table::{ResultTable, Row, TaskKey};
pub use value::Value;
