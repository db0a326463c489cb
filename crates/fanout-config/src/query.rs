use serde::{Deserialize, Serialize};

/// One SQL statement to run against every instance.
///
/// In a job file a query is either an object with an id, or a bare SQL
/// string. Bare strings get positional ids (`q1`, `q2`, ...) when the job is
/// loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QueryEntry")]
pub struct QueryDef {
  pub query_id: String,
  pub sql: String,
}

impl QueryDef {
  pub fn new(query_id: impl Into<String>, sql: impl Into<String>) -> Self {
    Self {
      query_id: query_id.into(),
      sql: sql.into(),
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryEntry {
  Sql(String),
  Def { query_id: String, sql: String },
}

impl From<QueryEntry> for QueryDef {
  fn from(entry: QueryEntry) -> Self {
    match entry {
      QueryEntry::Sql(sql) => QueryDef {
        query_id: String::new(),
        sql,
      },
      QueryEntry::Def { query_id, sql } => QueryDef { query_id, sql },
    }
  }
}
