use serde::{Deserialize, Serialize};

use crate::enums::MergeOrder;
use crate::error::ConfigError;
use crate::instance::{InstanceDescriptor, Secret};
use crate::query::QueryDef;

fn default_max_parallelism() -> usize {
  4
}

fn default_instance_column() -> String {
  "instance_name".to_string()
}

fn default_query_column() -> String {
  "query_id".to_string()
}

/// Columns appended to every row to record where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceDef {
  #[serde(default = "default_instance_column")]
  pub instance_column: String,
  #[serde(default = "default_query_column")]
  pub query_column: String,
}

impl Default for ProvenanceDef {
  fn default() -> Self {
    Self {
      instance_column: default_instance_column(),
      query_column: default_query_column(),
    }
  }
}

/// Columns a query emits to identify its own instance and statement.
///
/// When set, each task report carries the values found in the first row of
/// its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentKeyDef {
  pub instance_column: String,
  pub statement_column: String,
}

/// A fan-out job: every query runs against every instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default = "default_max_parallelism")]
  pub max_parallelism: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub task_timeout_ms: Option<u64>,
  #[serde(default)]
  pub merge_order: MergeOrder,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provenance: Option<ProvenanceDef>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content_key: Option<ContentKeyDef>,
  pub instances: Vec<InstanceDescriptor>,
  pub queries: Vec<QueryDef>,
}

impl JobDef {
  /// Parse a job definition from JSON and assign ids to bare SQL queries.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    let mut job: JobDef = serde_json::from_str(content)?;
    job.assign_query_ids();
    Ok(job)
  }

  /// Fill in passwords for instances that name a `password_env` variable.
  ///
  /// `lookup` is usually `|var| std::env::var(var).ok()`.
  pub fn resolve_secrets<F>(&mut self, lookup: F) -> Result<(), ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    for instance in &mut self.instances {
      let Some(var) = &instance.password_env else {
        continue;
      };

      let value = lookup(var).ok_or_else(|| ConfigError::MissingSecret {
        instance: instance.name.clone(),
        var: var.clone(),
      })?;
      instance.password = Secret::new(value);
    }
    Ok(())
  }

  /// Number of tasks this job expands to.
  pub fn task_count(&self) -> usize {
    self.instances.len() * self.queries.len()
  }

  fn assign_query_ids(&mut self) {
    for (position, query) in self.queries.iter_mut().enumerate() {
      if query.query_id.is_empty() {
        query.query_id = format!("q{}", position + 1);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::enums::Driver;

  const JOB: &str = r#"{
    "name": "sessions",
    "max_parallelism": 3,
    "task_timeout_ms": 5000,
    "merge_order": "task",
    "provenance": {},
    "instances": [
      { "name": "east", "driver": "postgres", "username": "ro", "password": "pw",
        "host": "db-east", "port": 5433, "service_name": "app" },
      { "name": "local", "driver": "sqlite", "service_name": "/tmp/local.db" }
    ],
    "queries": [
      { "query_id": "sessions", "sql": "SELECT * FROM sessions" },
      "SELECT 1 AS one"
    ]
  }"#;

  #[test]
  fn test_parse_job() {
    let job = JobDef::from_json(JOB).unwrap();

    assert_eq!(job.name.as_deref(), Some("sessions"));
    assert_eq!(job.max_parallelism, 3);
    assert_eq!(job.task_timeout_ms, Some(5000));
    assert_eq!(job.merge_order, MergeOrder::Task);
    assert_eq!(job.provenance, Some(ProvenanceDef::default()));
    assert_eq!(job.instances[0].driver, Driver::Postgres);
    assert_eq!(job.instances[0].port, Some(5433));
    assert_eq!(job.instances[1].driver, Driver::Sqlite);
    assert_eq!(job.task_count(), 4);
  }

  #[test]
  fn test_bare_queries_get_positional_ids() {
    let job = JobDef::from_json(JOB).unwrap();

    assert_eq!(job.queries[0], QueryDef::new("sessions", "SELECT * FROM sessions"));
    assert_eq!(job.queries[1], QueryDef::new("q2", "SELECT 1 AS one"));
  }

  #[test]
  fn test_defaults() {
    let job = JobDef::from_json(
      r#"{ "instances": [], "queries": ["SELECT 1"] }"#,
    )
    .unwrap();

    assert_eq!(job.max_parallelism, 4);
    assert_eq!(job.merge_order, MergeOrder::Completion);
    assert!(job.task_timeout_ms.is_none());
    assert!(job.provenance.is_none());
    assert!(job.content_key.is_none());
  }

  #[test]
  fn test_negative_parallelism_is_rejected() {
    let result = JobDef::from_json(
      r#"{ "max_parallelism": -1, "instances": [], "queries": [] }"#,
    );
    assert!(matches!(result, Err(ConfigError::Parse(_))));
  }

  #[test]
  fn test_resolve_secrets_from_lookup() {
    let mut job = JobDef::from_json(
      r#"{
        "instances": [
          { "name": "east", "driver": "postgres", "password_env": "EAST_PW", "service_name": "app" }
        ],
        "queries": ["SELECT 1"]
      }"#,
    )
    .unwrap();

    job
      .resolve_secrets(|var| (var == "EAST_PW").then(|| "from-env".to_string()))
      .unwrap();
    assert_eq!(job.instances[0].password.expose(), "from-env");
  }

  #[test]
  fn test_resolve_secrets_missing_variable() {
    let mut job = JobDef::from_json(
      r#"{
        "instances": [
          { "name": "east", "driver": "postgres", "password_env": "NOPE", "service_name": "app" }
        ],
        "queries": ["SELECT 1"]
      }"#,
    )
    .unwrap();

    let err = job.resolve_secrets(|_| None).unwrap_err();
    match err {
      ConfigError::MissingSecret { instance, var } => {
        assert_eq!(instance, "east");
        assert_eq!(var, "NOPE");
      }
      other => panic!("unexpected error: {other}"),
    }
  }
}
