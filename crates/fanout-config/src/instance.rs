//! Database instance descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::Driver;

/// A credential that never shows up in logs or debug output.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  /// The raw secret value, for handing to a driver.
  pub fn expose(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Debug for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Secret(***)")
  }
}

/// One reachable database endpoint with its own credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceDescriptor {
  /// Name used to label results from this instance, e.g. "east-1"
  pub name: String,
  pub driver: Driver,
  #[serde(default)]
  pub username: String,
  #[serde(default, skip_serializing)]
  pub password: Secret,
  /// Environment variable to read the password from instead of `password`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password_env: Option<String>,
  #[serde(default)]
  pub host: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub port: Option<u16>,
  /// Logical database or service name. For SQLite, the database file path.
  pub service_name: String,
}

impl InstanceDescriptor {
  /// Port to connect to, falling back to the driver default.
  pub fn effective_port(&self) -> Option<u16> {
    self.port.or_else(|| self.driver.default_port())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_secret_is_redacted_in_debug() {
    let instance = InstanceDescriptor {
      name: "east".to_string(),
      driver: Driver::Postgres,
      username: "reader".to_string(),
      password: Secret::new("hunter2"),
      password_env: None,
      host: "db-east".to_string(),
      port: None,
      service_name: "app".to_string(),
    };

    let debug = format!("{:?}", instance);
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("Secret(***)"));
  }

  #[test]
  fn test_password_is_not_serialized() {
    let instance: InstanceDescriptor = serde_json::from_value(serde_json::json!({
      "name": "east",
      "driver": "postgres",
      "username": "reader",
      "password": "hunter2",
      "host": "db-east",
      "service_name": "app"
    }))
    .unwrap();

    assert_eq!(instance.password.expose(), "hunter2");
    let json = serde_json::to_string(&instance).unwrap();
    assert!(!json.contains("hunter2"));
  }

  #[test]
  fn test_effective_port_defaults_per_driver() {
    let mut instance: InstanceDescriptor = serde_json::from_value(serde_json::json!({
      "name": "west",
      "driver": "mysql",
      "service_name": "app"
    }))
    .unwrap();
    assert_eq!(instance.effective_port(), Some(3306));

    instance.port = Some(13306);
    assert_eq!(instance.effective_port(), Some(13306));

    instance.driver = Driver::Sqlite;
    instance.port = None;
    assert_eq!(instance.effective_port(), None);
  }
}
