//! Integration tests for SqlxConnector against temporary SQLite databases.

use std::path::Path;

use fanout_config::{Driver, InstanceDescriptor, Secret};
use fanout_connector::{Connector, ConnectorError, SqlxConnector};
use fanout_table::Value;
use sqlx::Connection as _;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};

async fn create_database(path: &Path) {
  let options = SqliteConnectOptions::new()
    .filename(path)
    .create_if_missing(true);
  let mut conn = SqliteConnection::connect_with(&options)
    .await
    .expect("failed to create database");

  sqlx::query(
    "CREATE TABLE sessions (id INTEGER, username TEXT, load REAL, token BLOB, note TEXT)",
  )
  .execute(&mut conn)
  .await
  .expect("failed to create table");

  sqlx::query(
    "INSERT INTO sessions VALUES (1, 'alice', 0.5, x'cafe', NULL), (2, 'bob', 1.25, x'00', 'idle')",
  )
  .execute(&mut conn)
  .await
  .expect("failed to insert rows");

  conn.close().await.expect("failed to close setup connection");
}

fn sqlite_instance(name: &str, path: &Path) -> InstanceDescriptor {
  InstanceDescriptor {
    name: name.to_string(),
    driver: Driver::Sqlite,
    username: String::new(),
    password: Secret::default(),
    password_env: None,
    host: String::new(),
    port: None,
    service_name: path.display().to_string(),
  }
}

#[tokio::test]
async fn test_query_decodes_columns_and_values() {
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let path = dir.path().join("east.db");
  create_database(&path).await;

  let connector = SqlxConnector::new();
  let mut conn = connector
    .connect(&sqlite_instance("east", &path))
    .await
    .expect("failed to connect");

  let result = conn
    .query("SELECT id, username, load, token, note FROM sessions ORDER BY id")
    .await
    .expect("query failed");
  conn.close().await.expect("failed to close");

  assert_eq!(result.columns, ["id", "username", "load", "token", "note"]);
  assert_eq!(result.rows.len(), 2);
  assert_eq!(
    result.rows[0],
    vec![
      Value::Int(1),
      Value::from("alice"),
      Value::Float(0.5),
      Value::Bytes(vec![0xca, 0xfe]),
      Value::Null,
    ]
  );
  assert_eq!(result.rows[1][4], Value::from("idle"));
}

#[tokio::test]
async fn test_empty_result() {
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let path = dir.path().join("east.db");
  create_database(&path).await;

  let connector = SqlxConnector::new();
  let mut conn = connector
    .connect(&sqlite_instance("east", &path))
    .await
    .expect("failed to connect");

  let result = conn
    .query("SELECT id FROM sessions WHERE id > 100")
    .await
    .expect("query failed");
  conn.close().await.expect("failed to close");

  assert!(result.rows.is_empty());
  assert!(result.columns.is_empty());
}

#[tokio::test]
async fn test_bad_sql_is_a_database_error() {
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let path = dir.path().join("east.db");
  create_database(&path).await;

  let connector = SqlxConnector::new();
  let mut conn = connector
    .connect(&sqlite_instance("east", &path))
    .await
    .expect("failed to connect");

  let result = conn.query("SELECT * FROM no_such_table").await;
  conn.close().await.expect("failed to close");

  assert!(matches!(result, Err(ConnectorError::Database(_))));
}

#[tokio::test]
async fn test_missing_database_fails_to_connect() {
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let path = dir.path().join("missing.db");

  let connector = SqlxConnector::new();
  let result = connector.connect(&sqlite_instance("ghost", &path)).await;

  assert!(matches!(result, Err(ConnectorError::Database(_))));
}
