//! sqlx-backed connector.

use async_trait::async_trait;
use fanout_config::{Driver, InstanceDescriptor};
use fanout_table::{Row, Value};
use sqlx::AnyConnection;
use sqlx::any::AnyRow;
use sqlx::{Column, Connection as _, Row as _, ValueRef};
use tracing::debug;
use url::Url;

use crate::{Connection, Connector, ConnectorError, QueryRows};

/// Connector that opens a single sqlx connection per call.
///
/// No pooling: every task gets a fresh connection that it closes itself.
#[derive(Debug, Clone)]
pub struct SqlxConnector {
  _private: (),
}

impl SqlxConnector {
  pub fn new() -> Self {
    sqlx::any::install_default_drivers();
    Self { _private: () }
  }
}

impl Default for SqlxConnector {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl Connector for SqlxConnector {
  async fn connect(
    &self,
    instance: &InstanceDescriptor,
  ) -> Result<Box<dyn Connection>, ConnectorError> {
    let url = connection_url(instance)?;
    debug!(
      instance = %instance.name,
      driver = instance.driver.scheme(),
      host = %instance.host,
      "opening connection"
    );

    let conn = AnyConnection::connect(&url).await?;
    Ok(Box::new(SqlxConnection { conn }))
  }
}

struct SqlxConnection {
  conn: AnyConnection,
}

#[async_trait]
impl Connection for SqlxConnection {
  async fn query(&mut self, sql: &str) -> Result<QueryRows, ConnectorError> {
    let fetched: Vec<AnyRow> = sqlx::query(sql).fetch_all(&mut self.conn).await?;

    let columns = fetched
      .first()
      .map(|row| {
        row
          .columns()
          .iter()
          .map(|c| c.name().to_string())
          .collect()
      })
      .unwrap_or_default();

    let rows = fetched
      .iter()
      .map(decode_row)
      .collect::<Result<Vec<_>, _>>()?;

    debug!(rows = rows.len(), "query returned");
    Ok(QueryRows { columns, rows })
  }

  async fn close(self: Box<Self>) -> Result<(), ConnectorError> {
    self.conn.close().await?;
    Ok(())
  }
}

/// Build the connection URL for an instance.
///
/// Credentials are percent-encoded. For SQLite the service name is the
/// database file path and the remaining fields are ignored.
pub fn connection_url(instance: &InstanceDescriptor) -> Result<String, ConnectorError> {
  let invalid = |message: &str| ConnectorError::InvalidDescriptor {
    instance: instance.name.clone(),
    message: message.to_string(),
  };

  if instance.service_name.is_empty() {
    return Err(invalid("service name is empty"));
  }

  if instance.driver == Driver::Sqlite {
    return Ok(format!("sqlite://{}", instance.service_name));
  }

  if instance.host.is_empty() {
    return Err(invalid("host is empty"));
  }

  let mut url = Url::parse(&format!("{}://localhost", instance.driver.scheme()))
    .map_err(|e| invalid(&e.to_string()))?;
  url
    .set_host(Some(&instance.host))
    .map_err(|e| invalid(&format!("bad host: {}", e)))?;
  url
    .set_port(instance.effective_port())
    .map_err(|_| invalid("cannot set port"))?;
  if !instance.username.is_empty() {
    url
      .set_username(&instance.username)
      .map_err(|_| invalid("cannot set username"))?;
  }
  if !instance.password.is_empty() {
    url
      .set_password(Some(instance.password.expose()))
      .map_err(|_| invalid("cannot set password"))?;
  }
  url.set_path(&instance.service_name);

  Ok(url.into())
}

fn decode_row(row: &AnyRow) -> Result<Row, ConnectorError> {
  (0..row.columns().len())
    .map(|index| decode_value(row, index))
    .collect()
}

/// Decode one cell by trying the types the `Any` driver can carry.
fn decode_value(row: &AnyRow, index: usize) -> Result<Value, ConnectorError> {
  if row.try_get_raw(index)?.is_null() {
    return Ok(Value::Null);
  }

  if let Ok(v) = row.try_get::<i64, _>(index) {
    return Ok(Value::Int(v));
  }
  if let Ok(v) = row.try_get::<f64, _>(index) {
    return Ok(Value::Float(v));
  }
  if let Ok(v) = row.try_get::<String, _>(index) {
    return Ok(Value::Text(v));
  }
  if let Ok(v) = row.try_get::<bool, _>(index) {
    return Ok(Value::Bool(v));
  }
  if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
    return Ok(Value::Bytes(v));
  }

  Err(ConnectorError::Decode {
    column: row.columns()[index].name().to_string(),
    message: "unsupported column type".to_string(),
  })
}
