use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
  Bytes(Vec<u8>),
}

impl Value {
  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  /// Total order used for sorting: nulls first, then by variant, then by value.
  /// Integers and floats compare numerically with each other.
  pub fn total_cmp(&self, other: &Value) -> Ordering {
    match (self, other) {
      (Value::Null, Value::Null) => Ordering::Equal,
      (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
      (Value::Int(a), Value::Int(b)) => a.cmp(b),
      (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
      (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
      (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
      (Value::Text(a), Value::Text(b)) => a.cmp(b),
      (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
      _ => self.rank().cmp(&other.rank()),
    }
  }

  fn rank(&self) -> u8 {
    match self {
      Value::Null => 0,
      Value::Bool(_) => 1,
      Value::Int(_) | Value::Float(_) => 2,
      Value::Text(_) => 3,
      Value::Bytes(_) => 4,
    }
  }

  pub(crate) fn to_json(&self) -> serde_json::Value {
    match self {
      Value::Null => serde_json::Value::Null,
      Value::Bool(b) => serde_json::Value::Bool(*b),
      Value::Int(i) => serde_json::Value::from(*i),
      Value::Float(f) => serde_json::Number::from_f64(*f)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null),
      Value::Text(s) => serde_json::Value::String(s.clone()),
      Value::Bytes(_) => serde_json::Value::String(self.to_string()),
    }
  }
}

/// Text rendering used for CSV cells. Nulls render empty, bytes as `\x` hex.
impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => Ok(()),
      Value::Bool(b) => write!(f, "{}", b),
      Value::Int(i) => write!(f, "{}", i),
      Value::Float(x) => write!(f, "{}", x),
      Value::Text(s) => f.write_str(s),
      Value::Bytes(bytes) => {
        f.write_str("\\x")?;
        for byte in bytes {
          write!(f, "{:02x}", byte)?;
        }
        Ok(())
      }
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Text(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Text(s)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Int(i)
  }
}

impl From<f64> for Value {
  fn from(x: f64) -> Self {
    Value::Float(x)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self {
    v.map(Into::into).unwrap_or(Value::Null)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display() {
    assert_eq!(Value::Null.to_string(), "");
    assert_eq!(Value::Int(-3).to_string(), "-3");
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "\\xdead");
  }

  #[test]
  fn test_total_cmp_mixes_numbers() {
    assert_eq!(Value::Int(2).total_cmp(&Value::Float(2.5)), Ordering::Less);
    assert_eq!(Value::Float(3.0).total_cmp(&Value::Int(3)), Ordering::Equal);
    assert_eq!(Value::Null.total_cmp(&Value::Int(0)), Ordering::Less);
    assert_eq!(Value::from("b").total_cmp(&Value::from("a")), Ordering::Greater);
  }

  #[test]
  fn test_from_option() {
    assert_eq!(Value::from(None::<i64>), Value::Null);
    assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
  }
}
