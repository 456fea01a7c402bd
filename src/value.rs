//! SQL value type - tagged union over the storage classes a row cell can hold
//!
//! Every cell read from a cursor or bound to a statement parameter passes
//! through [`Value`]. Coercion helpers never fail: absent or unparseable
//! data degrades to a zero/empty value, mirroring the safe-default policy
//! used for column-type normalization.

use crate::coltype::ColumnType;

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// True if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce to a 64-bit integer. NULL is 0, reals truncate, text is
    /// parsed (falling back to 0), blobs are 0.
    pub fn as_i64(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Integer(v) => *v,
            Value::Real(v) => *v as i64,
            Value::Text(s) => s.trim().parse().unwrap_or(0),
            Value::Blob(_) => 0,
        }
    }

    /// Coerce to a 64-bit float. Same degradation rules as [`Value::as_i64`].
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Integer(v) => *v as f64,
            Value::Real(v) => *v,
            Value::Text(s) => s.trim().parse().unwrap_or(0.0),
            Value::Blob(_) => 0.0,
        }
    }

    /// Render as text. NULL renders as the empty string.
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(v) => v.to_string(),
            Value::Real(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    /// Coerce this value to the representation a declared column type
    /// expects. NULL stays NULL; blob columns keep only blob payloads.
    pub fn coerce(&self, col_type: ColumnType) -> Value {
        if self.is_null() {
            return Value::Null;
        }
        match col_type {
            ColumnType::Integer | ColumnType::Long | ColumnType::Short => {
                Value::Integer(self.as_i64())
            }
            ColumnType::Float | ColumnType::Double => Value::Real(self.as_f64()),
            ColumnType::String | ColumnType::Varchar => Value::Text(self.as_text()),
            ColumnType::Blob => match self {
                Value::Blob(b) => Value::Blob(b.clone()),
                _ => Value::Null,
            },
        }
    }

    /// Convert a parsed JSON value into a [`Value`]. Nested arrays and
    /// objects are carried as their JSON text.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Integer(*b as i64),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Real(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
        }
    }
}
