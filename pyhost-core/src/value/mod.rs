//! Tagged values exchanged with the embedded interpreter

pub mod error;
pub mod json;

pub use error::{ValueError, ValueResult};

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use std::fmt;

/// String-keyed map of values. Iteration order is unspecified.
pub type Map = FxHashMap<String, Value>;

/// Host-side representation of an interpreter value.
///
/// The variant set is closed: anything the interpreter produces outside of it is
/// reported as an unsupported type by the marshaler instead of being approximated.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absence of a value (`None`)
    #[default]
    Null,

    /// Boolean
    Bool(bool),

    /// Signed 64-bit integer
    Int(i64),

    /// Double precision float
    Float(f64),

    /// UTF-8 string
    String(String),

    /// Raw bytes
    Blob(Vec<u8>),

    /// Instant in UTC. Precision on the interpreter side is microseconds.
    Timestamp(DateTime<Utc>),

    /// Ordered sequence
    Array(Vec<Value>),

    /// String-keyed map
    Map(Map),
}

impl Value {
    /// Type checking predicates
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, Value::Blob(_))
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, Value::Timestamp(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Type conversion helpers
    pub fn as_bool(&self) -> ValueResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.type_error("bool")),
        }
    }

    pub fn as_int(&self) -> ValueResult<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            _ => Err(self.type_error("int")),
        }
    }

    /// Returns the value as a float, widening integers.
    pub fn as_float(&self) -> ValueResult<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            _ => Err(self.type_error("float")),
        }
    }

    pub fn as_str(&self) -> ValueResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.type_error("string")),
        }
    }

    pub fn as_blob(&self) -> ValueResult<&[u8]> {
        match self {
            Value::Blob(b) => Ok(b),
            _ => Err(self.type_error("blob")),
        }
    }

    pub fn as_timestamp(&self) -> ValueResult<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Ok(*t),
            _ => Err(self.type_error("timestamp")),
        }
    }

    pub fn as_array(&self) -> ValueResult<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            _ => Err(self.type_error("array")),
        }
    }

    pub fn as_map(&self) -> ValueResult<&Map> {
        match self {
            Value::Map(m) => Ok(m),
            _ => Err(self.type_error("map")),
        }
    }

    pub fn as_map_mut(&mut self) -> ValueResult<&mut Map> {
        match self {
            Value::Map(m) => Ok(m),
            other => Err(other.type_error("map")),
        }
    }

    pub fn into_array(self) -> ValueResult<Vec<Value>> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.type_error("array")),
        }
    }

    pub fn into_map(self) -> ValueResult<Map> {
        match self {
            Value::Map(m) => Ok(m),
            other => Err(other.type_error("map")),
        }
    }

    /// Look up a key when the value is a map.
    pub fn get(&self, key: &str) -> ValueResult<&Value> {
        self.as_map()?
            .get(key)
            .ok_or_else(|| ValueError::KeyNotFound(key.to_string()))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Blob(_) => "blob",
            Value::Timestamp(_) => "timestamp",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }

    fn type_error(&self, expected: &'static str) -> ValueError {
        ValueError::TypeError {
            expected,
            actual: self.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                let mut keys: Vec<&String> = m.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, m[key])?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
