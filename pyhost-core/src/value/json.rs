//! Conversion between [`Value`] and JSON
//!
//! JSON has no native byte string or instant, so the mapping is lossy in one
//! direction: blobs become arrays of numbers and timestamps become RFC 3339
//! strings. Reading JSON back never produces those two variants.

use super::{Map, Value};
use chrono::SecondsFormat;
use serde_json::{Number, Value as Json};

impl Value {
    /// Build a value from parsed JSON.
    ///
    /// Integers that fit in `i64` stay integers, every other number becomes a float.
    pub fn from_json(json: Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from_json).collect()),
            Json::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect::<Map>(),
            ),
        }
    }

    /// Render this value as JSON. Non-finite floats become `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::Number((*n).into()),
            Value::Float(x) => Number::from_f64(*x).map(Json::Number).unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Blob(bytes) => {
                Json::Array(bytes.iter().map(|b| Json::Number((*b).into())).collect())
            }
            Value::Timestamp(t) => Json::String(t.to_rfc3339_opts(SecondsFormat::Micros, true)),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(m) => {
                Json::Object(m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }

    /// Parse a JSON document into a value.
    pub fn parse_json(text: &str) -> serde_json::Result<Value> {
        serde_json::from_str::<Json>(text).map(Value::from_json)
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::from_json(json)
    }
}
