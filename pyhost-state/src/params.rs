//! Parameters naming the Python class behind a state

use crate::error::{Result, StateError};
use pyhost_core::{Map, Value};
use serde::{Deserialize, Serialize};

pub const MODULE_PATH: &str = "module_path";
pub const MODULE_NAME: &str = "module_name";
pub const CLASS_NAME: &str = "class_name";
pub const WRITE_METHOD: &str = "write_method";

/// Where the state class lives and how it is written to.
///
/// An empty `module_path` leaves `sys.path` alone; an empty `write_method`
/// makes the state read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseParams {
    pub module_path: String,
    pub module_name: String,
    pub class_name: String,
    pub write_method: String,
}

impl BaseParams {
    pub fn new(module_name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn with_module_path(mut self, path: impl Into<String>) -> Self {
        self.module_path = path.into();
        self
    }

    pub fn with_write_method(mut self, method: impl Into<String>) -> Self {
        self.write_method = method.into();
        self
    }

    /// Read the parameters out of `params`.
    ///
    /// `module_name` and `class_name` are required; `module_path` and
    /// `write_method` default to empty. With `remove` set the recognized keys
    /// are taken out of `params`, so that what is left can go to the class.
    pub fn extract(params: &mut Map, remove: bool) -> Result<Self> {
        let module_name = required(params, MODULE_NAME)?;
        let class_name = required(params, CLASS_NAME)?;
        let module_path = optional(params, MODULE_PATH)?;
        let write_method = optional(params, WRITE_METHOD)?;

        if remove {
            for key in [MODULE_PATH, MODULE_NAME, CLASS_NAME, WRITE_METHOD] {
                params.remove(key);
            }
        }
        Ok(Self {
            module_path,
            module_name,
            class_name,
            write_method,
        })
    }

    pub fn is_writable(&self) -> bool {
        !self.write_method.is_empty()
    }
}

pub(crate) fn required(params: &Map, key: &'static str) -> Result<String> {
    match params.get(key) {
        Some(value) => as_string(key, value),
        None => Err(StateError::MissingParam(key)),
    }
}

pub(crate) fn optional(params: &Map, key: &'static str) -> Result<String> {
    params
        .get(key)
        .map_or_else(|| Ok(String::new()), |value| as_string(key, value))
}

fn as_string(key: &'static str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(StateError::InvalidParam {
            key,
            expected: "a string",
            actual: other.type_name(),
        }),
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
