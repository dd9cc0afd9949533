//! Turning command line strings into call arguments

use anyhow::{bail, Context, Result};
use pyhost_core::{Map, Value};

/// Parse each argument as a JSON document.
pub fn parse_values(args: &[String]) -> Result<Vec<Value>> {
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            Value::parse_json(arg)
                .with_context(|| format!("argument {} is not valid JSON: {}", i + 1, arg))
        })
        .collect()
}

/// Parse an optional JSON array, e.g. the `--init` arguments.
pub fn parse_array(text: Option<&str>, what: &str) -> Result<Vec<Value>> {
    let Some(text) = text else {
        return Ok(Vec::new());
    };
    match Value::parse_json(text).with_context(|| format!("{} is not valid JSON", what))? {
        Value::Array(items) => Ok(items),
        other => bail!("{} must be a JSON array, got {}", what, other.type_name()),
    }
}

/// Parse an optional JSON object, e.g. the `--kwargs` map.
pub fn parse_map(text: Option<&str>, what: &str) -> Result<Option<Map>> {
    let Some(text) = text else {
        return Ok(None);
    };
    match Value::parse_json(text).with_context(|| format!("{} is not valid JSON", what))? {
        Value::Map(map) => Ok(Some(map)),
        other => bail!("{} must be a JSON object, got {}", what, other.type_name()),
    }
}

/// Log level for the number of `-v` flags
pub fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
