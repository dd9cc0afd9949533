//! Send a JSON value through the interpreter and back

use super::print_value;
use anyhow::{Context, Result};
use pyhost_core::Value;

pub fn eval_json(text: &str) -> Result<()> {
    let value = Value::parse_json(text).context("input is not valid JSON")?;
    let copy = pyhost::load_module("copy")?.call("deepcopy", &[value])?;
    print_value(&copy)
}
