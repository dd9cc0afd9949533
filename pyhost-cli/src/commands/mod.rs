//! Command implementations

pub mod call;
pub mod eval;
pub mod invoke;

use anyhow::Result;
use pyhost_core::Value;

/// Print a call result as a single line of JSON.
pub(crate) fn print_value(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string(&value.to_json())?);
    Ok(())
}
