//! Call a module level function

use super::print_value;
use crate::args;
use anyhow::{Context, Result};
use tracing::debug;

pub fn call_function(module: &str, function: &str, raw_args: &[String]) -> Result<()> {
    let args = args::parse_values(raw_args)?;
    debug!(module, function, args = args.len(), "calling python function");

    let module_handle = pyhost::load_module(module)?;
    let result = module_handle
        .call(function, &args)
        .with_context(|| format!("{}.{} failed", module, function))?;
    print_value(&result)
}
