//! Construct an instance and call one of its methods

use super::print_value;
use crate::args;
use anyhow::{Context, Result};
use tracing::debug;

/// What to construct and call
#[derive(Debug)]
pub struct InvokeOptions<'a> {
    pub module: &'a str,
    pub class: &'a str,
    pub method: &'a str,
    pub init: Option<&'a str>,
    pub kwargs: Option<&'a str>,
    pub args: &'a [String],
}

pub fn invoke_method(options: InvokeOptions<'_>) -> Result<()> {
    let init = args::parse_array(options.init, "--init")?;
    let kwargs = args::parse_map(options.kwargs, "--kwargs")?;
    let args = args::parse_values(options.args)?;

    let module = pyhost::load_module(options.module)?;
    let instance = module
        .new_instance(options.class, &init, None)
        .with_context(|| format!("cannot construct {}.{}", options.module, options.class))?;
    debug!(origin = instance.origin(), method = options.method, "invoking method");

    let result = match &kwargs {
        Some(kwargs) => instance.call_with_kwargs(options.method, &args, kwargs),
        None => instance.call(options.method, &args),
    }
    .with_context(|| format!("{}.{} failed", instance.origin(), options.method))?;
    print_value(&result)
}
