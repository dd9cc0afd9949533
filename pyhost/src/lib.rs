//! Call Python from concurrent Rust code
//!
//! pyhost embeds a CPython interpreter and exposes it through a small call
//! layer: import a [`Module`], construct an [`Instance`], call a method and get a
//! [`Value`] back. Callers may be on any thread. Every interpreter access is
//! queued to the single thread that owns the interpreter (see
//! [`pyhost_mainthread`]), and every reference handed out is an [`Object`]
//! whose release is routed back to that thread.
//!
//! ```no_run
//! use pyhost::{load_module, Value};
//!
//! # fn main() -> pyhost::Result<()> {
//! pyhost::append_sys_path(["./scripts"])?;
//! let module = load_module("mymodule")?;
//! let total = module.call("add", &[Value::Int(1), Value::Int(2)])?;
//! assert_eq!(total, Value::Int(3));
//! # Ok(())
//! # }
//! ```
//!
//! Python exceptions come back as [`PyException`]s carrying the formatted
//! traceback, wrapped with the action that failed.

pub mod convert;
pub mod error;
pub mod exception;
mod func;
mod instance;
mod module;
pub mod object;
pub mod registry;
mod runtime;

pub use error::{Error, Result};
pub use exception::{PyError, PyException};
pub use func::Function;
pub use instance::Instance;
pub use module::{load_module, Module};
pub use object::{Borrowed, Object, PyRef};
pub use registry::{FunctionRegistry, PyFunc};
pub use runtime::{append_sys_path, config, initialize, is_initialized, terminate};

pub use pyhost_core::{Map, RuntimeConfig, Value};
pub use pyhost_mainthread::{exec, exec_sync, Gil, MainThreadError};
