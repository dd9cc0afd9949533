//! Execution broker for the embedded Python interpreter
//!
//! CPython must only be touched from one OS thread at a time, and reference
//! counts are plain integers with no atomicity. This crate owns a dedicated
//! thread that initializes the interpreter and then runs submitted closures one
//! at a time, in submission order. Every other pyhost crate reaches the
//! interpreter exclusively through [`exec`] and [`exec_sync`].
//!
//! Closures receive a [`Gil`] token. The token is `Copy` but not `Send`, so
//! anything that borrows it stays on the owning thread.
//!
//! A job must not block on another job: the queue has a single consumer.
//! [`exec_sync`] detects this case and returns [`MainThreadError::Reentrant`].

mod broker;
mod error;
mod gil;
mod path;

pub use broker::{
    exec, exec_sync, initialize, initialize_with, is_running, stats, terminate, BrokerStats,
    StartupHook,
};
pub use error::{MainThreadError, Result};
pub use gil::{is_main_thread, with_gil, Gil};
pub use path::append_sys_path;

#[doc(hidden)]
pub use path::append_paths;
