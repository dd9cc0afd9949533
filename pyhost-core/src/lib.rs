//! Core types shared by the pyhost crates
//!
//! This crate holds the host-side half of the interpreter boundary: the tagged
//! [`Value`] exchanged with the marshaler and the [`RuntimeConfig`] that drives
//! interpreter startup. Nothing here touches the interpreter itself.

pub mod config;
pub mod value;

pub use config::{ConfigError, InterpreterConfig, RuntimeConfig, StateConfig};
pub use value::{Map, Value, ValueError, ValueResult};
