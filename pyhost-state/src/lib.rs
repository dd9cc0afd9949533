//! Shared states backed by Python objects
//!
//! A state wraps an instance of a Python class. Two kinds exist:
//!
//! - [`PyState`]: the class knows how to create, save and load itself; states
//!   serialize to any [`Write`](std::io::Write) in the format described in
//!   [`base`].
//! - [`MlState`]: a model fed with rows in batches, see [`ml`].
//!
//! States are built by a [`StateCreator`], optionally looked up by type name in
//! a [`CreatorRegistry`], and can be kept by name in [`SharedStates`].

pub mod base;
mod creator;
pub mod error;
pub mod ml;
pub mod params;
mod shared;
mod state;

pub use base::{Base, SavedHeader, FORMAT_VERSION};
pub use creator::{Creator, CreatorRegistry, MlCreator, ML_STATE, PY_STATE};
pub use error::{Result, StateError};
pub use ml::{MlParams, MlState};
pub use params::BaseParams;
pub use shared::{SharedState, SharedStates, StateCreator};
pub use state::{PyState, State, WritableState};
