//! States of either kind, and a store of them by name

use crate::error::{Result, StateError};
use crate::ml::MlState;
use crate::state::PyState;
use parking_lot::RwLock;
use pyhost::{Map, Value};
use rustc_hash::FxHashMap;
use std::io::{Read, Write};
use std::sync::Arc;

/// Something that builds states from parameters, e.g. [`Creator`](crate::Creator).
pub trait StateCreator: Send + Sync {
    fn create(&self, params: &Map) -> Result<SharedState>;

    /// Restore a state written by [`SharedState::save`].
    fn load(&self, r: &mut dyn Read, params: &Map) -> Result<SharedState>;
}

/// A state built by a [`StateCreator`]
#[derive(Debug)]
pub enum SharedState {
    Py(PyState),
    Ml(MlState),
}

impl SharedState {
    pub fn as_py(&self) -> Option<&PyState> {
        match self {
            SharedState::Py(state) => Some(state),
            SharedState::Ml(_) => None,
        }
    }

    pub fn as_ml(&self) -> Option<&MlState> {
        match self {
            SharedState::Ml(state) => Some(state),
            SharedState::Py(_) => None,
        }
    }

    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        match self {
            SharedState::Py(state) => state.call(method, args),
            SharedState::Ml(state) => state.call(method, args),
        }
    }

    /// Write `value`. Read-only Python states refuse writes.
    pub fn write(&self, value: &Value) -> Result<()> {
        match self {
            SharedState::Py(state) => state
                .as_writable()
                .ok_or(StateError::NotWritable)?
                .write(value),
            SharedState::Ml(state) => state.write(value).map(|_| ()),
        }
    }

    pub fn save<W: Write>(&self, w: &mut W, params: &Map) -> Result<()> {
        match self {
            SharedState::Py(state) => state.save(w, params),
            SharedState::Ml(state) => state.save(w, params),
        }
    }

    pub fn load<R: Read>(&self, r: &mut R, params: &Map) -> Result<()> {
        match self {
            SharedState::Py(state) => state.load(r, params),
            SharedState::Ml(state) => state.load(r, params),
        }
    }

    pub fn terminate(&self) -> Result<()> {
        match self {
            SharedState::Py(state) => state.terminate(),
            SharedState::Ml(state) => state.terminate(),
        }
    }

    pub fn is_terminated(&self) -> bool {
        match self {
            SharedState::Py(state) => state.is_terminated(),
            SharedState::Ml(state) => state.is_terminated(),
        }
    }
}

impl From<PyState> for SharedState {
    fn from(state: PyState) -> Self {
        SharedState::Py(state)
    }
}

impl From<MlState> for SharedState {
    fn from(state: MlState) -> Self {
        SharedState::Ml(state)
    }
}

/// Live states by name
#[derive(Default)]
pub struct SharedStates {
    states: RwLock<FxHashMap<String, Arc<SharedState>>>,
}

impl SharedStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, name: &str, state: SharedState) -> Result<Arc<SharedState>> {
        let mut states = self.states.write();
        if states.contains_key(name) {
            return Err(StateError::StateExists(name.to_string()));
        }
        let state = Arc::new(state);
        states.insert(name.to_string(), Arc::clone(&state));
        Ok(state)
    }

    pub fn get(&self, name: &str) -> Result<Arc<SharedState>> {
        self.states
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StateError::StateNotFound(name.to_string()))
    }

    /// Remove `name` from the store. The state itself is not terminated.
    pub fn remove(&self, name: &str) -> Result<Arc<SharedState>> {
        self.states
            .write()
            .remove(name)
            .ok_or_else(|| StateError::StateNotFound(name.to_string()))
    }

    /// Names of the stored states, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.states.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Fit the ML state `name` with `rows` right away.
    pub fn ml_fit(&self, name: &str, rows: &[Map]) -> Result<Value> {
        let state = self.get(name)?;
        ml_state(&state, name)?.fit_maps(rows)
    }

    /// Ask the ML state `name` for a prediction.
    pub fn ml_predict(&self, name: &str, value: &Value) -> Result<Value> {
        let state = self.get(name)?;
        ml_state(&state, name)?.predict(value)
    }
}

fn ml_state<'a>(state: &'a SharedState, name: &str) -> Result<&'a MlState> {
    state
        .as_ml()
        .ok_or_else(|| StateError::NotMlState(name.to_string()))
}

#[cfg(test)]
#[path = "shared_tests.rs"]
mod tests;
