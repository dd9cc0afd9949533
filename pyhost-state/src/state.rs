//! Lock-guarded states handed out to callers

use crate::base::Base;
use crate::error::Result;
use crate::params::BaseParams;
use parking_lot::RwLock;
use pyhost::{Map, Value};
use std::io::{Read, Write};
use std::ops::Deref;

/// A save/loadable Python state.
///
/// Calls, writes and saves share a read lock since they do not replace the
/// Python object; `load` and `terminate` take the write lock.
#[derive(Debug)]
pub struct State {
    base: RwLock<Base>,
}

impl State {
    pub fn new(params: BaseParams, create_params: &Map) -> Result<Self> {
        Ok(Self::from_base(Base::new(params, create_params)?))
    }

    pub fn from_base(base: Base) -> Self {
        Self {
            base: RwLock::new(base),
        }
    }

    /// Current parameters; `load` may change them.
    pub fn params(&self) -> BaseParams {
        self.base.read().params().clone()
    }

    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.base.read().call(method, args)
    }

    pub fn save<W: Write>(&self, w: &mut W, params: &Map) -> Result<()> {
        self.base.read().save(w, params)
    }

    pub fn load<R: Read>(&self, r: &mut R, params: &Map) -> Result<()> {
        self.base.write().load(r, params)
    }

    pub fn terminate(&self) -> Result<()> {
        self.base.write().terminate()
    }

    pub fn is_terminated(&self) -> bool {
        self.base.read().is_terminated()
    }
}

/// A [`State`] that also accepts writes.
#[derive(Debug)]
pub struct WritableState {
    state: State,
}

impl WritableState {
    pub fn new(params: BaseParams, create_params: &Map) -> Result<Self> {
        Ok(Self {
            state: State::new(params, create_params)?,
        })
    }

    pub fn from_base(base: Base) -> Self {
        Self {
            state: State::from_base(base),
        }
    }

    /// Pass `value` to the Python write method.
    pub fn write(&self, value: &Value) -> Result<()> {
        self.state.base.read().write(value)
    }
}

impl Deref for WritableState {
    type Target = State;

    fn deref(&self) -> &State {
        &self.state
    }
}

/// A state as created by a [`Creator`](crate::Creator): writable exactly when
/// its parameters name a write method.
#[derive(Debug)]
pub enum PyState {
    ReadOnly(State),
    Writable(WritableState),
}

impl PyState {
    pub fn from_base(base: Base) -> Self {
        if base.params().is_writable() {
            PyState::Writable(WritableState::from_base(base))
        } else {
            PyState::ReadOnly(State::from_base(base))
        }
    }

    pub fn as_writable(&self) -> Option<&WritableState> {
        match self {
            PyState::Writable(state) => Some(state),
            PyState::ReadOnly(_) => None,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.as_writable().is_some()
    }
}

impl Deref for PyState {
    type Target = State;

    fn deref(&self) -> &State {
        match self {
            PyState::ReadOnly(state) => state,
            PyState::Writable(writable) => &writable.state,
        }
    }
}
