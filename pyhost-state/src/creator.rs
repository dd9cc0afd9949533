//! Creating and restoring states by type name

use crate::base::Base;
use crate::error::{Result, StateError};
use crate::ml::{MlParams, MlState, MODEL_FILE_PATH};
use crate::params::BaseParams;
use crate::shared::{SharedState, StateCreator};
use crate::state::PyState;
use parking_lot::RwLock;
use pyhost::Map;
use rustc_hash::FxHashMap;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

/// Type name [`CreatorRegistry::builtin`] registers [`Creator`] under
pub const PY_STATE: &str = "pystate";
/// Type name [`CreatorRegistry::builtin`] registers [`MlCreator`] under
pub const ML_STATE: &str = "pymlstate";

/// Builds [`PyState`]s.
///
/// Without defaults the class is named by the `module_name`, `class_name`,
/// `module_path` and `write_method` entries of the parameters, and the rest of
/// the parameters go to `create`. With defaults all parameters go to `create`.
#[derive(Debug, Clone, Default)]
pub struct Creator {
    defaults: Option<BaseParams>,
}

impl Creator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A creator that always builds states of the class named by `params`.
    pub fn with_defaults(params: BaseParams) -> Self {
        Self {
            defaults: Some(params),
        }
    }

    pub fn defaults(&self) -> Option<&BaseParams> {
        self.defaults.as_ref()
    }

    pub fn create_state(&self, params: &Map) -> Result<PyState> {
        let (base_params, create_params) = match &self.defaults {
            Some(defaults) => (defaults.clone(), params.clone()),
            None => {
                let mut rest = params.clone();
                let base_params = BaseParams::extract(&mut rest, true)?;
                (base_params, rest)
            }
        };
        debug!(
            module = %base_params.module_name,
            class = %base_params.class_name,
            "creating python state"
        );
        Ok(PyState::from_base(Base::new(base_params, &create_params)?))
    }

    /// Restore a saved state. The saved header decides the class.
    pub fn load_state<R: Read>(&self, r: &mut R, params: &Map) -> Result<PyState> {
        Ok(PyState::from_base(Base::from_reader(r, params)?))
    }
}

impl StateCreator for Creator {
    fn create(&self, params: &Map) -> Result<SharedState> {
        Ok(self.create_state(params)?.into())
    }

    fn load(&self, mut r: &mut dyn Read, params: &Map) -> Result<SharedState> {
        Ok(self.load_state(&mut r, params)?.into())
    }
}

/// Builds [`MlState`]s from `module_path`, `module_name`, `class_name`,
/// `batch_train_size`, `model_file_path` and `gpu_id` parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct MlCreator;

impl MlCreator {
    pub fn create_state(&self, params: &Map) -> Result<MlState> {
        MlState::new(MlParams::extract(params)?)
    }

    /// Create the model, then pass the saved blob in `r` to its `load`.
    ///
    /// `model_file_path` is required here.
    pub fn load_state<R: Read>(&self, r: &mut R, params: &Map) -> Result<MlState> {
        if !params.contains_key(MODEL_FILE_PATH) {
            return Err(StateError::MissingParam(MODEL_FILE_PATH));
        }
        let state = self.create_state(params)?;
        state.load(r, params)?;
        Ok(state)
    }
}

impl StateCreator for MlCreator {
    fn create(&self, params: &Map) -> Result<SharedState> {
        Ok(self.create_state(params)?.into())
    }

    fn load(&self, mut r: &mut dyn Read, params: &Map) -> Result<SharedState> {
        Ok(self.load_state(&mut r, params)?.into())
    }
}

/// Creators by state type name
#[derive(Default)]
pub struct CreatorRegistry {
    creators: RwLock<FxHashMap<String, Arc<dyn StateCreator>>>,
}

impl CreatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding [`Creator`] as `pystate` and [`MlCreator`] as
    /// `pymlstate`.
    pub fn builtin() -> Self {
        let mut creators: FxHashMap<String, Arc<dyn StateCreator>> = FxHashMap::default();
        creators.insert(PY_STATE.to_string(), Arc::new(Creator::new()));
        creators.insert(ML_STATE.to_string(), Arc::new(MlCreator));
        Self {
            creators: RwLock::new(creators),
        }
    }

    pub fn register<C>(&self, type_name: &str, creator: C) -> Result<()>
    where
        C: StateCreator + 'static,
    {
        let mut creators = self.creators.write();
        if creators.contains_key(type_name) {
            return Err(StateError::AlreadyRegistered(type_name.to_string()));
        }
        creators.insert(type_name.to_string(), Arc::new(creator));
        Ok(())
    }

    /// Register a creator bound to one class.
    pub fn register_class(
        &self,
        type_name: &str,
        module_path: &str,
        module_name: &str,
        class_name: &str,
        write_method: &str,
    ) -> Result<()> {
        let params = BaseParams::new(module_name, class_name)
            .with_module_path(module_path)
            .with_write_method(write_method);
        self.register(type_name, Creator::with_defaults(params))
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn StateCreator>> {
        self.creators.read().get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.creators.read().contains_key(type_name)
    }

    fn lookup(&self, type_name: &str) -> Result<Arc<dyn StateCreator>> {
        self.get(type_name)
            .ok_or_else(|| StateError::NotRegistered(type_name.to_string()))
    }

    pub fn create(&self, type_name: &str, params: &Map) -> Result<SharedState> {
        self.lookup(type_name)?.create(params)
    }

    pub fn load<R: Read>(
        &self,
        type_name: &str,
        r: &mut R,
        params: &Map,
    ) -> Result<SharedState> {
        self.lookup(type_name)?.load(r, params)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.creators.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn unregister(&self, type_name: &str) -> Result<Arc<dyn StateCreator>> {
        self.creators
            .write()
            .remove(type_name)
            .ok_or_else(|| StateError::NotRegistered(type_name.to_string()))
    }
}

#[cfg(test)]
#[path = "creator_tests.rs"]
mod tests;
