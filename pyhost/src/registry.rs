//! Named Python functions callable by name

use crate::error::{Error, Result};
use crate::module::{load_module, Module};
use crate::runtime;
use parking_lot::{Mutex, RwLock};
use pyhost_core::Value;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A module level Python function bound to a name.
///
/// The module is imported on first use and kept for later calls. Calls to one
/// `PyFunc` are serialized.
pub struct PyFunc {
    name: String,
    module_path: String,
    module_name: String,
    func_name: String,
    module: Mutex<Option<Module>>,
}

impl PyFunc {
    pub fn new(
        name: impl Into<String>,
        module_path: impl Into<String>,
        module_name: impl Into<String>,
        func_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            module_path: module_path.into(),
            module_name: module_name.into(),
            func_name: func_name.into(),
            module: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn func_name(&self) -> &str {
        &self.func_name
    }

    /// Import the module now instead of on the first call.
    pub fn load(&self) -> Result<()> {
        self.loaded(&mut self.module.lock()).map(|_| ())
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        let mut slot = self.module.lock();
        self.loaded(&mut slot)?.call(&self.func_name, args)
    }

    fn loaded<'a>(&self, slot: &'a mut Option<Module>) -> Result<&'a Module> {
        let module = match slot.take() {
            Some(module) => module,
            None => self.import()?,
        };
        Ok(slot.insert(module))
    }

    fn import(&self) -> Result<Module> {
        if !self.module_path.is_empty() {
            runtime::append_sys_path([&self.module_path])?;
        }
        debug!(
            function = %self.name,
            module = %self.module_name,
            "importing module for python function"
        );
        load_module(&self.module_name)
    }
}

impl fmt::Debug for PyFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PyFunc")
            .field("name", &self.name)
            .field("module_path", &self.module_path)
            .field("module_name", &self.module_name)
            .field("func_name", &self.func_name)
            .finish()
    }
}

/// Registry of [`PyFunc`]s by name
#[derive(Default)]
pub struct FunctionRegistry {
    functions: RwLock<FxHashMap<String, Arc<PyFunc>>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function. Fails if the name is taken.
    pub fn register(&self, func: PyFunc) -> Result<()> {
        let mut functions = self.functions.write();
        if functions.contains_key(func.name()) {
            return Err(Error::AlreadyRegistered(func.name().to_string()));
        }
        functions.insert(func.name().to_string(), Arc::new(func));
        Ok(())
    }

    /// Register `module_name.func_name` under `name`, importing the module
    /// right away so that a bad path or module fails here.
    pub fn register_py_func(
        &self,
        name: &str,
        module_path: &str,
        module_name: &str,
        func_name: &str,
    ) -> Result<()> {
        if self.contains(name) {
            return Err(Error::AlreadyRegistered(name.to_string()));
        }
        let func = PyFunc::new(name, module_path, module_name, func_name);
        func.load()?;
        self.register(func)
    }

    pub fn get(&self, name: &str) -> Option<Arc<PyFunc>> {
        self.functions.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }

    /// Call the function registered as `name`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let func = self
            .get(name)
            .ok_or_else(|| Error::NotRegistered(name.to_string()))?;
        func.call(args)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn unregister(&self, name: &str) -> Result<Arc<PyFunc>> {
        self.functions
            .write()
            .remove(name)
            .ok_or_else(|| Error::NotRegistered(name.to_string()))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
