use crate::error::{Error, Result};
use crate::exception;
use crate::func::{self, Function};
use crate::instance::Instance;
use crate::object::{JobRef, Object, PyRef};
use crate::runtime;
use libc::c_char;
use pyhost_core::{Map, Value};
use pyhost_mainthread::{Gil, MainThreadError};
use pyo3::ffi;
use std::fmt;
use tracing::debug;

/// An imported module.
pub struct Module {
    name: String,
    object: Object,
}

/// Import module `name`, which has to be reachable from `sys.path`.
///
/// See [`append_sys_path`](crate::append_sys_path) to extend the search path.
pub fn load_module(name: &str) -> Result<Module> {
    let module = name.to_string();
    let object = runtime::run(name, move |gil| {
        import(gil, &module)
            .map(PyRef::unbind)
            .map_err(|e| e.context("load", "module", module.as_str()))
    })?;
    debug!(module = name, "loaded python module");
    Ok(Module {
        name: name.to_string(),
        object,
    })
}

fn import<'py>(gil: Gil<'py>, name: &str) -> Result<PyRef<'py>> {
    unsafe {
        let name = PyRef::from_owned_ptr_or_err(
            gil,
            ffi::PyUnicode_FromStringAndSize(
                name.as_ptr() as *const c_char,
                name.len() as ffi::Py_ssize_t,
            ),
        )?;
        let module = ffi::PyImport_Import(name.as_ptr());
        PyRef::from_owned_ptr(gil, module).ok_or_else(|| exception::fetch(gil).into())
    }
}

impl Module {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    /// Construct `class(*args, **kwargs)` from this module.
    ///
    /// ```python
    /// class Sample(object):
    ///     def __init__(self, a, b=5, **c):
    ///         ...
    /// ```
    ///
    /// With `kwargs` holding `a`, `hoge` this is `Sample(a=..., hoge=...)`;
    /// `b` keeps its default and `c` receives `hoge`.
    pub fn new_instance(
        &self,
        class: &str,
        args: &[Value],
        kwargs: Option<&Map>,
    ) -> Result<Instance> {
        let target = self.target()?;
        let owned = class.to_string();
        let args = args.to_vec();
        let kwargs = kwargs.cloned();
        let object = runtime::run(class, move |gil| {
            let module = unsafe { target.bind(gil) };
            let class = module
                .getattr(&owned)
                .map_err(|e| Error::from(e).context("get", "class", owned.as_str()))?;
            let instance = func::call_object(
                class.borrow(),
                "create",
                "instance",
                &owned,
                &args,
                kwargs.as_ref(),
            )?;
            Ok(instance.unbind())
        })?;
        Ok(Instance::from_object(self.origin(class), object))
    }

    /// The class object `name` itself, for calling static and class methods.
    pub fn get_class(&self, name: &str) -> Result<Instance> {
        let target = self.target()?;
        let owned = name.to_string();
        let object = runtime::run(name, move |gil| {
            let module = unsafe { target.bind(gil) };
            module
                .getattr(&owned)
                .map(PyRef::unbind)
                .map_err(|e| Error::from(e).context("get", "class", owned.as_str()))
        })?;
        Ok(Instance::from_object(self.origin(name), object))
    }

    /// Module level function `name`.
    pub fn get_function(&self, name: &str) -> Result<Function> {
        let target = self.target()?;
        let owned = name.to_string();
        runtime::run(name, move |gil| {
            let module = unsafe { target.bind(gil) };
            let attr = module
                .getattr(&owned)
                .map_err(|e| Error::from(e).context("get", "function", owned.as_str()))?;
            Function::bind(&owned, attr)
        })
    }

    /// Call module level function `name`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.invoke(name, args, None)
    }

    pub fn call_with_kwargs(&self, name: &str, args: &[Value], kwargs: &Map) -> Result<Value> {
        self.invoke(name, args, Some(kwargs))
    }

    fn invoke(&self, name: &str, args: &[Value], kwargs: Option<&Map>) -> Result<Value> {
        let target = self.target()?;
        let owned = name.to_string();
        let args = args.to_vec();
        let kwargs = kwargs.cloned();
        runtime::run(name, move |gil| {
            let module = unsafe { target.bind(gil) };
            let result = func::invoke_attr(module, "function", &owned, &args, kwargs.as_ref())?;
            func::to_value(result, &owned)
        })
    }

    // Every job using the returned address is run with `exec_sync` while `self`
    // is borrowed.
    fn target(&self) -> Result<JobRef> {
        self.object
            .job_ref()
            .ok_or_else(|| Error::Released(self.name.clone()))
    }

    fn origin(&self, class: &str) -> String {
        format!("{}.{}", self.name, class)
    }

    pub fn release(&mut self) -> std::result::Result<(), MainThreadError> {
        self.object.release()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("object", &self.object)
            .finish()
    }
}

#[cfg(test)]
#[path = "module_tests.rs"]
mod tests;
