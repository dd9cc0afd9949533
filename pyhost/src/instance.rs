use crate::error::{Error, Result};
use crate::func;
use crate::object::{JobRef, Object, PyRef};
use crate::runtime;
use pyhost_core::{Map, Value};
use pyhost_mainthread::MainThreadError;
use std::fmt;

/// A class or class instance living in the interpreter.
///
/// `origin` names where it came from (`module.Class`) and is used in error
/// messages once the handle has been released.
pub struct Instance {
    origin: String,
    object: Object,
}

impl Instance {
    pub fn from_object(origin: impl Into<String>, object: Object) -> Self {
        Instance {
            origin: origin.into(),
            object,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn into_object(self) -> Object {
        self.object
    }

    /// Call `method` with positional arguments and convert its result.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.invoke(method, args, None, func::to_value)
    }

    pub fn call_with_kwargs(&self, method: &str, args: &[Value], kwargs: &Map) -> Result<Value> {
        self.invoke(method, args, Some(kwargs), func::to_value)
    }

    /// Call `method` and return the result unconverted, e.g. when it returns
    /// another instance.
    pub fn call_direct(&self, method: &str, args: &[Value]) -> Result<Object> {
        self.invoke(method, args, None, |result, _| Ok(result.unbind()))
    }

    pub fn call_direct_with_kwargs(
        &self,
        method: &str,
        args: &[Value],
        kwargs: &Map,
    ) -> Result<Object> {
        self.invoke(method, args, Some(kwargs), |result, _| Ok(result.unbind()))
    }

    /// Read attribute `name` as a value.
    pub fn get_attr(&self, name: &str) -> Result<Value> {
        let target = self.target()?;
        let owned = name.to_string();
        runtime::run(name, move |gil| {
            let instance = unsafe { target.bind(gil) };
            let attr = instance
                .getattr(&owned)
                .map_err(|e| Error::from(e).context("get", "attribute", owned.as_str()))?;
            func::to_value(attr, &owned)
        })
    }

    fn invoke<R, F>(
        &self,
        method: &str,
        args: &[Value],
        kwargs: Option<&Map>,
        finish: F,
    ) -> Result<R>
    where
        F: for<'py> FnOnce(PyRef<'py>, &str) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let target = self.target()?;
        let owned = method.to_string();
        let args = args.to_vec();
        let kwargs = kwargs.cloned();
        runtime::run(method, move |gil| {
            let instance = unsafe { target.bind(gil) };
            let result = func::invoke_attr(instance, "method", &owned, &args, kwargs.as_ref())?;
            finish(result, &owned)
        })
    }

    // Jobs using the address run under `exec_sync` while `self` is borrowed.
    fn target(&self) -> Result<JobRef> {
        self.object
            .job_ref()
            .ok_or_else(|| Error::Released(self.origin.clone()))
    }

    pub fn release(&mut self) -> std::result::Result<(), MainThreadError> {
        self.object.release()
    }
}

impl From<Object> for Instance {
    fn from(object: Object) -> Self {
        Instance::from_object("<object>", object)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("origin", &self.origin)
            .field("object", &self.object)
            .finish()
    }
}
