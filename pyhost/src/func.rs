//! Callable objects and the call helpers shared by modules and instances

use crate::convert::{args_tuple, from_py, kwargs_dict};
use crate::error::{Error, Result};
use crate::object::{Borrowed, Object, PyRef};
use crate::runtime;
use pyhost_core::{Map, Value};
use pyhost_mainthread::MainThreadError;
use std::fmt;

/// A callable interpreter object, e.g. a module level function.
///
/// Constructed only from objects that passed `callable()`.
pub struct Function {
    name: String,
    object: Object,
}

impl Function {
    /// Check `obj` and wrap it. Runs inside a job.
    pub(crate) fn bind(name: &str, obj: PyRef<'_>) -> Result<Function> {
        if !obj.borrow().is_callable() {
            return Err(Error::NotCallable(name.to_string()));
        }
        Ok(Function {
            name: name.to_string(),
            object: obj.unbind(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    /// Call with positional arguments only.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        self.invoke(args, None, to_value)
    }

    /// Call with positional and keyword arguments.
    pub fn call_with_kwargs(&self, args: &[Value], kwargs: &Map) -> Result<Value> {
        self.invoke(args, Some(kwargs), to_value)
    }

    /// Call and hand back the raw result instead of converting it.
    pub fn call_direct(&self, args: &[Value], kwargs: Option<&Map>) -> Result<Object> {
        self.invoke(args, kwargs, |result, _| Ok(result.unbind()))
    }

    fn invoke<R, F>(&self, args: &[Value], kwargs: Option<&Map>, finish: F) -> Result<R>
    where
        F: for<'py> FnOnce(PyRef<'py>, &str) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let target = self
            .object
            .job_ref()
            .ok_or_else(|| Error::Released(self.name.clone()))?;
        let name = self.name.clone();
        let args = args.to_vec();
        let kwargs = kwargs.cloned();
        // `self` stays borrowed until the job has run.
        runtime::run(&self.name, move |gil| {
            let func = unsafe { target.bind(gil) };
            let result = call_object(func, "call", "function", &name, &args, kwargs.as_ref())?;
            finish(result, &name)
        })
    }

    pub fn release(&mut self) -> std::result::Result<(), MainThreadError> {
        self.object.release()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("object", &self.object)
            .finish()
    }
}

/// Call `callable(*args, **kwargs)`.
///
/// Empty keyword arguments are passed as no keyword arguments at all.
/// Failures of the call itself are reported as "fail to {action} '{name}' {kind}".
pub(crate) fn call_object<'py>(
    callable: Borrowed<'_, 'py>,
    action: &'static str,
    kind: &'static str,
    name: &str,
    args: &[Value],
    kwargs: Option<&Map>,
) -> Result<PyRef<'py>> {
    let gil = callable.gil();
    let py_args = args_tuple(gil, args)
        .map_err(|e| Error::from(e).context("convert arguments for", "call", name))?;
    let py_kwargs = match kwargs {
        Some(kwargs) if !kwargs.is_empty() => Some(
            kwargs_dict(gil, kwargs)
                .map_err(|e| Error::from(e).context("convert named arguments for", "call", name))?,
        ),
        _ => None,
    };
    callable
        .call(&py_args, py_kwargs.as_ref())
        .map_err(|e| Error::from(e).context(action, kind, name))
}

/// Look up attribute `name` of `target` and check that it can be called.
pub(crate) fn get_callable<'py>(target: Borrowed<'_, 'py>, name: &str) -> Result<PyRef<'py>> {
    let attr = target
        .getattr(name)
        .map_err(|e| Error::from(e).context("get", "function", name))?;
    if !attr.borrow().is_callable() {
        return Err(Error::NotCallable(name.to_string()).context("get", "function", name));
    }
    Ok(attr)
}

/// Call method `name` of `target` with `kind` naming what is called in errors.
pub(crate) fn invoke_attr<'py>(
    target: Borrowed<'_, 'py>,
    kind: &'static str,
    name: &str,
    args: &[Value],
    kwargs: Option<&Map>,
) -> Result<PyRef<'py>> {
    let func = get_callable(target, name)?;
    call_object(func.borrow(), "call", kind, name, args, kwargs)
}

/// Convert a call result into a value.
pub(crate) fn to_value(result: PyRef<'_>, name: &str) -> Result<Value> {
    from_py(result.borrow()).map_err(|e| e.context("convert result of", "call", name))
}

#[cfg(test)]
#[path = "func_tests.rs"]
mod tests;
