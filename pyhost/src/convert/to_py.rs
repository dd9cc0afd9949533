use super::container::Slot;
use super::datetime;
use crate::exception::PyError;
use crate::object::PyRef;
use libc::{c_char, c_long};
use pyhost_core::{Map, Value};
use pyhost_mainthread::Gil;
use pyo3::ffi;

/// Convert a value into a new interpreter object.
///
/// | Value       | Python                          |
/// |-------------|---------------------------------|
/// | `Null`      | `None`                          |
/// | `Bool`      | `bool`                          |
/// | `Int`       | `int`                           |
/// | `Float`     | `float`                         |
/// | `String`    | `str`                           |
/// | `Blob`      | `bytearray`                     |
/// | `Timestamp` | naive `datetime.datetime` (UTC) |
/// | `Array`     | `list`                          |
/// | `Map`       | `dict` with `str` keys          |
pub fn to_py<'py>(gil: Gil<'py>, value: &Value) -> Result<PyRef<'py>, PyError> {
    let ptr = unsafe {
        match value {
            Value::Null => {
                ffi::Py_IncRef(ffi::Py_None());
                ffi::Py_None()
            }
            Value::Bool(b) => ffi::PyBool_FromLong(*b as c_long),
            Value::Int(n) => ffi::PyLong_FromLongLong(*n),
            Value::Float(x) => ffi::PyFloat_FromDouble(*x),
            Value::String(s) => ffi::PyUnicode_FromStringAndSize(
                s.as_ptr() as *const c_char,
                s.len() as ffi::Py_ssize_t,
            ),
            Value::Blob(bytes) => ffi::PyByteArray_FromStringAndSize(
                bytes.as_ptr() as *const c_char,
                bytes.len() as ffi::Py_ssize_t,
            ),
            Value::Timestamp(t) => return datetime::to_py_datetime(gil, t),
            Value::Array(items) => return list_to_py(gil, items),
            Value::Map(m) => return kwargs_dict(gil, m),
        }
    };
    unsafe { PyRef::from_owned_ptr_or_err(gil, ptr) }
}

fn list_to_py<'py>(gil: Gil<'py>, items: &[Value]) -> Result<PyRef<'py>, PyError> {
    let list = unsafe {
        PyRef::from_owned_ptr_or_err(gil, ffi::PyList_New(items.len() as ffi::Py_ssize_t))?
    };
    for (i, item) in items.iter().enumerate() {
        // Unfilled slots are NULL, which list deallocation tolerates.
        Slot::ListItem(i).insert(&list, to_py(gil, item)?)?;
    }
    Ok(list)
}

/// Build the positional argument tuple for a call.
pub fn args_tuple<'py>(gil: Gil<'py>, args: &[Value]) -> Result<PyRef<'py>, PyError> {
    let tuple = unsafe {
        PyRef::from_owned_ptr_or_err(gil, ffi::PyTuple_New(args.len() as ffi::Py_ssize_t))?
    };
    for (i, arg) in args.iter().enumerate() {
        Slot::TupleItem(i).insert(&tuple, to_py(gil, arg)?)?;
    }
    Ok(tuple)
}

/// Build a `dict` from a map; also used for keyword arguments.
pub fn kwargs_dict<'py>(gil: Gil<'py>, map: &Map) -> Result<PyRef<'py>, PyError> {
    let dict = unsafe { PyRef::from_owned_ptr_or_err(gil, ffi::PyDict_New())? };
    for (key, value) in map {
        Slot::DictItem(key).insert(&dict, to_py(gil, value)?)?;
    }
    Ok(dict)
}
