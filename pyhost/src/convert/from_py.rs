use super::{datetime, unicode_to_string};
use crate::error::{Error, Result};
use crate::exception;
use crate::object::Borrowed;
use libc::c_char;
use pyhost_core::{Map, Value, ValueError};
use pyo3::ffi;

/// Containers nested deeper than this are rejected; it also stops
/// self-referencing lists and dicts.
const MAX_DEPTH: usize = 512;

/// Convert an interpreter object into a value.
///
/// Types are checked in a fixed order: `True`/`False`, `int`, `float`,
/// `bytearray`, `bytes`, `str`, `datetime`, `list`, `dict`, `tuple`, `None`.
/// All checks are exact, so subclasses (other than of `bool`) are unsupported.
/// Dict entries whose key is not a `str` are skipped; tuples become arrays.
pub fn from_py(obj: Borrowed<'_, '_>) -> Result<Value> {
    convert(obj, 0)
}

fn convert(obj: Borrowed<'_, '_>, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(ValueError::ConversionError {
            from: "python object",
            to: "value",
            reason: format!("nesting deeper than {} levels", MAX_DEPTH),
        }
        .into());
    }

    let o = obj.as_ptr();
    let gil = obj.gil();
    unsafe {
        if o == ffi::Py_True() {
            return Ok(Value::Bool(true));
        }
        if o == ffi::Py_False() {
            return Ok(Value::Bool(false));
        }
        if ffi::PyLong_CheckExact(o) != 0 {
            let n = ffi::PyLong_AsLongLong(o);
            if n == -1 && !ffi::PyErr_Occurred().is_null() {
                return Err(exception::fetch(gil).into());
            }
            return Ok(Value::Int(n));
        }
        if ffi::PyFloat_CheckExact(o) != 0 {
            return Ok(Value::Float(ffi::PyFloat_AsDouble(o)));
        }
        if ffi::PyByteArray_CheckExact(o) != 0 {
            return Ok(Value::Blob(copy_bytes(
                ffi::PyByteArray_AsString(o),
                ffi::PyByteArray_Size(o),
            )));
        }
        if ffi::PyBytes_CheckExact(o) != 0 {
            return Ok(Value::Blob(copy_bytes(
                ffi::PyBytes_AsString(o),
                ffi::PyBytes_Size(o),
            )));
        }
        if ffi::PyUnicode_CheckExact(o) != 0 {
            return Ok(Value::String(unicode_to_string(obj)?));
        }
    }
    if datetime::is_datetime(obj) {
        return Ok(Value::Timestamp(datetime::from_py_datetime(obj)?));
    }
    unsafe {
        if ffi::PyList_CheckExact(o) != 0 {
            let len = ffi::PyList_Size(o);
            return sequence(obj, len, depth, |i| ffi::PyList_GetItem(o, i));
        }
        if ffi::PyDict_CheckExact(o) != 0 {
            return dict(obj, depth);
        }
        if ffi::PyTuple_CheckExact(o) != 0 {
            let len = ffi::PyTuple_Size(o);
            return sequence(obj, len, depth, |i| ffi::PyTuple_GetItem(o, i));
        }
        if o == ffi::Py_None() {
            return Ok(Value::Null);
        }
    }
    Err(Error::UnsupportedType(obj.type_name()))
}

unsafe fn copy_bytes(data: *const c_char, len: ffi::Py_ssize_t) -> Vec<u8> {
    if data.is_null() || len <= 0 {
        return Vec::new();
    }
    std::slice::from_raw_parts(data as *const u8, len as usize).to_vec()
}

/// Convert `len` borrowed items produced by `get_item`.
unsafe fn sequence(
    obj: Borrowed<'_, '_>,
    len: ffi::Py_ssize_t,
    depth: usize,
    get_item: impl Fn(ffi::Py_ssize_t) -> *mut ffi::PyObject,
) -> Result<Value> {
    let mut items = Vec::with_capacity(len.max(0) as usize);
    for i in 0..len {
        // The container keeps its items alive while we hold `obj`.
        let item = Borrowed::from_ptr(obj.gil(), get_item(i))
            .ok_or_else(|| Error::from(exception::fetch(obj.gil())))?;
        items.push(convert(item, depth + 1)?);
    }
    Ok(Value::Array(items))
}

unsafe fn dict(obj: Borrowed<'_, '_>, depth: usize) -> Result<Value> {
    let gil = obj.gil();
    let mut map = Map::default();
    let mut pos: ffi::Py_ssize_t = 0;
    let mut key: *mut ffi::PyObject = std::ptr::null_mut();
    let mut value: *mut ffi::PyObject = std::ptr::null_mut();

    while ffi::PyDict_Next(obj.as_ptr(), &mut pos, &mut key, &mut value) != 0 {
        if ffi::PyUnicode_CheckExact(key) == 0 {
            continue;
        }
        let (k, v) = match (Borrowed::from_ptr(gil, key), Borrowed::from_ptr(gil, value)) {
            (Some(k), Some(v)) => (k, v),
            _ => continue,
        };
        map.insert(unicode_to_string(k)?, convert(v, depth + 1)?);
    }
    Ok(Value::Map(map))
}
