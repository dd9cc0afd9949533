//! Marshaling between [`Value`](pyhost_core::Value) and interpreter objects
//!
//! Both directions run inside main thread jobs. [`to_py`] never fails on the
//! shape of a value (the variant set is closed) but can surface allocation or
//! range errors raised by the interpreter. [`from_py`] rejects any object whose
//! type has no [`Value`](pyhost_core::Value) counterpart.

mod container;
mod datetime;
mod from_py;
mod to_py;

pub use container::{RefTransfer, Slot};
pub use from_py::from_py;
pub use to_py::{args_tuple, kwargs_dict, to_py};

use crate::exception::{self, PyError};
use crate::object::Borrowed;
use pyo3::ffi;

/// Decode a `str` object as UTF-8.
pub(crate) fn unicode_to_string(obj: Borrowed<'_, '_>) -> Result<String, PyError> {
    unsafe {
        let mut size: ffi::Py_ssize_t = 0;
        let data = ffi::PyUnicode_AsUTF8AndSize(obj.as_ptr(), &mut size);
        if data.is_null() {
            return Err(exception::fetch(obj.gil()));
        }
        let bytes = std::slice::from_raw_parts(data as *const u8, size as usize);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
