//! Translation of pending Python exceptions into Rust errors

use crate::object::{Borrowed, PyRef};
use crate::runtime;
use pyhost_mainthread::Gil;
use pyo3::ffi;
use std::fmt;
use std::ptr;
use thiserror::Error;
use tracing::warn;

/// A Python exception that crossed into Rust
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PyError {
    /// `MemoryError` was pending. The interpreter error state is left set, since
    /// formatting a traceback needs the memory that just ran out.
    #[error("python interpreter failed to allocate memory")]
    NoMemory,

    #[error("{0}")]
    Exception(PyException),
}

/// Structured form of a formatted traceback.
///
/// `main_message` is the final `Type: message` line. For syntax errors
/// `syntax_detail` holds the offending source line and the caret line, and those
/// two lines are not repeated in `stack_trace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyException {
    main_message: String,
    syntax_detail: Vec<String>,
    stack_trace: String,
}

impl PyException {
    /// An exception with only a main message
    pub fn new(main_message: impl Into<String>) -> Self {
        PyException {
            main_message: main_message.into(),
            syntax_detail: Vec::new(),
            stack_trace: String::new(),
        }
    }

    /// Build from the entries returned by `traceback.format_exception`.
    ///
    /// Entries may span several lines each; they are concatenated as-is.
    pub fn from_formatted<S: AsRef<str>>(entries: &[S], is_syntax_error: bool) -> Self {
        let n = entries.len();
        if n == 0 {
            return PyException::new("");
        }

        let main_message = entries[n - 1].as_ref().trim().to_string();
        let (syntax_detail, trace_len) = if is_syntax_error && n > 2 {
            let detail = entries[n - 3..n - 1]
                .iter()
                .map(|e| e.as_ref().trim_end().to_string())
                .collect();
            (detail, n - 3)
        } else {
            (Vec::new(), n - 1)
        };

        let stack_trace: String = entries[..trace_len].iter().map(|e| e.as_ref()).collect();
        PyException {
            main_message,
            syntax_detail,
            stack_trace: stack_trace.trim_end().to_string(),
        }
    }

    /// The final line, e.g. `ValueError: invalid literal`
    pub fn main_message(&self) -> &str {
        &self.main_message
    }

    /// Source line and caret line of a syntax error; empty otherwise
    pub fn syntax_detail(&self) -> &[String] {
        &self.syntax_detail
    }

    /// Everything before the main message (and syntax detail), right-trimmed
    pub fn stack_trace(&self) -> &str {
        &self.stack_trace
    }

    pub fn stack_trace_lines(&self) -> impl Iterator<Item = &str> {
        self.stack_trace.lines()
    }

    pub fn is_syntax_error(&self) -> bool {
        !self.syntax_detail.is_empty()
    }
}

impl fmt::Display for PyException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.main_message)?;
        for line in &self.syntax_detail {
            writeln!(f, "{}", line)?;
        }
        f.write_str(&self.stack_trace)
    }
}

/// Fetch, clear and translate the pending exception.
///
/// Must only be called after a C API call signalled failure.
pub fn fetch(gil: Gil<'_>) -> PyError {
    unsafe {
        if ffi::PyErr_Occurred().is_null() {
            return PyError::Exception(PyException::new(
                "SystemError: error return without exception set",
            ));
        }
        if ffi::PyErr_ExceptionMatches(ffi::PyExc_MemoryError) != 0 {
            return PyError::NoMemory;
        }

        let exc_info = match PyRef::from_owned_ptr(gil, ffi::PyTuple_New(3)) {
            Some(t) => t,
            None => {
                if ffi::PyErr_ExceptionMatches(ffi::PyExc_MemoryError) != 0 {
                    return PyError::NoMemory;
                }
                return fetch(gil);
            }
        };

        let mut ptype = ptr::null_mut();
        let mut pvalue = ptr::null_mut();
        let mut ptraceback = ptr::null_mut();
        ffi::PyErr_Fetch(&mut ptype, &mut pvalue, &mut ptraceback);
        ffi::PyErr_NormalizeException(&mut ptype, &mut pvalue, &mut ptraceback);
        if !pvalue.is_null() && !ptraceback.is_null() {
            ffi::PyException_SetTraceback(pvalue, ptraceback);
        }

        let is_syntax_error = !ptype.is_null()
            && ffi::PyType_Check(ptype) != 0
            && ffi::PyType_IsSubtype(
                ptype as *mut ffi::PyTypeObject,
                ffi::PyExc_SyntaxError as *mut ffi::PyTypeObject,
            ) != 0;

        // PyTuple_SetItem steals; missing parts become None.
        for (i, item) in [ptype, pvalue, ptraceback].into_iter().enumerate() {
            let item = if item.is_null() {
                ffi::Py_IncRef(ffi::Py_None());
                ffi::Py_None()
            } else {
                item
            };
            ffi::PyTuple_SetItem(exc_info.as_ptr(), i as ffi::Py_ssize_t, item);
        }

        match format_exception(gil, &exc_info) {
            Some(entries) => {
                PyError::Exception(PyException::from_formatted(&entries, is_syntax_error))
            }
            None => PyError::Exception(fallback_exception(gil, &exc_info)),
        }
    }
}

unsafe fn format_exception(gil: Gil<'_>, exc_info: &PyRef<'_>) -> Option<Vec<String>> {
    let formatter = match runtime::interp_state(gil) {
        Ok(state) => state.format_exception(),
        Err(e) => {
            warn!("traceback formatter unavailable: {}", e);
            return None;
        }
    };

    let formatted = match PyRef::from_owned_ptr(
        gil,
        ffi::PyObject_CallObject(formatter, exc_info.as_ptr()),
    ) {
        Some(list) => list,
        None => {
            ffi::PyErr_Clear();
            warn!("traceback.format_exception failed");
            return None;
        }
    };
    if ffi::PyList_Check(formatted.as_ptr()) == 0 {
        return None;
    }

    let len = ffi::PyList_Size(formatted.as_ptr());
    let mut entries = Vec::with_capacity(len.max(0) as usize);
    for i in 0..len {
        let item = ffi::PyList_GetItem(formatted.as_ptr(), i);
        let mut size: ffi::Py_ssize_t = 0;
        let data = ffi::PyUnicode_AsUTF8AndSize(item, &mut size);
        if data.is_null() {
            ffi::PyErr_Clear();
            return None;
        }
        let bytes = std::slice::from_raw_parts(data as *const u8, size as usize);
        entries.push(String::from_utf8_lossy(bytes).into_owned());
    }
    Some(entries)
}

/// `TypeName: str(value)` when the traceback module could not format the triple.
unsafe fn fallback_exception(gil: Gil<'_>, exc_info: &PyRef<'_>) -> PyException {
    let type_obj = Borrowed::from_ptr(gil, ffi::PyTuple_GetItem(exc_info.as_ptr(), 0));
    let value = Borrowed::from_ptr(gil, ffi::PyTuple_GetItem(exc_info.as_ptr(), 1));

    let type_name = match type_obj {
        Some(t) if ffi::PyType_Check(t.as_ptr()) != 0 => {
            let ty = t.as_ptr() as *mut ffi::PyTypeObject;
            std::ffi::CStr::from_ptr((*ty).tp_name)
                .to_string_lossy()
                .into_owned()
        }
        _ => "Exception".to_string(),
    };
    let message = value.and_then(|v| v.str().ok()).unwrap_or_default();
    if !ffi::PyErr_Occurred().is_null() {
        ffi::PyErr_Clear();
    }

    if message.is_empty() {
        PyException::new(type_name)
    } else {
        PyException::new(format!("{}: {}", type_name, message))
    }
}

#[cfg(test)]
#[path = "exception_tests.rs"]
mod tests;
