//! `sys.path` maintenance

use crate::broker::exec_sync;
use crate::error::{MainThreadError, Result};
use crate::gil::Gil;
use libc::c_char;
use pyo3::ffi;
use std::path::Path;
use tracing::debug;

/// Append directories to the interpreter's `sys.path`, skipping ones already present.
pub fn append_sys_path<I, P>(paths: I) -> Result<()>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let paths: Vec<String> = paths
        .into_iter()
        .map(|p| p.as_ref().to_string_lossy().into_owned())
        .collect();
    if paths.is_empty() {
        return Ok(());
    }
    exec_sync(move |gil| append_paths(gil, &paths))?
}

/// Owning-thread half of [`append_sys_path`].
pub fn append_paths<S: AsRef<str>>(_gil: Gil<'_>, paths: &[S]) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }

    unsafe {
        // borrowed reference
        let sys_path = ffi::PySys_GetObject(b"path\0".as_ptr() as *const c_char);
        if sys_path.is_null() || ffi::PyList_Check(sys_path) == 0 {
            return Err(MainThreadError::SysPath("sys.path is not a list".to_string()));
        }

        for path in paths {
            let path = path.as_ref();
            let item = ffi::PyUnicode_FromStringAndSize(
                path.as_ptr() as *const c_char,
                path.len() as ffi::Py_ssize_t,
            );
            if item.is_null() {
                ffi::PyErr_Clear();
                return Err(MainThreadError::SysPath(format!("cannot encode '{}'", path)));
            }

            let status = match ffi::PySequence_Contains(sys_path, item) {
                0 => ffi::PyList_Append(sys_path, item),
                1 => 0,
                _ => -1,
            };
            ffi::Py_DecRef(item);
            if status != 0 {
                ffi::PyErr_Clear();
                return Err(MainThreadError::SysPath(format!("cannot append '{}'", path)));
            }
            debug!(path, "added to sys.path");
        }
    }
    Ok(())
}
