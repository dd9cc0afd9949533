//! Container insertions and who owns the inserted reference afterwards

use crate::exception::{self, PyError};
use crate::object::PyRef;
use libc::c_char;
use pyo3::ffi;

/// What a container insertion does with the reference it is handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTransfer {
    /// The container takes over the reference, even when the insertion fails.
    Steals,
    /// The container takes its own reference; the caller still has to release theirs.
    Borrows,
}

/// A place in a list, tuple or dict that a converted value is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'k> {
    /// `PyList_SetItem` on a pre-sized list
    ListItem(usize),
    /// `PyList_Append`
    ListAppend,
    /// `PyTuple_SetItem` on a freshly created tuple
    TupleItem(usize),
    /// `PyDict_SetItem` with a `str` key
    DictItem(&'k str),
}

impl Slot<'_> {
    pub const fn transfer(&self) -> RefTransfer {
        match self {
            Slot::ListItem(_) | Slot::TupleItem(_) => RefTransfer::Steals,
            Slot::ListAppend | Slot::DictItem(_) => RefTransfer::Borrows,
        }
    }

    /// Store `item` into `container`, settling ownership of `item` according to
    /// [`Slot::transfer`].
    pub fn insert<'py>(&self, container: &PyRef<'py>, item: PyRef<'py>) -> Result<(), PyError> {
        let gil = container.gil();
        let status = match self.transfer() {
            RefTransfer::Steals => {
                let raw = item.into_ptr();
                unsafe { self.apply(container, raw)? }
            }
            RefTransfer::Borrows => {
                let status = unsafe { self.apply(container, item.as_ptr())? };
                drop(item);
                status
            }
        };
        if status != 0 {
            return Err(exception::fetch(gil));
        }
        Ok(())
    }

    unsafe fn apply(
        &self,
        container: &PyRef<'_>,
        item: *mut ffi::PyObject,
    ) -> Result<libc::c_int, PyError> {
        let target = container.as_ptr();
        Ok(match *self {
            Slot::ListItem(i) => ffi::PyList_SetItem(target, i as ffi::Py_ssize_t, item),
            Slot::ListAppend => ffi::PyList_Append(target, item),
            Slot::TupleItem(i) => ffi::PyTuple_SetItem(target, i as ffi::Py_ssize_t, item),
            Slot::DictItem(key) => {
                let key = PyRef::from_owned_ptr(
                    container.gil(),
                    ffi::PyUnicode_FromStringAndSize(
                        key.as_ptr() as *const c_char,
                        key.len() as ffi::Py_ssize_t,
                    ),
                );
                match key {
                    Some(key) => ffi::PyDict_SetItem(target, key.as_ptr(), item),
                    None => return Err(exception::fetch(container.gil())),
                }
            }
        })
    }
}
