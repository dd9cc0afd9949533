//! Ownership of interpreter object references
//!
//! Two handle types split the one dangerous operation, decrementing a reference
//! count, by who is allowed to do it:
//!
//! * [`Object`] is owned, `Send` and usable from any thread. Releasing it always
//!   reaches the interpreter through the main thread.
//! * [`PyRef<'py>`] is confined to a job on the main thread by its [`Gil`]
//!   lifetime. Dropping it decrements the count directly.
//!
//! [`Borrowed`] is a non-owning view used while walking containers.

use crate::exception::{self, PyError};
use libc::c_char;
use pyhost_mainthread::{exec, exec_sync, with_gil, Gil, MainThreadError};
use pyo3::ffi;
use std::ffi::CStr;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use tracing::warn;

/// Owned reference that may move between threads.
///
/// The pointer is only ever dereferenced inside main thread jobs. Once released
/// the handle is empty and every further release is a no-op.
pub struct Object {
    ptr: Option<NonNull<ffi::PyObject>>,
}

// SAFETY: the pointer is never dereferenced off the main thread; every access goes
// through a job that receives a `Gil`.
unsafe impl Send for Object {}
unsafe impl Sync for Object {}

#[derive(Clone, Copy)]
struct SendPtr(NonNull<ffi::PyObject>);

// SAFETY: only moved into a job, where it is used on the main thread.
unsafe impl Send for SendPtr {}

impl SendPtr {
    /// # Safety
    ///
    /// Must run on the main thread while it holds the interpreter lock.
    unsafe fn decref(self) {
        ffi::Py_DecRef(self.0.as_ptr())
    }

    /// # Safety
    ///
    /// Must run on the main thread while it holds the interpreter lock.
    unsafe fn incref(self) -> Object {
        ffi::Py_IncRef(self.0.as_ptr());
        Object { ptr: Some(self.0) }
    }
}

impl Object {
    /// An empty handle
    pub const fn null() -> Self {
        Object { ptr: None }
    }

    /// Whether the handle has been released (or never held anything)
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Drop the reference, routing through the main thread.
    ///
    /// Safe to call from any thread and any number of times. When called from
    /// inside a job it releases in place instead of queueing.
    pub fn release(&mut self) -> Result<(), MainThreadError> {
        let ptr = match self.ptr.take() {
            Some(ptr) => SendPtr(ptr),
            None => return Ok(()),
        };
        match with_gil(|_| unsafe { ptr.decref() }) {
            Some(()) => Ok(()),
            None => exec_sync(move |_| unsafe { ptr.decref() }),
        }
    }

    /// View the reference inside a job. `None` once released.
    pub fn bind<'a, 'py>(&'a self, gil: Gil<'py>) -> Option<Borrowed<'a, 'py>> {
        self.ptr.map(|ptr| Borrowed {
            ptr,
            gil,
            _marker: PhantomData,
        })
    }

    /// Address for use by a synchronous job while `self` stays borrowed.
    pub(crate) fn job_ref(&self) -> Option<JobRef> {
        self.ptr.map(JobRef)
    }

    /// Take the reference back into a thread-confined handle, leaving this one empty.
    pub fn take<'py>(&mut self, gil: Gil<'py>) -> Option<PyRef<'py>> {
        self.ptr.take().map(|ptr| PyRef { ptr, gil })
    }

    /// A second owned handle to the same object.
    pub fn clone_ref(&self) -> Result<Object, MainThreadError> {
        let ptr = match self.ptr {
            Some(ptr) => SendPtr(ptr),
            None => return Ok(Object::null()),
        };
        match with_gil(|_| unsafe { ptr.incref() }) {
            Some(obj) => Ok(obj),
            None => exec_sync(move |_| unsafe { ptr.incref() }),
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Object::null()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(ptr) => write!(f, "Object({:p})", ptr.as_ptr()),
            None => f.write_str("Object(null)"),
        }
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        let ptr = match self.ptr.take() {
            Some(ptr) => SendPtr(ptr),
            None => return,
        };
        if with_gil(|_| unsafe { ptr.decref() }).is_some() {
            return;
        }
        if exec(move |_| unsafe { ptr.decref() }).is_err() {
            warn!("python object dropped after the main thread terminated; reference leaked");
        }
    }
}

/// Address of an [`Object`] handed to a job that the caller waits for.
///
/// The caller keeps the `Object` borrowed until the job has finished, so the
/// reference cannot be released underneath it.
#[derive(Clone, Copy)]
pub(crate) struct JobRef(NonNull<ffi::PyObject>);

// SAFETY: only dereferenced inside the job it was moved into.
unsafe impl Send for JobRef {}

impl JobRef {
    /// # Safety
    ///
    /// The `Object` this came from must outlive the job calling this.
    pub(crate) unsafe fn bind<'py>(self, gil: Gil<'py>) -> Borrowed<'py, 'py> {
        Borrowed {
            ptr: self.0,
            gil,
            _marker: PhantomData,
        }
    }
}

/// Owned reference confined to a main thread job.
pub struct PyRef<'py> {
    ptr: NonNull<ffi::PyObject>,
    gil: Gil<'py>,
}

impl<'py> PyRef<'py> {
    /// Take ownership of a new reference returned by the C API. `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a new (owned) reference.
    pub unsafe fn from_owned_ptr(gil: Gil<'py>, ptr: *mut ffi::PyObject) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| PyRef { ptr, gil })
    }

    /// Like [`PyRef::from_owned_ptr`], translating a null result into the pending error.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a new (owned) reference.
    pub unsafe fn from_owned_ptr_or_err(
        gil: Gil<'py>,
        ptr: *mut ffi::PyObject,
    ) -> Result<Self, PyError> {
        Self::from_owned_ptr(gil, ptr).ok_or_else(|| exception::fetch(gil))
    }

    /// Take a new reference to a borrowed pointer. `None` for null.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or point to a live object.
    pub unsafe fn from_borrowed_ptr(gil: Gil<'py>, ptr: *mut ffi::PyObject) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| {
            ffi::Py_IncRef(ptr.as_ptr());
            PyRef { ptr, gil }
        })
    }

    pub fn as_ptr(&self) -> *mut ffi::PyObject {
        self.ptr.as_ptr()
    }

    /// Give the reference away, e.g. to a container insertion that steals it.
    pub fn into_ptr(self) -> *mut ffi::PyObject {
        let ptr = self.ptr.as_ptr();
        mem::forget(self);
        ptr
    }

    pub fn gil(&self) -> Gil<'py> {
        self.gil
    }

    /// Decrement the reference count now. Same as dropping the handle.
    pub fn release_internal(self) {
        drop(self)
    }

    /// Turn into a handle that can leave the main thread.
    pub fn unbind(self) -> Object {
        Object {
            ptr: NonNull::new(self.into_ptr()),
        }
    }

    pub fn borrow(&self) -> Borrowed<'_, 'py> {
        Borrowed {
            ptr: self.ptr,
            gil: self.gil,
            _marker: PhantomData,
        }
    }
}

impl Clone for PyRef<'_> {
    fn clone(&self) -> Self {
        unsafe { ffi::Py_IncRef(self.ptr.as_ptr()) };
        PyRef {
            ptr: self.ptr,
            gil: self.gil,
        }
    }
}

impl Drop for PyRef<'_> {
    fn drop(&mut self) {
        unsafe { ffi::Py_DecRef(self.ptr.as_ptr()) }
    }
}

impl fmt::Debug for PyRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PyRef({}@{:p})", self.borrow().type_name(), self.ptr.as_ptr())
    }
}

/// Non-owning view of a live object inside a job.
#[derive(Clone, Copy)]
pub struct Borrowed<'a, 'py> {
    ptr: NonNull<ffi::PyObject>,
    gil: Gil<'py>,
    _marker: PhantomData<&'a ffi::PyObject>,
}

impl<'a, 'py> Borrowed<'a, 'py> {
    /// # Safety
    ///
    /// `ptr` must be null or point to an object kept alive for `'a`.
    pub unsafe fn from_ptr(gil: Gil<'py>, ptr: *mut ffi::PyObject) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Borrowed {
            ptr,
            gil,
            _marker: PhantomData,
        })
    }

    pub fn as_ptr(&self) -> *mut ffi::PyObject {
        self.ptr.as_ptr()
    }

    pub fn gil(&self) -> Gil<'py> {
        self.gil
    }

    pub fn to_owned(&self) -> PyRef<'py> {
        unsafe { ffi::Py_IncRef(self.ptr.as_ptr()) };
        PyRef {
            ptr: self.ptr,
            gil: self.gil,
        }
    }

    /// `tp_name` of the object's type
    pub fn type_name(&self) -> String {
        unsafe {
            let ty = ffi::Py_TYPE(self.ptr.as_ptr());
            if ty.is_null() || (*ty).tp_name.is_null() {
                return "<unknown>".to_string();
            }
            CStr::from_ptr((*ty).tp_name).to_string_lossy().into_owned()
        }
    }

    pub fn is_none(&self) -> bool {
        unsafe { self.ptr.as_ptr() == ffi::Py_None() }
    }

    pub fn is_callable(&self) -> bool {
        unsafe { ffi::PyCallable_Check(self.ptr.as_ptr()) != 0 }
    }

    /// `getattr(self, name)`
    pub fn getattr(&self, name: &str) -> Result<PyRef<'py>, PyError> {
        let key = unsafe {
            PyRef::from_owned_ptr_or_err(
                self.gil,
                ffi::PyUnicode_FromStringAndSize(
                    name.as_ptr() as *const c_char,
                    name.len() as ffi::Py_ssize_t,
                ),
            )?
        };
        unsafe {
            PyRef::from_owned_ptr_or_err(
                self.gil,
                ffi::PyObject_GetAttr(self.ptr.as_ptr(), key.as_ptr()),
            )
        }
    }

    /// `self(*args, **kwargs)`; `args` must be a tuple.
    pub fn call(
        &self,
        args: &PyRef<'py>,
        kwargs: Option<&PyRef<'py>>,
    ) -> Result<PyRef<'py>, PyError> {
        let kwargs = kwargs.map_or(ptr::null_mut(), |k| k.as_ptr());
        unsafe {
            PyRef::from_owned_ptr_or_err(
                self.gil,
                ffi::PyObject_Call(self.ptr.as_ptr(), args.as_ptr(), kwargs),
            )
        }
    }

    /// `str(self)`
    pub fn str(&self) -> Result<String, PyError> {
        let s = unsafe {
            PyRef::from_owned_ptr_or_err(self.gil, ffi::PyObject_Str(self.ptr.as_ptr()))?
        };
        crate::convert::unicode_to_string(s.borrow())
    }
}

impl fmt::Debug for Borrowed<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Borrowed({}@{:p})", self.type_name(), self.ptr.as_ptr())
    }
}

#[cfg(test)]
#[path = "object_tests.rs"]
mod tests;
