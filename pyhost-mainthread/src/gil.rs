//! Proof of running on the interpreter's owning thread

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static HELD: Cell<bool> = Cell::new(false);
}

/// Token handed to every job running on the owning thread.
///
/// Holding a `Gil<'py>` means the current thread holds the interpreter lock for
/// at least `'py`. It cannot be sent to another thread and can only be created
/// by the broker.
#[derive(Clone, Copy)]
pub struct Gil<'py> {
    _marker: PhantomData<(&'py (), *mut ())>,
}

impl<'py> Gil<'py> {
    /// # Safety
    ///
    /// The caller must hold the interpreter lock on the current thread for `'py`.
    pub(crate) unsafe fn assume() -> Self {
        Gil {
            _marker: PhantomData,
        }
    }
}

impl std::fmt::Debug for Gil<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Gil")
    }
}

pub(crate) fn set_held(held: bool) {
    HELD.with(|h| h.set(held));
}

/// Whether the current thread is the owning thread and is running a job
pub fn is_main_thread() -> bool {
    HELD.with(|h| h.get())
}

/// Run `f` with a token if the current thread is already inside a job.
///
/// Returns `None` everywhere else. This is the fast path used by handles that are
/// dropped on the owning thread, where going through the queue would deadlock.
pub fn with_gil<F, R>(f: F) -> Option<R>
where
    F: for<'py> FnOnce(Gil<'py>) -> R,
{
    if is_main_thread() {
        // SAFETY: the flag is only set while the owning thread holds the lock.
        Some(f(unsafe { Gil::assume() }))
    } else {
        None
    }
}
