//! Process-wide interpreter setup
//!
//! Everything pyhost caches from the interpreter (the traceback formatter and the
//! datetime C API) is prepared by one routine that runs on the main thread
//! before the first job. [`initialize`] installs it as the broker's startup hook;
//! the first pyhost call does the same with the configuration from the
//! environment if nobody initialized explicitly.

use crate::error::{Error, Result};
use libc::c_char;
use once_cell::sync::OnceCell;
use pyhost_core::RuntimeConfig;
use pyhost_mainthread::{self as mainthread, Gil, MainThreadError, StartupHook};
use pyo3::ffi;
use std::cell::Cell;
use std::ptr::NonNull;
use tracing::{error, info, warn};

static CONFIG: OnceCell<RuntimeConfig> = OnceCell::new();

thread_local! {
    // Only ever populated on the main thread.
    static STATE: Cell<Option<InterpState>> = Cell::new(None);
}

/// Interpreter objects cached for the lifetime of the process.
///
/// The references are intentionally never released: they live until the
/// interpreter is finalized.
#[derive(Clone, Copy)]
pub(crate) struct InterpState {
    format_exception: NonNull<ffi::PyObject>,
}

impl InterpState {
    pub(crate) fn format_exception(&self) -> *mut ffi::PyObject {
        self.format_exception.as_ptr()
    }
}

/// Cached state for the main thread, preparing it on first use.
pub(crate) fn interp_state(gil: Gil<'_>) -> std::result::Result<InterpState, String> {
    if let Some(state) = STATE.with(|s| s.get()) {
        return Ok(state);
    }
    prepare(gil)?;
    STATE
        .with(|s| s.get())
        .ok_or_else(|| "interpreter state was not recorded".to_string())
}

/// Import the modules pyhost depends on and record the objects it caches.
fn prepare(_gil: Gil<'_>) -> std::result::Result<(), String> {
    if STATE.with(|s| s.get()).is_some() {
        return Ok(());
    }

    unsafe {
        ffi::PyDateTime_IMPORT();
        if ffi::PyDateTimeAPI().is_null() {
            ffi::PyErr_Clear();
            return Err("cannot import the datetime C API".to_string());
        }

        let traceback = ffi::PyImport_ImportModule(b"traceback\0".as_ptr() as *const c_char);
        if traceback.is_null() {
            ffi::PyErr_Clear();
            return Err("cannot import the traceback module".to_string());
        }
        let format_exception =
            ffi::PyObject_GetAttrString(traceback, b"format_exception\0".as_ptr() as *const c_char);
        ffi::Py_DecRef(traceback);

        let format_exception = NonNull::new(format_exception).ok_or_else(|| {
            ffi::PyErr_Clear();
            "traceback.format_exception is missing".to_string()
        })?;
        STATE.with(|s| s.set(Some(InterpState { format_exception })));
    }
    Ok(())
}

fn startup_hook() -> StartupHook {
    Box::new(|gil| prepare(gil))
}

/// Start the interpreter with `config`.
///
/// Fails if pyhost (or the broker directly) was already started. Start-up
/// errors are returned here; only the implicit start on first use panics.
pub fn initialize(config: RuntimeConfig) -> Result<()> {
    let mut started = false;
    CONFIG.get_or_try_init(|| {
        mainthread::initialize_with(&config.interpreter, Some(startup_hook()))?;
        started = true;
        Ok::<_, Error>(config)
    })?;
    if !started {
        return Err(MainThreadError::AlreadyStarted.into());
    }
    info!("pyhost runtime initialized");
    Ok(())
}

/// Make sure the interpreter is running and prepared.
///
/// # Panics
///
/// When the interpreter cannot be brought up: nothing in pyhost can work
/// without it.
pub(crate) fn ensure() {
    let result = CONFIG.get_or_try_init(|| {
        let config = RuntimeConfig::from_env().unwrap_or_else(|e| {
            warn!("ignoring configuration from the environment: {}", e);
            RuntimeConfig::default()
        });
        match mainthread::initialize_with(&config.interpreter, Some(startup_hook())) {
            Ok(()) => {}
            // Someone started the broker without our hook; prepare on it now.
            Err(MainThreadError::AlreadyStarted) => {
                mainthread::exec_sync(|gil| prepare(gil))?.map_err(MainThreadError::InitFailed)?
            }
            Err(e) => return Err(e),
        }
        Ok(config)
    });
    if let Err(e) = result {
        error!("cannot start the python interpreter: {}", e);
        panic!("cannot start the python interpreter: {}", e);
    }
}

/// Run a call-layer job named `name` on the main thread.
///
/// A panic inside `f` comes back as [`Error::Panic`] naming the call.
pub(crate) fn run<F, R>(name: &str, f: F) -> Result<R>
where
    F: for<'py> FnOnce(Gil<'py>) -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    ensure();
    mainthread::exec_sync(f).map_err(|e| Error::from_job(e, name))?
}

/// The configuration the runtime was started with
pub fn config() -> &'static RuntimeConfig {
    ensure();
    CONFIG.get_or_init(RuntimeConfig::default)
}

/// Whether the runtime has been initialized (explicitly or lazily)
pub fn is_initialized() -> bool {
    CONFIG.get().is_some()
}

/// Append directories to `sys.path`.
pub fn append_sys_path<I, P>(paths: I) -> Result<()>
where
    I: IntoIterator<Item = P>,
    P: AsRef<std::path::Path>,
{
    ensure();
    mainthread::append_sys_path(paths)?;
    Ok(())
}

/// Finalize the interpreter. Nothing may call into Python afterwards.
pub fn terminate() -> Result<()> {
    mainthread::terminate()?;
    Ok(())
}
