//! The owning thread and its job queue

use crate::error::{panic_message, MainThreadError, Result};
use crate::gil::{self, Gil};
use crate::path;
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use pyhost_core::InterpreterConfig;
use pyo3::ffi;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

type Job = Box<dyn for<'py> FnOnce(Gil<'py>) + Send + 'static>;

/// Runs once on the owning thread after the interpreter is up and before the
/// first job. An error aborts startup.
pub type StartupHook =
    Box<dyn for<'py> FnOnce(Gil<'py>) -> std::result::Result<(), String> + Send + 'static>;

static BROKER: OnceCell<Broker> = OnceCell::new();

/// Snapshot of the broker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerStats {
    /// Jobs accepted by the queue
    pub submitted: u64,
    /// Jobs that ran to completion or panicked
    pub completed: u64,
    /// Jobs that panicked
    pub panicked: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

struct Broker {
    sender: RwLock<Option<Sender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl Broker {
    fn start(config: &InterpreterConfig, hook: Option<StartupHook>) -> Result<Self> {
        let (sender, receiver) = unbounded::<Job>();
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
        let counters = Arc::new(Counters::default());

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(size) = config.stack_size {
            builder = builder.stack_size(size);
        }

        let install_signal_handlers = config.install_signal_handlers;
        let search_paths = config.search_paths.clone();
        let loop_counters = Arc::clone(&counters);
        let handle = builder
            .spawn(move || {
                main_loop(
                    receiver,
                    loop_counters,
                    ready_tx,
                    install_signal_handlers,
                    search_paths,
                    hook,
                )
            })
            .map_err(|e| MainThreadError::Spawn(e.to_string()))?;

        let ready = ready_rx.recv().unwrap_or_else(|_| {
            Err(MainThreadError::InitFailed(
                "main thread exited during startup".to_string(),
            ))
        });
        if let Err(e) = ready {
            let _ = handle.join();
            return Err(e);
        }

        info!(thread = %config.thread_name, "python main thread started");
        Ok(Broker {
            sender: RwLock::new(Some(sender)),
            handle: Mutex::new(Some(handle)),
            counters,
        })
    }

    fn submit(&self, job: Job) -> Result<()> {
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(MainThreadError::Terminated)?;
        self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        sender.send(job).map_err(|_| MainThreadError::Terminated)
    }
}

fn main_loop(
    receiver: Receiver<Job>,
    counters: Arc<Counters>,
    ready: Sender<Result<()>>,
    install_signal_handlers: bool,
    search_paths: Vec<PathBuf>,
    hook: Option<StartupHook>,
) {
    // SAFETY: this is the only thread that ever initializes the interpreter.
    let started = unsafe { start_interpreter(install_signal_handlers, &search_paths, hook) };
    let mut tstate = match started {
        Ok(tstate) => {
            let _ = ready.send(Ok(()));
            tstate
        }
        Err(e) => {
            error!("python main thread failed to start: {}", e);
            let _ = ready.send(Err(e));
            return;
        }
    };
    drop(ready);

    while let Ok(job) = receiver.recv() {
        // The lock is released between jobs so threads started from Python code
        // can make progress while the queue is idle.
        unsafe { ffi::PyEval_RestoreThread(tstate) };
        gil::set_held(true);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            // SAFETY: the lock was re-acquired above and is held until SaveThread.
            job(unsafe { Gil::assume() })
        }));
        if let Err(payload) = outcome {
            counters.panicked.fetch_add(1, Ordering::Relaxed);
            warn!(
                "job panicked on the python main thread: {}",
                panic_message(&*payload)
            );
            unsafe {
                if !ffi::PyErr_Occurred().is_null() {
                    ffi::PyErr_Clear();
                }
            }
        }
        counters.completed.fetch_add(1, Ordering::Relaxed);

        gil::set_held(false);
        tstate = unsafe { ffi::PyEval_SaveThread() };
    }

    debug!("job queue closed, finalizing the interpreter");
    unsafe {
        ffi::PyEval_RestoreThread(tstate);
        if ffi::Py_FinalizeEx() != 0 {
            warn!("errors occurred while finalizing the python interpreter");
        } else {
            info!("python interpreter finalized");
        }
    }
}

unsafe fn start_interpreter(
    install_signal_handlers: bool,
    search_paths: &[PathBuf],
    hook: Option<StartupHook>,
) -> Result<*mut ffi::PyThreadState> {
    if ffi::Py_IsInitialized() != 0 {
        return Err(MainThreadError::AlreadyInitialized);
    }
    ffi::Py_InitializeEx(if install_signal_handlers { 1 } else { 0 });
    if ffi::Py_IsInitialized() == 0 {
        return Err(MainThreadError::InitFailed(
            "Py_InitializeEx returned without an interpreter".to_string(),
        ));
    }

    gil::set_held(true);
    let gil = Gil::assume();
    let paths: Vec<String> = search_paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    let mut result = path::append_paths(gil, &paths);
    if let (true, Some(hook)) = (result.is_ok(), hook) {
        result = match panic::catch_unwind(AssertUnwindSafe(|| hook(gil))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(msg)) => Err(MainThreadError::InitFailed(msg)),
            Err(payload) => Err(MainThreadError::InitFailed(panic_message(&*payload))),
        };
    }
    gil::set_held(false);

    if let Err(e) = result {
        ffi::Py_FinalizeEx();
        return Err(e);
    }
    Ok(ffi::PyEval_SaveThread())
}

fn broker() -> &'static Broker {
    match BROKER.get_or_try_init(|| Broker::start(&InterpreterConfig::default(), None)) {
        Ok(broker) => broker,
        // Without an owning thread nothing in the process can reach the interpreter.
        Err(e) => panic!("cannot start the python main thread: {}", e),
    }
}

/// Start the owning thread with `config`.
///
/// Fails with [`MainThreadError::AlreadyStarted`] if the broker is already running
/// (including when a previous [`exec`] started it with the default configuration),
/// and with [`MainThreadError::AlreadyInitialized`] if something else in the
/// process initialized the interpreter first.
pub fn initialize(config: &InterpreterConfig) -> Result<()> {
    initialize_with(config, None)
}

/// Like [`initialize`], running `hook` on the owning thread before the first job.
pub fn initialize_with(config: &InterpreterConfig, hook: Option<StartupHook>) -> Result<()> {
    let mut started = false;
    BROKER.get_or_try_init(|| {
        started = true;
        Broker::start(config, hook)
    })?;
    if started {
        Ok(())
    } else {
        Err(MainThreadError::AlreadyStarted)
    }
}

/// Whether the broker has been started and not terminated
pub fn is_running() -> bool {
    BROKER
        .get()
        .map(|b| b.sender.read().is_some())
        .unwrap_or(false)
}

/// Current counters; all zero before the broker starts.
pub fn stats() -> BrokerStats {
    match BROKER.get() {
        Some(b) => BrokerStats {
            submitted: b.counters.submitted.load(Ordering::Relaxed),
            completed: b.counters.completed.load(Ordering::Relaxed),
            panicked: b.counters.panicked.load(Ordering::Relaxed),
        },
        None => BrokerStats::default(),
    }
}

/// Queue `f` to run on the owning thread and return immediately.
///
/// Starts the broker with the default configuration if nothing started it yet.
/// A panic inside `f` is logged and swallowed by the dispatch loop.
pub fn exec<F>(f: F) -> Result<()>
where
    F: for<'py> FnOnce(Gil<'py>) + Send + 'static,
{
    broker().submit(Box::new(f))
}

/// Run `f` on the owning thread and block until it returns its result.
///
/// A panic inside `f` is reported as [`MainThreadError::JobPanicked`].
pub fn exec_sync<F, R>(f: F) -> Result<R>
where
    F: for<'py> FnOnce(Gil<'py>) -> R + Send + 'static,
    R: Send + 'static,
{
    if gil::is_main_thread() {
        return Err(MainThreadError::Reentrant);
    }

    let (tx, rx) = bounded::<Result<R>>(1);
    exec(move |py| {
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(py))).map_err(|payload| {
            let msg = panic_message(&*payload);
            debug!("synchronous job panicked: {}", msg);
            if let Some(b) = BROKER.get() {
                b.counters.panicked.fetch_add(1, Ordering::Relaxed);
            }
            MainThreadError::JobPanicked(msg)
        });
        let _ = tx.send(result);
    })?;

    rx.recv().map_err(|_| MainThreadError::Terminated)?
}

/// Close the queue, let the owning thread drain it, and finalize the interpreter.
///
/// Later submissions fail with [`MainThreadError::Terminated`]. Calling this more
/// than once, or before the broker started, is a no-op.
pub fn terminate() -> Result<()> {
    let broker = match BROKER.get() {
        Some(b) => b,
        None => return Ok(()),
    };
    if gil::is_main_thread() {
        return Err(MainThreadError::Reentrant);
    }

    let sender = broker.sender.write().take();
    if sender.is_none() {
        return Ok(());
    }
    drop(sender);

    let handle = broker.handle.lock().take();
    if let Some(handle) = handle {
        handle
            .join()
            .map_err(|payload| MainThreadError::JobPanicked(panic_message(&*payload)))?;
    }
    info!("python main thread terminated");
    Ok(())
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
