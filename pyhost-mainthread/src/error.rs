//! Error types for the execution broker

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MainThreadError {
    #[error("the python main thread has already been started")]
    AlreadyStarted,

    #[error("the python interpreter was initialized outside of the main thread")]
    AlreadyInitialized,

    #[error("cannot spawn the python main thread: {0}")]
    Spawn(String),

    #[error("cannot initialize the python interpreter: {0}")]
    InitFailed(String),

    #[error("the python main thread has been terminated")]
    Terminated,

    #[error("cannot wait for a job from inside another job on the python main thread")]
    Reentrant,

    #[error("job panicked: {0}")]
    JobPanicked(String),

    #[error("cannot update sys.path: {0}")]
    SysPath(String),
}

pub type Result<T> = std::result::Result<T, MainThreadError>;

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
