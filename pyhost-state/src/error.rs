//! Error types for pyhost-state

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("pystate is already terminated")]
    AlreadyTerminated,

    #[error("'{0}' parameter is missing")]
    MissingParam(&'static str),

    #[error("'{key}' parameter must be {expected}, not {actual}")]
    InvalidParam {
        key: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("batch_train_size must be greater than 0, got {0}")]
    InvalidBatchSize(i64),

    #[error("save of the ML state must return a blob, got {0}")]
    InvalidSaveResult(&'static str),

    #[error("unsupported format version of pystate container: {0}")]
    UnsupportedVersion(u8),

    #[error("size of the pystate header must be greater than 0")]
    EmptyHeader,

    #[error("pystate header is truncated: expected {expected} bytes")]
    TruncatedHeader { expected: u32 },

    #[error("invalid pystate header: {0}")]
    Header(#[from] bincode::Error),

    #[error("cannot {action} a temporary file: {source}")]
    TempFile {
        action: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("'{0}' state type is already registered")]
    AlreadyRegistered(String),

    #[error("'{0}' state type is not registered")]
    NotRegistered(String),

    #[error("state '{0}' already exists")]
    StateExists(String),

    #[error("state '{0}' is not found")]
    StateNotFound(String),

    #[error("state '{0}' isn't an ML state")]
    NotMlState(String),

    #[error("state is not writable")]
    NotWritable,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Python(#[from] pyhost::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;
