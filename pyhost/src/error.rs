//! Error types for pyhost

use crate::exception::{PyError, PyException};
use pyhost_core::{ConfigError, ValueError};
use pyhost_mainthread::MainThreadError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    MainThread(#[from] MainThreadError),

    #[error(transparent)]
    Python(#[from] PyError),

    #[error("unsupported type in pyhost: {0}")]
    UnsupportedType(String),

    #[error("fail to {action} '{name}' {kind}: {source}")]
    Call {
        action: &'static str,
        kind: &'static str,
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("cannot call '{name}' due to panic: {message}")]
    Panic { name: String, message: String },

    #[error("'{0}' is not callable object")]
    NotCallable(String),

    #[error("'{0}' has already been released")]
    Released(String),

    #[error("'{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("'{0}' is not registered")]
    NotRegistered(String),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an error with what was being done to which named thing, e.g.
    /// `context("load", "module", "foo")` reads "fail to load 'foo' module".
    pub fn context(
        self,
        action: &'static str,
        kind: &'static str,
        name: impl Into<String>,
    ) -> Self {
        Error::Call {
            action,
            kind,
            name: name.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, looking through call context
    pub fn root_cause(&self) -> &Error {
        let mut err = self;
        while let Error::Call { source, .. } = err {
            err = source;
        }
        err
    }

    /// The translated Python exception behind this error, if there is one
    pub fn python_exception(&self) -> Option<&PyException> {
        match self.root_cause() {
            Error::Python(PyError::Exception(exc)) => Some(exc),
            _ => None,
        }
    }

    /// Turn a job panic into a regular error naming the failed call
    pub(crate) fn from_job(err: MainThreadError, name: &str) -> Self {
        match err {
            MainThreadError::JobPanicked(message) => Error::Panic {
                name: name.to_string(),
                message,
            },
            other => Error::MainThread(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
