//! Runtime configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a JSON configuration file
pub const CONFIG_ENV_VAR: &str = "PYHOST_CONFIG";

/// Errors raised while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Interpreter startup configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Name of the thread that owns the interpreter
    pub thread_name: String,
    /// Stack size for the owning thread (None = platform default for spawned threads)
    pub stack_size: Option<usize>,
    /// Let the interpreter install its own signal handlers (SIGINT etc.)
    pub install_signal_handlers: bool,
    /// Directories appended to `sys.path` before the first job runs
    pub search_paths: Vec<PathBuf>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            thread_name: "pyhost-main".to_string(),
            stack_size: Some(8 * 1024 * 1024), // same as a typical process main thread
            install_signal_handlers: false,
            search_paths: vec![],
        }
    }
}

/// Shared state persistence configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory for the temporary files used by save/load (None = system temp dir)
    pub temp_dir: Option<PathBuf>,
}

/// Runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Interpreter configuration
    pub interpreter: InterpreterConfig,
    /// State configuration
    pub state: StateConfig,
}

impl RuntimeConfig {
    /// Create a new runtime configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Development configuration: the working directory is importable
    pub fn development() -> Self {
        Self {
            interpreter: InterpreterConfig {
                search_paths: vec![PathBuf::from(".")],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Production configuration with a larger interpreter stack
    pub fn production() -> Self {
        Self {
            interpreter: InterpreterConfig {
                stack_size: Some(16 * 1024 * 1024), // 16MB
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Append a directory to the interpreter search path
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter.search_paths.push(path.into());
        self
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the file named by `PYHOST_CONFIG`, or the defaults when it is unset
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => {
                tracing::debug!(path = ?path, "loading config from {}", CONFIG_ENV_VAR);
                Self::from_file(PathBuf::from(path))
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
