//! A state wrapping a Python model that is trained in batches
//!
//! The Python class provides:
//!
//! ```python
//! class Model(object):
//!     def __init__(self, model_path, gpu_id): ...
//!
//!     def fit(self, rows): ...      # rows is a list of written values
//!
//!     def predict(self, value): ...
//!
//!     def save(self): ...           # returns bytes or bytearray
//!
//!     def load(self, blob): ...     # blob is a bytearray
//! ```
//!
//! Unlike [`Base`](crate::Base) the saved form is only what `save` returns,
//! without a header.

use crate::error::{Result, StateError};
use crate::params::{optional, required, CLASS_NAME, MODULE_NAME, MODULE_PATH};
use parking_lot::{Mutex, RwLock};
use pyhost::{load_module, Instance, Map, Value};
use std::io::{Read, Write};
use tracing::debug;

pub const BATCH_TRAIN_SIZE: &str = "batch_train_size";
pub const MODEL_FILE_PATH: &str = "model_file_path";
pub const GPU_ID: &str = "gpu_id";

pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Parameters of an [`MlState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MlParams {
    pub module_path: String,
    pub module_name: String,
    pub class_name: String,
    /// Rows collected by `write` before `fit` runs
    pub batch_size: usize,
    /// Passed to the constructor; its meaning is up to the class
    pub model_path: String,
    /// Passed to the constructor; `-1` means no GPU
    pub gpu_id: i64,
}

impl MlParams {
    pub fn new(module_name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            module_path: String::new(),
            module_name: module_name.into(),
            class_name: class_name.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            model_path: String::new(),
            gpu_id: -1,
        }
    }

    pub fn with_module_path(mut self, path: impl Into<String>) -> Self {
        self.module_path = path.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_model_path(mut self, path: impl Into<String>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_gpu_id(mut self, gpu_id: i64) -> Self {
        self.gpu_id = gpu_id;
        self
    }

    /// Read the parameters out of `params`.
    ///
    /// `module_name` and `class_name` are required. `batch_train_size`
    /// defaults to 10 and must be positive, `model_file_path` defaults to
    /// empty and `gpu_id` to -1.
    pub fn extract(params: &Map) -> Result<Self> {
        let batch_size = match optional_int(params, BATCH_TRAIN_SIZE)? {
            Some(n) if n <= 0 => return Err(StateError::InvalidBatchSize(n)),
            Some(n) => n as usize,
            None => DEFAULT_BATCH_SIZE,
        };
        Ok(Self {
            module_path: optional(params, MODULE_PATH)?,
            module_name: required(params, MODULE_NAME)?,
            class_name: required(params, CLASS_NAME)?,
            batch_size,
            model_path: optional(params, MODEL_FILE_PATH)?,
            gpu_id: optional_int(params, GPU_ID)?.unwrap_or(-1),
        })
    }
}

fn optional_int(params: &Map, key: &'static str) -> Result<Option<i64>> {
    match params.get(key) {
        None => Ok(None),
        Some(Value::Int(n)) => Ok(Some(*n)),
        Some(other) => Err(StateError::InvalidParam {
            key,
            expected: "an int",
            actual: other.type_name(),
        }),
    }
}

/// A model trained from written rows.
///
/// Rows passed to [`write`](MlState::write) are kept until `batch_size` of
/// them have arrived, then handed to `fit` in one call. Writes are serialized
/// so every row ends up in exactly one batch.
#[derive(Debug)]
pub struct MlState {
    params: MlParams,
    // Lock order: bucket, then instance.
    bucket: Mutex<Vec<Value>>,
    instance: RwLock<Option<Instance>>,
}

impl MlState {
    /// Construct `Class(model_path, gpu_id)`.
    pub fn new(params: MlParams) -> Result<Self> {
        if !params.module_path.is_empty() {
            pyhost::append_sys_path([&params.module_path])?;
        }
        let module = load_module(&params.module_name)?;
        let args = [
            Value::String(params.model_path.clone()),
            Value::Int(params.gpu_id),
        ];
        let instance = module.new_instance(&params.class_name, &args, None)?;
        debug!(
            module = %params.module_name,
            class = %params.class_name,
            batch_size = params.batch_size,
            "created python ML state"
        );
        Ok(Self {
            bucket: Mutex::new(Vec::with_capacity(params.batch_size)),
            instance: RwLock::new(Some(instance)),
            params,
        })
    }

    pub fn params(&self) -> &MlParams {
        &self.params
    }

    /// Rows written since the last `fit`
    pub fn pending(&self) -> usize {
        self.bucket.lock().len()
    }

    pub fn is_terminated(&self) -> bool {
        self.instance.read().is_none()
    }

    /// Call a method of the Python model.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        let instance = self.instance.read();
        let instance = instance.as_ref().ok_or(StateError::AlreadyTerminated)?;
        Ok(instance.call(method, args)?)
    }

    /// Add a row to the current batch.
    ///
    /// When the batch is full it is passed to `fit` and emptied, and the
    /// result of `fit` is returned. The batch is emptied even when `fit` fails.
    pub fn write(&self, row: &Value) -> Result<Option<Value>> {
        let mut bucket = self.bucket.lock();
        if self.is_terminated() {
            return Err(StateError::AlreadyTerminated);
        }
        bucket.push(row.clone());
        if bucket.len() < self.params.batch_size {
            return Ok(None);
        }
        let rows = std::mem::replace(&mut *bucket, Vec::with_capacity(self.params.batch_size));
        let result = self.fit(&rows)?;
        self.log_progress(&result);
        Ok(Some(result))
    }

    /// Call `fit` with `rows` right away.
    pub fn fit(&self, rows: &[Value]) -> Result<Value> {
        self.call("fit", &[Value::Array(rows.to_vec())])
    }

    /// [`fit`](MlState::fit) for rows given as maps.
    pub fn fit_maps(&self, rows: &[Map]) -> Result<Value> {
        let rows: Vec<Value> = rows.iter().cloned().map(Value::Map).collect();
        self.fit(&rows)
    }

    pub fn predict(&self, value: &Value) -> Result<Value> {
        self.call("predict", std::slice::from_ref(value))
    }

    /// Write the blob returned by the model's `save()`.
    pub fn save<W: Write>(&self, w: &mut W, _params: &Map) -> Result<()> {
        match self.call("save", &[])? {
            Value::Blob(blob) => {
                w.write_all(&blob)?;
                debug!(bytes = blob.len(), class = %self.params.class_name, "saved ML state");
                Ok(())
            }
            other => Err(StateError::InvalidSaveResult(other.type_name())),
        }
    }

    /// Pass everything left in `r` to the model's `load(blob)`.
    pub fn load<R: Read>(&self, r: &mut R, _params: &Map) -> Result<()> {
        let mut blob = Vec::new();
        r.read_to_end(&mut blob)?;
        self.call("load", &[Value::Blob(blob)])?;
        Ok(())
    }

    /// Release the model and drop unfitted rows. Terminating twice is fine.
    pub fn terminate(&self) -> Result<()> {
        let mut bucket = self.bucket.lock();
        bucket.clear();
        if let Some(mut instance) = self.instance.write().take() {
            instance.release().map_err(pyhost::Error::from)?;
        }
        Ok(())
    }

    // fit may report `loss` and `accuracy` summed over the batch.
    fn log_progress(&self, result: &Value) {
        let (Ok(loss), Ok(accuracy)) = (
            result.get("loss").and_then(Value::as_float),
            result.get("accuracy").and_then(Value::as_float),
        ) else {
            return;
        };
        let n = self.params.batch_size as f64;
        debug!(
            loss = loss / n,
            accuracy = accuracy / n,
            class = %self.params.class_name,
            "fitted batch"
        );
    }
}

#[cfg(test)]
#[path = "ml_tests.rs"]
mod tests;
