//! A Python object that can be saved to and restored from a byte stream
//!
//! The Python class provides:
//!
//! ```python
//! class Model(object):
//!     @staticmethod
//!     def create(params): ...          # or create() when there are no params
//!
//!     def save(self, filepath, params): ...
//!
//!     @staticmethod
//!     def load(filepath, params): ...  # returns a new instance
//! ```
//!
//! # Format
//!
//! | bytes | content                                       |
//! |-------|-----------------------------------------------|
//! | 1     | format version, currently `1`                 |
//! | 4     | header length `n`, little endian              |
//! | n     | bincode encoded [`SavedHeader`]               |
//! | rest  | whatever the Python `save` wrote to its file  |

use crate::error::{Result, StateError};
use crate::params::BaseParams;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use pyhost::{load_module, Instance, Map, Value};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read, Write};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub const FORMAT_VERSION: u8 = 1;

const CREATE_METHOD: &str = "create";
const SAVE_METHOD: &str = "save";
const LOAD_METHOD: &str = "load";

/// Header written in front of the Python payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedHeader {
    pub module_path: String,
    pub module_name: String,
    pub class_name: String,
    pub write_method: String,
}

impl From<&BaseParams> for SavedHeader {
    fn from(params: &BaseParams) -> Self {
        Self {
            module_path: params.module_path.clone(),
            module_name: params.module_name.clone(),
            class_name: params.class_name.clone(),
            write_method: params.write_method.clone(),
        }
    }
}

impl From<SavedHeader> for BaseParams {
    fn from(header: SavedHeader) -> Self {
        Self {
            module_path: header.module_path,
            module_name: header.module_name,
            class_name: header.class_name,
            write_method: header.write_method,
        }
    }
}

/// Shared implementation of [`State`](crate::State) and
/// [`WritableState`](crate::WritableState).
///
/// `Base` does no locking of its own. Methods taking `&self` only need shared
/// access even when the Python object changes; `load` and `terminate` swap the
/// instance and take `&mut self`.
#[derive(Debug)]
pub struct Base {
    params: BaseParams,
    instance: Option<Instance>,
}

impl Base {
    /// Create the Python object with `Class.create(create_params)`.
    ///
    /// `create` is called without arguments when `create_params` is empty.
    pub fn new(params: BaseParams, create_params: &Map) -> Result<Self> {
        let args = if create_params.is_empty() {
            Vec::new()
        } else {
            vec![Value::Map(create_params.clone())]
        };
        let instance = new_instance(CREATE_METHOD, &params, &args)?;
        Ok(Self {
            params,
            instance: Some(instance),
        })
    }

    /// Restore a state written by [`Base::save`].
    pub fn from_reader<R: Read>(r: &mut R, params: &Map) -> Result<Self> {
        let (header, instance) = read_saved(r, params)?;
        Ok(Self {
            params: header.into(),
            instance: Some(instance),
        })
    }

    pub fn params(&self) -> &BaseParams {
        &self.params
    }

    pub fn is_terminated(&self) -> bool {
        self.instance.is_none()
    }

    fn instance(&self) -> Result<&Instance> {
        self.instance.as_ref().ok_or(StateError::AlreadyTerminated)
    }

    /// Call a method of the Python object.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        Ok(self.instance()?.call(method, args)?)
    }

    /// Pass `value` to the write method.
    pub fn write(&self, value: &Value) -> Result<()> {
        let instance = self.instance()?;
        instance.call(&self.params.write_method, std::slice::from_ref(value))?;
        Ok(())
    }

    /// Release the Python object. Terminating twice is fine.
    pub fn terminate(&mut self) -> Result<()> {
        if let Some(mut instance) = self.instance.take() {
            instance.release().map_err(pyhost::Error::from)?;
        }
        Ok(())
    }

    /// Write the header followed by what `save(filepath, params)` produced.
    pub fn save<W: Write>(&self, w: &mut W, params: &Map) -> Result<()> {
        let instance = self.instance()?;
        write_header(w, &self.params)?;

        let temp = temp_file()?;
        let path = temp.path().to_string_lossy().into_owned();
        instance.call(SAVE_METHOD, &[Value::String(path), Value::Map(params.clone())])?;

        let mut saved = File::open(temp.path()).map_err(|source| StateError::TempFile {
            action: "open",
            source,
        })?;
        let n = io::copy(&mut saved, w)?;
        debug!(bytes = n, class = %self.params.class_name, "saved python state");
        remove_temp(temp);
        Ok(())
    }

    /// Replace the Python object with one restored from `r`.
    ///
    /// The current object is kept when loading fails.
    pub fn load<R: Read>(&mut self, r: &mut R, params: &Map) -> Result<()> {
        self.instance()?;
        let (header, instance) = read_saved(r, params)?;
        let old = self.instance.replace(instance);
        self.params = header.into();
        if let Some(mut old) = old {
            old.release().map_err(pyhost::Error::from)?;
        }
        Ok(())
    }
}

fn new_instance(method: &str, params: &BaseParams, args: &[Value]) -> Result<Instance> {
    if !params.module_path.is_empty() {
        pyhost::append_sys_path([&params.module_path])?;
    }
    let module = load_module(&params.module_name)?;
    let class = module.get_class(&params.class_name)?;
    let object = class.call_direct(method, args)?;
    Ok(Instance::from_object(class.origin(), object))
}

fn write_header<W: Write>(w: &mut W, params: &BaseParams) -> Result<()> {
    let header = bincode::serialize(&SavedHeader::from(params))?;
    w.write_u8(FORMAT_VERSION)?;
    w.write_u32::<LittleEndian>(header.len() as u32)?;
    w.write_all(&header)?;
    Ok(())
}

fn read_saved<R: Read>(r: &mut R, params: &Map) -> Result<(SavedHeader, Instance)> {
    let version = r.read_u8()?;
    match version {
        1 => read_v1(r, params),
        other => Err(StateError::UnsupportedVersion(other)),
    }
}

fn read_v1<R: Read>(r: &mut R, params: &Map) -> Result<(SavedHeader, Instance)> {
    let len = r.read_u32::<LittleEndian>()?;
    if len == 0 {
        return Err(StateError::EmptyHeader);
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => StateError::TruncatedHeader { expected: len },
        _ => StateError::Io(e),
    })?;
    let header: SavedHeader = bincode::deserialize(&buf)?;

    let mut temp = temp_file()?;
    io::copy(r, temp.as_file_mut())?;
    temp.as_file_mut().flush()?;

    let path = temp.path().to_string_lossy().into_owned();
    let instance = new_instance(
        LOAD_METHOD,
        &header.clone().into(),
        &[Value::String(path), Value::Map(params.clone())],
    );
    remove_temp(temp);
    Ok((header, instance?))
}

fn temp_file() -> Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("pyhost_state");
    let temp = match &pyhost::config().state.temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    };
    temp.map_err(|source| StateError::TempFile {
        action: "create",
        source,
    })
}

fn remove_temp(temp: NamedTempFile) {
    let path = temp.path().to_path_buf();
    if let Err(e) = temp.close() {
        warn!(path = %path.display(), "cannot remove the temporary file: {}", e);
    }
}

#[cfg(test)]
#[path = "base_tests.rs"]
mod tests;
