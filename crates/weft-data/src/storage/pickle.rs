//! Pickle backend
//!
//! Stores any JSON value in a file of its own. The file is the `path`
//! property when given, `<storage_folder>/pickles/<id>.p` otherwise.

use super::{take_default_data, Seed, StorageBackend};
use crate::data_node::DataNode;
use crate::error::DataError;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use weft_model::{DataNodeId, Properties};

/// Tag of this backend
pub const STORAGE_TYPE: &str = "pickle";

/// Optional property: file path
pub const PATH_PROPERTY: &str = "path";

const FOLDER: &str = "pickles";
const EXTENSION: &str = "p";

/// Backend storing opaque serialized files
#[derive(Debug, Clone)]
pub struct PickleBackend {
    storage_folder: PathBuf,
}

impl PickleBackend {
    /// Create backend generating files under `storage_folder`
    #[must_use]
    pub fn new(storage_folder: impl Into<PathBuf>) -> Self {
        Self {
            storage_folder: storage_folder.into(),
        }
    }

    fn file_path(&self, id: &DataNodeId, properties: &Properties) -> PathBuf {
        match properties.get(PATH_PROPERTY).and_then(Value::as_str) {
            Some(path) => PathBuf::from(path),
            None => self
                .storage_folder
                .join(FOLDER)
                .join(format!("{id}.{EXTENSION}")),
        }
    }

    /// File holding the data of `node`
    #[must_use]
    pub fn path_of(&self, node: &DataNode) -> PathBuf {
        self.file_path(node.id(), node.properties())
    }
}

impl StorageBackend for PickleBackend {
    fn storage_type(&self) -> &str {
        STORAGE_TYPE
    }

    fn init(&self, id: &DataNodeId, properties: &mut Properties) -> Result<Seed, DataError> {
        let default_data = take_default_data(properties);
        if self.file_path(id, properties).is_file() {
            return Ok(Seed::Existing);
        }
        Ok(default_data.map_or(Seed::Empty, Seed::Data))
    }

    fn read(&self, node: &DataNode) -> Result<Value, DataError> {
        let path = self.path_of(node);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DataError::NoData(node.id().to_string()))
            }
            Err(e) => return Err(DataError::io(path, e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write(&self, node: &DataNode, data: &Value) -> Result<(), DataError> {
        let path = self.path_of(node);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
        }
        let bytes = serde_json::to_vec(data)?;
        fs::write(&path, bytes).map_err(|e| DataError::io(&path, e))?;

        tracing::debug!(id = %node.id(), path = %path.display(), "Wrote pickle data");
        Ok(())
    }
}
