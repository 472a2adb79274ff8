//! Storage backends
//!
//! A data node's `storage_type` tag selects the [`StorageBackend`] that seeds
//! its properties at creation and moves its data in and out.
//!
//! Built-in tags:
//! - `csv`: rows of a CSV file
//! - `in_memory`: process-wide map, lost on exit
//! - `pickle`: opaque serialized file

pub mod csv;
pub mod in_memory;
pub mod pickle;

use crate::data_node::DataNode;
use crate::error::DataError;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;
use weft_model::{DataNodeId, Properties};

pub use self::csv::CsvBackend;
pub use self::in_memory::InMemoryBackend;
pub use self::pickle::PickleBackend;

/// Property whose value becomes the initial data of a node
pub const DEFAULT_DATA_PROPERTY: &str = "default_data";

/// Initial state decided by a backend when a node is created
#[derive(Debug, Clone, PartialEq)]
pub enum Seed {
    /// Nothing to read yet
    Empty,
    /// Write this value as the first edit
    Data(Value),
    /// Data already exists in the backing store
    Existing,
}

/// Storage variant of a data node
pub trait StorageBackend: Debug + Send + Sync {
    /// Tag selecting this backend
    fn storage_type(&self) -> &str;

    /// Validate and complete the properties copied from the configuration
    ///
    /// # Errors
    /// Returns [`DataError::MissingRequiredProperty`] when the configuration
    /// lacks a property the backend needs
    fn init(&self, id: &DataNodeId, properties: &mut Properties) -> Result<Seed, DataError>;

    /// Read the data of `node`
    ///
    /// # Errors
    /// Returns [`DataError::NoData`] when nothing was written
    fn read(&self, node: &DataNode) -> Result<Value, DataError>;

    /// Replace the data of `node`
    ///
    /// # Errors
    /// Returns error if the backend cannot store `data`
    fn write(&self, node: &DataNode, data: &Value) -> Result<(), DataError>;

    /// Release what the backend holds for a deleted `node`
    ///
    /// File-backed data outlives its node, so the default keeps everything.
    ///
    /// # Errors
    /// Returns error if the backend cannot release the data
    fn discard(&self, _node: &DataNode) -> Result<(), DataError> {
        Ok(())
    }
}

/// Take the `default_data` property out of `properties`
pub(crate) fn take_default_data(properties: &mut Properties) -> Option<Value> {
    properties.shift_remove(DEFAULT_DATA_PROPERTY)
}

/// Tag → backend map
#[derive(Debug, Clone, Default)]
pub struct StorageRegistry {
    backends: IndexMap<String, Arc<dyn StorageBackend>>,
}

impl StorageRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            backends: IndexMap::new(),
        }
    }

    /// Create registry with the built-in backends
    ///
    /// File-based backends place generated files under `storage_folder`.
    #[must_use]
    pub fn with_defaults(storage_folder: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new();
        registry.register(CsvBackend::new());
        registry.register(InMemoryBackend::new());
        registry.register(PickleBackend::new(storage_folder));
        registry
    }

    /// Register a backend under its tag, replacing any previous one
    pub fn register(&mut self, backend: impl StorageBackend + 'static) -> Option<Arc<dyn StorageBackend>> {
        let tag = backend.storage_type().to_string();
        self.backends.insert(tag, Arc::new(backend))
    }

    /// Backend registered under `storage_type`
    #[inline]
    #[must_use]
    pub fn get(&self, storage_type: &str) -> Option<&Arc<dyn StorageBackend>> {
        self.backends.get(storage_type)
    }

    /// Check if a backend is registered under `storage_type`
    #[inline]
    #[must_use]
    pub fn contains(&self, storage_type: &str) -> bool {
        self.backends.contains_key(storage_type)
    }

    /// Registered tags, in registration order
    #[must_use]
    pub fn storage_types(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    /// Get number of registered backends
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
