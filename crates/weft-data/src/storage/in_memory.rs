//! In-memory backend
//!
//! Data lives in a process-wide map keyed by data node id, so every manager
//! of the process sees the same values.

use super::{take_default_data, Seed, StorageBackend};
use crate::data_node::DataNode;
use crate::error::DataError;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde_json::Value;
use weft_model::{DataNodeId, Properties};

/// Tag of this backend
pub const STORAGE_TYPE: &str = "in_memory";

static DATA: Lazy<DashMap<String, Value>> = Lazy::new(DashMap::new);

/// Backend keeping data in process memory
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryBackend;

impl InMemoryBackend {
    /// Create backend
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StorageBackend for InMemoryBackend {
    fn storage_type(&self) -> &str {
        STORAGE_TYPE
    }

    fn init(&self, _id: &DataNodeId, properties: &mut Properties) -> Result<Seed, DataError> {
        Ok(take_default_data(properties).map_or(Seed::Empty, Seed::Data))
    }

    fn read(&self, node: &DataNode) -> Result<Value, DataError> {
        DATA.get(node.id().as_str())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DataError::NoData(node.id().to_string()))
    }

    fn write(&self, node: &DataNode, data: &Value) -> Result<(), DataError> {
        DATA.insert(node.id().as_str().to_string(), data.clone());
        Ok(())
    }

    fn discard(&self, node: &DataNode) -> Result<(), DataError> {
        if DATA.remove(node.id().as_str()).is_some() {
            tracing::debug!(id = %node.id(), "Evicted in-memory data");
        }
        Ok(())
    }
}
