//! weft Data
//!
//! The data node entity and the storage backends its `storage_type` selects.
//!
//! # Overview
//!
//! - **DataNode**: identity, scope and edit tracking of one data container
//! - **StorageBackend**: seeds properties at creation, reads and writes data
//! - **StorageRegistry**: tag → backend dispatch, open to registration

#![warn(missing_docs)]

pub mod data_node;
pub mod error;
pub mod storage;

// Re-exports
pub use data_node::{CsvDataNode, DataNode, CACHEABLE_PROPERTY};
pub use error::DataError;
pub use storage::{
    CsvBackend, InMemoryBackend, PickleBackend, Seed, StorageBackend, StorageRegistry,
    DEFAULT_DATA_PROPERTY,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
