//! Testing utilities for weft workspace
//!
//! Shared test helpers and fixtures.

#![allow(missing_docs)]

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use weft_core::{DataManager, TaskManager, TaskModel};
use weft_data::{DataNode, StorageRegistry};
use weft_model::{DataNodeConfig, FunctionRef, Scope, TaskConfig};
use weft_repository::{FileRepository, MemoryRepository, Repository};

/// Install a test subscriber honouring `RUST_LOG`; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Managers persisting to a temporary folder
///
/// The folder lives as long as the fixture.
pub struct FileFixture {
    pub dir: TempDir,
    pub data: DataManager,
    pub tasks: TaskManager,
}

impl FileFixture {
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let (data, tasks) = file_managers(dir.path());
        Self { dir, data, tasks }
    }

    /// Fresh managers and repositories over the same folder
    pub fn reopen(&self) -> (DataManager, TaskManager) {
        file_managers(self.dir.path())
    }
}

impl Default for FileFixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn file_managers(root: &Path) -> (DataManager, TaskManager) {
    let data_repo: Arc<dyn Repository<DataNode>> = Arc::new(FileRepository::<DataNode>::new(root));
    let task_repo: Arc<dyn Repository<TaskModel>> = Arc::new(FileRepository::<TaskModel>::new(root));
    managers(data_repo, task_repo, root)
}

/// Managers over in-memory repositories; generated files go to `storage_folder`
pub fn memory_managers(storage_folder: &Path) -> (DataManager, TaskManager) {
    init_tracing();
    managers(
        Arc::new(MemoryRepository::<DataNode>::new()),
        Arc::new(MemoryRepository::<TaskModel>::new()),
        storage_folder,
    )
}

pub fn managers(
    data_repo: Arc<dyn Repository<DataNode>>,
    task_repo: Arc<dyn Repository<TaskModel>>,
    storage_folder: &Path,
) -> (DataManager, TaskManager) {
    let storage = Arc::new(StorageRegistry::with_defaults(storage_folder));
    let data = DataManager::new(data_repo, storage).unwrap();
    let tasks = TaskManager::new(task_repo, data.clone()).unwrap();
    (data, tasks)
}

pub fn csv_config(id: &str, path: &str) -> DataNodeConfig {
    DataNodeConfig::new(id)
        .unwrap()
        .with_storage_type("csv")
        .with_property("path", path)
        .with_property("has_header", true)
}

pub fn pickle_config(id: &str, scope: Scope) -> DataNodeConfig {
    DataNodeConfig::new(id).unwrap().with_scope(scope)
}

pub fn in_memory_config(id: &str, scope: Scope) -> DataNodeConfig {
    DataNodeConfig::new(id)
        .unwrap()
        .with_storage_type("in_memory")
        .with_scope(scope)
}

pub fn task_config(id: &str, inputs: Vec<DataNodeConfig>, outputs: Vec<DataNodeConfig>) -> TaskConfig {
    let mut config = TaskConfig::new(id, FunctionRef::parse("pipelines::run").unwrap()).unwrap();
    for input in inputs {
        config = config.with_input(input);
    }
    for output in outputs {
        config = config.with_output(output);
    }
    config
}
