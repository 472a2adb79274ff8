//! Core service
//!
//! Wires the configuration registry, the repositories selected by its core
//! section and the managers together. While running, the configuration is
//! locked against updates.

use crate::data_manager::DataManager;
use crate::error::CoreError;
use crate::task::TaskModel;
use crate::task_manager::TaskManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weft_data::{DataNode, StorageRegistry};
use weft_model::{Config, RepositoryType};
use weft_repository::{FileRepository, MemoryRepository, Repository};

/// Entry point owning the managers of one process
#[derive(Debug)]
pub struct Core {
    config: Arc<Config>,
    data: DataManager,
    tasks: TaskManager,
    running: AtomicBool,
}

impl Core {
    /// Create core with the built-in storage backends
    ///
    /// # Errors
    /// Returns error if the stored entities cannot be indexed
    pub fn new(config: Arc<Config>) -> Result<Self, CoreError> {
        let storage = StorageRegistry::with_defaults(config.core().storage_folder);
        Self::with_storage(config, storage)
    }

    /// Create core with a custom backend registry
    ///
    /// # Errors
    /// Returns error if the stored entities cannot be indexed
    pub fn with_storage(config: Arc<Config>, storage: StorageRegistry) -> Result<Self, CoreError> {
        let section = config.core();
        let (data_repo, task_repo): (Arc<dyn Repository<DataNode>>, Arc<dyn Repository<TaskModel>>) =
            match section.repository_type {
                RepositoryType::Filesystem => (
                    Arc::new(FileRepository::<DataNode>::new(&section.storage_folder)),
                    Arc::new(FileRepository::<TaskModel>::new(&section.storage_folder)),
                ),
                RepositoryType::Memory => (
                    Arc::new(MemoryRepository::<DataNode>::new()),
                    Arc::new(MemoryRepository::<TaskModel>::new()),
                ),
            };

        let data = DataManager::new(data_repo, Arc::new(storage))?;
        let tasks = TaskManager::new(task_repo, data.clone())?;
        tracing::debug!(
            storage_folder = %section.storage_folder.display(),
            repository_type = ?section.repository_type,
            "Core initialized"
        );

        Ok(Self {
            config,
            data,
            tasks,
            running: AtomicBool::new(false),
        })
    }

    /// Start the service
    ///
    /// Checks the configuration against the registered backends, then
    /// blocks configuration updates until [`Core::stop`].
    ///
    /// # Errors
    /// Returns [`CoreError::CoreServiceAlreadyRunning`] when already running,
    /// [`CoreError::InvalidConfiguration`] when the checks fail
    pub fn run(&self) -> Result<(), CoreError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CoreError::CoreServiceAlreadyRunning);
        }

        let issues = self.config.check(&self.data.storage().storage_types());
        if !issues.is_empty() {
            self.running.store(false, Ordering::SeqCst);
            for issue in &issues {
                tracing::warn!(config_id = %issue.config_id, "{}", issue.message);
            }
            return Err(CoreError::InvalidConfiguration(issues));
        }

        self.config.block_update();
        tracing::info!("Core service has been started");
        Ok(())
    }

    /// Stop the service and unblock configuration updates
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.config.unblock_update();
            tracing::info!("Core service has been stopped");
        }
    }

    /// Whether [`Core::run`] succeeded and [`Core::stop`] was not called
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Configuration registry
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Data node manager
    #[inline]
    #[must_use]
    pub fn data_manager(&self) -> &DataManager {
        &self.data
    }

    /// Task manager
    #[inline]
    #[must_use]
    pub fn task_manager(&self) -> &TaskManager {
        &self.tasks
    }
}
