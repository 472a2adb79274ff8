//! Task manager

use crate::data_manager::DataManager;
use crate::entity::EntityManager;
use crate::error::CoreError;
use crate::resolution::ResolutionIndex;
use crate::synced::Synced;
use crate::task::{Task, TaskHydrator, TaskModel};
use std::sync::Arc;
use weft_data::DataNode;
use weft_model::{ResolutionKey, Scope, TaskConfig};
use weft_repository::Repository;

/// Manager of task entities
///
/// Data nodes are resolved and hydrated through the wrapped
/// [`DataManager`].
#[derive(Debug, Clone)]
pub struct TaskManager {
    entities: EntityManager<Task>,
    data: DataManager,
    index: Arc<ResolutionIndex>,
}

impl TaskManager {
    /// Create manager over `repository`, indexing the tasks it holds
    ///
    /// # Errors
    /// Returns error if the stored tasks cannot be listed
    pub fn new(repository: Arc<dyn Repository<TaskModel>>, data: DataManager) -> Result<Self, CoreError> {
        let manager = Self {
            entities: EntityManager::new(repository, Arc::new(TaskHydrator::new(data.clone()))),
            data,
            index: Arc::new(ResolutionIndex::new()),
        };
        manager.rebuild_index()?;
        Ok(manager)
    }

    /// Create and persist a task over already resolved data nodes
    ///
    /// # Errors
    /// Returns error if the configuration id is invalid or the task cannot
    /// be persisted
    pub fn create_and_set(
        &self,
        config: &TaskConfig,
        inputs: Vec<DataNode>,
        outputs: Vec<DataNode>,
        parent_id: Option<&str>,
    ) -> Result<Task, CoreError> {
        let task = Task::new(config.id(), config.function().clone(), inputs, outputs)?
            .with_parent_id(parent_id.map(str::to_string));
        let key = ResolutionKey::from_parent(config.id(), task.scope(), parent_id);
        self.persist(task, key)
    }

    /// Return the task matching the configuration and parents, creating it
    /// and its data nodes on a miss
    ///
    /// # Errors
    /// Returns error if a data node or the task cannot be created
    pub fn get_or_create(
        &self,
        config: &TaskConfig,
        scenario_id: Option<&str>,
        pipeline_id: Option<&str>,
    ) -> Result<Task, CoreError> {
        let resolve = |configs: &[weft_model::DataNodeConfig]| {
            configs
                .iter()
                .map(|dn| self.data.get_or_create(dn, scenario_id, pipeline_id))
                .collect::<Result<Vec<_>, _>>()
        };
        let inputs = resolve(config.inputs())?;
        let outputs = resolve(config.outputs())?;

        let scope = Scope::broadest(inputs.iter().chain(&outputs).map(DataNode::scope))
            .unwrap_or(Scope::Global);
        let key = ResolutionKey::new(config.id(), scope, scenario_id, pipeline_id);

        self.index.with_lock(&key.clone(), || {
            if let Some(task) = self.lookup(&key)? {
                tracing::debug!(id = %task.id(), %key, "Reusing task");
                return Ok(task);
            }

            let parent_id = key.parent_id(scope).map(str::to_string);
            let task = Task::new(config.id(), config.function().clone(), inputs, outputs)?
                .with_parent_id(parent_id);
            self.persist(task, key)
        })
    }

    /// Look a task up by id or by reference
    ///
    /// Data nodes deleted since the task was stored are left out of it.
    ///
    /// # Errors
    /// Returns error on repository failures other than absence
    pub fn get(&self, id: impl AsRef<str>) -> Result<Option<Task>, CoreError> {
        self.entities.get(id)
    }

    /// Load a task, failing when absent
    ///
    /// # Errors
    /// Returns a not-found error when the task is absent
    pub fn load(&self, id: impl AsRef<str>) -> Result<Task, CoreError> {
        self.entities.load(id.as_ref())
    }

    /// Upsert the full state of `task`
    ///
    /// # Errors
    /// Returns error if the repository cannot persist the task
    pub fn set(&self, task: &Task) -> Result<(), CoreError> {
        self.entities.set(task)
    }

    /// Every stored task
    ///
    /// # Errors
    /// Returns error if a task cannot be loaded or hydrated
    pub fn get_all(&self) -> Result<Vec<Task>, CoreError> {
        self.entities.get_all()
    }

    /// Delete one task; its data nodes are kept
    ///
    /// # Errors
    /// Returns a not-found error when absent
    pub fn delete(&self, id: impl AsRef<str>) -> Result<(), CoreError> {
        let id = id.as_ref();
        self.entities.delete(id)?;
        self.index.remove_id(id);
        tracing::info!(%id, "Deleted task");
        Ok(())
    }

    /// Delete every task
    ///
    /// # Errors
    /// Returns error if the repository cannot be cleared
    pub fn delete_all(&self) -> Result<(), CoreError> {
        self.entities.delete_all()?;
        self.index.clear();
        tracing::info!("Deleted all tasks");
        Ok(())
    }

    /// Wrap a task for read-refresh / write-through access
    #[must_use]
    pub fn synced(&self, task: Task) -> Synced<Task> {
        Synced::new(self.entities.clone(), task)
    }

    /// Data manager used for data nodes
    #[inline]
    #[must_use]
    pub fn data_manager(&self) -> &DataManager {
        &self.data
    }

    fn persist(&self, mut task: Task, key: ResolutionKey) -> Result<Task, CoreError> {
        task.set_resolution_key(Some(key.clone()));
        self.entities.set(&task)?;
        self.index.insert(key, task.id().as_str());
        tracing::info!(
            id = %task.id(),
            config_id = task.config_id(),
            scope = %task.scope(),
            "Created task"
        );
        Ok(task)
    }

    /// Task created under `key` whose data nodes all still exist
    ///
    /// A task missing one of its nodes is stale: it stays stored but is no
    /// longer returned for the key.
    fn lookup(&self, key: &ResolutionKey) -> Result<Option<Task>, CoreError> {
        if let Some(id) = self.index.get(key) {
            if let Some(model) = self.entities.get_model(&id)? {
                if self.is_intact(&model)? {
                    return self.entities.hydrate(model).map(Some);
                }
                tracing::debug!(%id, %key, "Skipping task with deleted data nodes");
            }
            self.index.remove_id(&id);
        }

        let mut found = None;
        for model in self.entities.get_all_models()? {
            let Some(model_key) = model.resolution_key.clone() else {
                continue;
            };
            if model_key == *key {
                if found.is_none() && self.is_intact(&model)? {
                    found = Some(model);
                }
                continue;
            }
            self.index.insert_if_absent(model_key, model.id.as_str());
        }

        match found {
            Some(model) => {
                self.index.insert(key.clone(), model.id.as_str());
                self.entities.hydrate(model).map(Some)
            }
            None => Ok(None),
        }
    }

    fn is_intact(&self, model: &TaskModel) -> Result<bool, CoreError> {
        for id in model.data_node_ids() {
            if !self.data.exists(id)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn rebuild_index(&self) -> Result<(), CoreError> {
        for model in self.entities.get_all_models()? {
            if let Some(key) = model.resolution_key {
                self.index.insert_if_absent(key, model.id.into_inner());
            }
        }
        tracing::debug!(indexed = self.index.len(), "Rebuilt task index");
        Ok(())
    }
}
