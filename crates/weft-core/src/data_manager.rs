//! Data node manager
//!
//! Creates data nodes from their configuration, resolves them by scope and
//! moves their data through the storage backend their tag selects.
//!
//! # Scope resolution
//!
//! `get_or_create` builds the [`ResolutionKey`] of the configuration for the
//! given parents and returns the node already created under that key, or
//! creates one. The key → id index is rebuilt from the repository on
//! construction and re-scanned on a miss, so nodes persisted by other
//! processes are found.

use crate::entity::{EntityManager, SelfHydrate};
use crate::error::CoreError;
use crate::resolution::ResolutionIndex;
use crate::synced::Synced;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use weft_data::{DataNode, Seed, StorageBackend, StorageRegistry, CACHEABLE_PROPERTY};
use weft_model::{DataNodeConfig, DataNodeId, JobId, ResolutionKey};
use weft_repository::Repository;

/// Manager of data node entities
///
/// Cheap to clone: clones share the repository, the backends and the index.
#[derive(Debug, Clone)]
pub struct DataManager {
    entities: EntityManager<DataNode>,
    storage: Arc<StorageRegistry>,
    index: Arc<ResolutionIndex>,
}

impl DataManager {
    /// Create manager over `repository`, indexing the nodes it holds
    ///
    /// # Errors
    /// Returns error if the stored nodes cannot be listed
    pub fn new(
        repository: Arc<dyn Repository<DataNode>>,
        storage: Arc<StorageRegistry>,
    ) -> Result<Self, CoreError> {
        let manager = Self {
            entities: EntityManager::new(repository, Arc::new(SelfHydrate)),
            storage,
            index: Arc::new(ResolutionIndex::new()),
        };
        manager.rebuild_index()?;
        Ok(manager)
    }

    /// Create and persist a fresh data node
    ///
    /// Every call produces a new id. The node is indexed under the key
    /// derived from its scope and `parent_id`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDataNodeType`] when no backend handles the
    /// configured storage type (nothing is persisted), or a backend error
    /// when the configuration lacks a required property
    pub fn create_and_set(
        &self,
        config: &DataNodeConfig,
        parent_id: Option<&str>,
    ) -> Result<DataNode, CoreError> {
        let key = ResolutionKey::from_parent(config.id(), config.scope(), parent_id);
        self.create(config, parent_id, key)
    }

    /// Return the node matching the configuration and parents, creating it
    /// on a miss
    ///
    /// # Errors
    /// Returns error if creation fails or the repository cannot be read
    pub fn get_or_create(
        &self,
        config: &DataNodeConfig,
        scenario_id: Option<&str>,
        pipeline_id: Option<&str>,
    ) -> Result<DataNode, CoreError> {
        let scope = config.scope();
        let key = ResolutionKey::new(config.id(), scope, scenario_id, pipeline_id);

        self.index.with_lock(&key.clone(), || {
            if let Some(node) = self.lookup(&key)? {
                tracing::debug!(id = %node.id(), %key, "Reusing data node");
                return Ok(node);
            }

            let parent_id = key.parent_id(scope).map(str::to_string);
            self.create(config, parent_id.as_deref(), key)
        })
    }

    /// Look a node up by id or by reference
    ///
    /// # Errors
    /// Returns error on repository failures other than absence
    pub fn get(&self, id: impl AsRef<str>) -> Result<Option<DataNode>, CoreError> {
        self.entities.get(id)
    }

    /// Whether a node is stored under the id
    ///
    /// # Errors
    /// Returns error if the repository cannot be queried
    pub fn exists(&self, id: impl AsRef<str>) -> Result<bool, CoreError> {
        self.entities.exists(id)
    }

    /// Load a node, failing when absent
    ///
    /// # Errors
    /// Returns a not-found error when absent
    pub fn load(&self, id: impl AsRef<str>) -> Result<DataNode, CoreError> {
        self.entities.load(id.as_ref())
    }

    /// Upsert the full state of `node`
    ///
    /// # Errors
    /// Returns error if the repository cannot persist the node
    pub fn set(&self, node: &DataNode) -> Result<(), CoreError> {
        self.entities.set(node)
    }

    /// Every stored node
    ///
    /// # Errors
    /// Returns error if the repository cannot be read
    pub fn get_all(&self) -> Result<Vec<DataNode>, CoreError> {
        self.entities.get_all()
    }

    /// Delete one node
    ///
    /// In-memory data of the node is evicted; file data is kept.
    ///
    /// # Errors
    /// Returns a not-found error when absent
    pub fn delete(&self, id: impl AsRef<str>) -> Result<(), CoreError> {
        let id = id.as_ref();
        let node = self.load(id)?;
        self.entities.delete(id)?;
        self.index.remove_id(id);
        self.discard(&node)?;
        tracing::info!(%id, "Deleted data node");
        Ok(())
    }

    /// Delete every node
    ///
    /// # Errors
    /// Returns error if the repository cannot be cleared
    pub fn delete_all(&self) -> Result<(), CoreError> {
        let nodes = self.entities.get_all()?;
        self.entities.delete_all()?;
        self.index.clear();
        for node in &nodes {
            self.discard(node)?;
        }
        tracing::info!(count = nodes.len(), "Deleted all data nodes");
        Ok(())
    }

    /// Read the data of a node
    ///
    /// Reloads the node first so edits made by other holders are honoured.
    ///
    /// # Errors
    /// Returns a no-data error when the node was never written or an edition
    /// is in progress
    pub fn read(&self, id: impl AsRef<str>) -> Result<Value, CoreError> {
        let node = self.load(id)?;
        if !node.is_ready_for_reading() {
            return Err(weft_data::DataError::NoData(node.id().to_string()).into());
        }
        Ok(self.backend(node.storage_type())?.read(&node)?)
    }

    /// Write the data of a node and record the edit
    ///
    /// Returns the node as persisted after the edit.
    ///
    /// # Errors
    /// Returns error if the node is absent or the backend rejects the data
    pub fn write(
        &self,
        id: impl AsRef<str>,
        data: &Value,
        job_id: Option<JobId>,
    ) -> Result<DataNode, CoreError> {
        let mut node = self.load(id)?;
        self.backend(node.storage_type())?.write(&node, data)?;
        node.track_edit(job_id);
        self.set(&node)?;
        tracing::debug!(id = %node.id(), "Wrote data node");
        Ok(node)
    }

    /// Mark an edition as in progress
    ///
    /// # Errors
    /// Returns error if the node is absent or cannot be persisted
    pub fn lock_edition(&self, id: impl AsRef<str>) -> Result<DataNode, CoreError> {
        self.set_edition(id.as_ref(), true)
    }

    /// Clear the edition-in-progress flag
    ///
    /// # Errors
    /// Returns error if the node is absent or cannot be persisted
    pub fn unlock_edition(&self, id: impl AsRef<str>) -> Result<DataNode, CoreError> {
        self.set_edition(id.as_ref(), false)
    }

    /// Wrap a node for read-refresh / write-through access
    #[must_use]
    pub fn synced(&self, node: DataNode) -> Synced<DataNode> {
        Synced::new(self.entities.clone(), node)
    }

    /// Registered storage backends
    #[inline]
    #[must_use]
    pub fn storage(&self) -> &StorageRegistry {
        &self.storage
    }

    fn set_edition(&self, id: &str, in_progress: bool) -> Result<DataNode, CoreError> {
        let mut node = self.load(id)?;
        node.set_edition_in_progress(in_progress);
        self.set(&node)?;
        Ok(node)
    }

    fn discard(&self, node: &DataNode) -> Result<(), CoreError> {
        if let Some(backend) = self.storage.get(node.storage_type()) {
            backend.discard(node)?;
        }
        Ok(())
    }

    fn backend(&self, storage_type: &str) -> Result<&Arc<dyn StorageBackend>, CoreError> {
        self.storage
            .get(storage_type)
            .ok_or_else(|| CoreError::InvalidDataNodeType(storage_type.to_string()))
    }

    fn create(
        &self,
        config: &DataNodeConfig,
        parent_id: Option<&str>,
        key: ResolutionKey,
    ) -> Result<DataNode, CoreError> {
        let storage_type = config.storage_type();
        let backend = self.backend(storage_type)?;

        let id = DataNodeId::generate(config.id());
        let mut properties = config.properties().clone();
        let seed = backend.init(&id, &mut properties)?;
        properties
            .entry(CACHEABLE_PROPERTY.to_string())
            .or_insert(Value::Bool(false));

        let mut node = DataNode::new(id, config.id(), config.scope(), storage_type, properties)
            .with_parent_id(parent_id.map(str::to_string));
        node.set_resolution_key(Some(key.clone()));

        match seed {
            Seed::Empty => {}
            Seed::Data(data) => {
                backend.write(&node, &data)?;
                node.track_edit(None);
            }
            Seed::Existing => node.set_last_edition_date(Some(Utc::now())),
        }

        self.entities.set(&node)?;
        self.index.insert(key, node.id().as_str());
        tracing::info!(
            id = %node.id(),
            config_id = config.id(),
            scope = %node.scope(),
            storage_type,
            "Created data node"
        );
        Ok(node)
    }

    /// Node indexed under `key`, falling back to a repository scan
    fn lookup(&self, key: &ResolutionKey) -> Result<Option<DataNode>, CoreError> {
        if let Some(id) = self.index.get(key) {
            if let Some(node) = self.entities.get(&id)? {
                return Ok(Some(node));
            }
            self.index.remove_id(&id);
        }

        let mut found = None;
        for node in self.entities.get_all()? {
            let node_key = key_of(&node);
            if found.is_none() && node_key == *key {
                found = Some(node.clone());
            }
            self.index.insert_if_absent(node_key, node.id().as_str());
        }
        if let Some(node) = &found {
            self.index.insert(key.clone(), node.id().as_str());
        }
        Ok(found)
    }

    fn rebuild_index(&self) -> Result<(), CoreError> {
        for node in self.entities.get_all()? {
            self.index.insert_if_absent(key_of(&node), node.id().as_str());
        }
        tracing::debug!(indexed = self.index.len(), "Rebuilt data node index");
        Ok(())
    }
}

/// Key a node is resolved under
fn key_of(node: &DataNode) -> ResolutionKey {
    node.resolution_key().cloned().unwrap_or_else(|| {
        ResolutionKey::from_parent(node.config_id(), node.scope(), node.parent_id())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use weft_model::Scope;
    use weft_repository::MemoryRepository;

    fn manager() -> DataManager {
        let dir = std::env::temp_dir().join("weft-data-manager-unit");
        DataManager::new(
            Arc::new(MemoryRepository::<DataNode>::new()),
            Arc::new(StorageRegistry::with_defaults(dir)),
        )
        .unwrap()
    }

    fn in_memory(id: &str, scope: Scope) -> DataNodeConfig {
        DataNodeConfig::new(id)
            .unwrap()
            .with_storage_type("in_memory")
            .with_scope(scope)
    }

    #[test]
    fn create_seeds_cacheable() {
        let node = manager()
            .create_and_set(&in_memory("foo", Scope::Scenario), None)
            .unwrap();
        assert_eq!(node.properties().get("cacheable"), Some(&json!(false)));
        assert!(!node.is_ready_for_reading());
    }

    #[test]
    fn create_keeps_explicit_cacheable() {
        let config = in_memory("foo", Scope::Scenario).with_property("cacheable", true);
        let node = manager().create_and_set(&config, None).unwrap();
        assert!(node.cacheable());
    }

    #[test]
    fn default_data_is_written_at_creation() {
        let manager = manager();
        let config = in_memory("foo", Scope::Scenario)
            .with_property("default_data", "In memory Data Node")
            .with_property("other_data", "foo");
        let node = manager.create_and_set(&config, None).unwrap();

        assert!(node.is_ready_for_reading());
        assert_eq!(node.properties().len(), 2);
        assert_eq!(manager.read(&node).unwrap(), json!("In memory Data Node"));
    }

    #[test]
    fn read_before_write_is_no_data() {
        let manager = manager();
        let node = manager
            .create_and_set(&in_memory("foo", Scope::Scenario), None)
            .unwrap();
        assert!(manager.read(&node).unwrap_err().is_no_data());
    }

    #[test]
    fn write_records_edit_and_job() {
        let manager = manager();
        let node = manager
            .create_and_set(&in_memory("foo", Scope::Scenario), None)
            .unwrap();

        let written = manager
            .write(&node, &json!([1, 2]), Some(JobId::from("JOB_1")))
            .unwrap();
        assert_eq!(written.job_ids(), &[JobId::from("JOB_1")]);

        let stored = manager.load(&node).unwrap();
        assert!(stored.is_ready_for_reading());
        assert_eq!(manager.read(&node).unwrap(), json!([1, 2]));
    }

    #[test]
    fn locked_edition_is_not_readable() {
        let manager = manager();
        let node = manager
            .create_and_set(&in_memory("foo", Scope::Scenario), None)
            .unwrap();
        manager.write(&node, &json!(1), None).unwrap();

        manager.lock_edition(&node).unwrap();
        assert!(manager.read(&node).unwrap_err().is_no_data());

        manager.unlock_edition(&node).unwrap();
        assert_eq!(manager.read(&node).unwrap(), json!(1));
    }

    #[test]
    fn deleted_node_is_forgotten_by_index() {
        let manager = manager();
        let config = in_memory("foo", Scope::Global);
        let first = manager.get_or_create(&config, None, None).unwrap();

        manager.delete(&first).unwrap();
        let second = manager.get_or_create(&config, None, None).unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn delete_evicts_in_memory_data() {
        let manager = manager();
        let config = in_memory("foo", Scope::Scenario).with_property("default_data", 7);
        let node = manager.create_and_set(&config, None).unwrap();
        assert_eq!(manager.read(&node).unwrap(), json!(7));

        manager.delete(&node).unwrap();
        let err = manager.storage().get("in_memory").unwrap().read(&node).unwrap_err();
        assert!(matches!(err, weft_data::DataError::NoData(_)));
    }

    #[test]
    fn created_nodes_are_found_by_get_or_create() {
        let manager = manager();
        let config = in_memory("foo", Scope::Scenario);
        let created = manager.create_and_set(&config, Some("s1")).unwrap();

        let resolved = manager.get_or_create(&config, Some("s1"), None).unwrap();
        assert_eq!(resolved.id(), created.id());
    }
}
