//! Read-refresh / write-through entity handle
//!
//! A [`Synced`] handle pairs an entity with the manager that persists it.
//! Reads through the handle re-fetch the persisted state first; writes
//! re-fetch it too, mutate the fresh copy and persist it immediately. The
//! repository is the source of truth, so two handles on the same entity
//! observe each other's writes and never overwrite fields they did not touch.
//!
//! ```text
//!  read:  repository ──load──▶ local copy ──▶ value
//!  write: repository ──load──▶ local copy ──mutate──save──▶ repository
//! ```

use crate::entity::{Entity, EntityManager};
use crate::error::CoreError;
use crate::task::Task;
use chrono::{DateTime, Utc};
use serde_json::Value;
use weft_data::DataNode;
use weft_model::{FunctionRef, JobId, Properties};

/// Entity handle with lazy reload and write-through
#[derive(Debug, Clone)]
pub struct Synced<E: Entity> {
    manager: EntityManager<E>,
    entity: E,
}

impl<E: Entity> Synced<E> {
    /// Wrap `entity`, persisted through `manager`
    #[must_use]
    pub fn new(manager: EntityManager<E>, entity: E) -> Self {
        Self { manager, entity }
    }

    /// Replace the local copy with the persisted state
    ///
    /// # Errors
    /// Returns a not-found error if the entity was deleted
    pub fn refresh(&mut self) -> Result<&E, CoreError> {
        self.entity = self.manager.load(self.entity.entity_id())?;
        Ok(&self.entity)
    }

    /// Persist the local copy
    ///
    /// # Errors
    /// Returns error if the repository cannot persist the entity
    pub fn commit(&self) -> Result<(), CoreError> {
        self.manager.set(&self.entity)
    }

    /// Refresh, then read from the entity
    ///
    /// # Errors
    /// Returns a not-found error if the entity was deleted
    pub fn get<T>(&mut self, read: impl FnOnce(&E) -> T) -> Result<T, CoreError> {
        Ok(read(self.refresh()?))
    }

    /// Refresh, mutate the local copy, then persist it
    ///
    /// # Errors
    /// Returns a not-found error if the entity was deleted, or error if the
    /// repository cannot persist it
    pub fn update<T>(&mut self, write: impl FnOnce(&mut E) -> T) -> Result<T, CoreError> {
        self.refresh()?;
        let out = write(&mut self.entity);
        self.commit()?;
        Ok(out)
    }

    /// Local copy, without I/O
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> &E {
        &self.entity
    }

    /// Consume the handle into the local copy
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> E {
        self.entity
    }
}

impl Synced<DataNode> {
    /// Current properties
    ///
    /// # Errors
    /// Returns a not-found error if the node was deleted
    pub fn properties(&mut self) -> Result<Properties, CoreError> {
        self.get(|node| node.properties().clone())
    }

    /// Current value of one property
    ///
    /// # Errors
    /// Returns a not-found error if the node was deleted
    pub fn property(&mut self, key: &str) -> Result<Option<Value>, CoreError> {
        self.get(|node| node.properties().get(key).cloned())
    }

    /// Set one property on the current state and persist
    ///
    /// # Errors
    /// Returns error if the node was deleted or cannot be persisted
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), CoreError> {
        let (key, value) = (key.into(), value.into());
        self.update(|node| {
            node.properties_mut().insert(key, value);
        })
    }

    /// Remove one property from the current state and persist
    ///
    /// # Errors
    /// Returns error if the node was deleted or cannot be persisted
    pub fn remove_property(&mut self, key: &str) -> Result<Option<Value>, CoreError> {
        self.update(|node| node.properties_mut().shift_remove(key))
    }

    /// Jobs that wrote the node
    ///
    /// # Errors
    /// Returns a not-found error if the node was deleted
    pub fn job_ids(&mut self) -> Result<Vec<JobId>, CoreError> {
        self.get(|node| node.job_ids().to_vec())
    }

    /// Date of the last completed write
    ///
    /// # Errors
    /// Returns a not-found error if the node was deleted
    pub fn last_edition_date(&mut self) -> Result<Option<DateTime<Utc>>, CoreError> {
        self.get(DataNode::last_edition_date)
    }

    /// Whether a write is in progress
    ///
    /// # Errors
    /// Returns a not-found error if the node was deleted
    pub fn edition_in_progress(&mut self) -> Result<bool, CoreError> {
        self.get(DataNode::edition_in_progress)
    }

    /// Set the edition-in-progress flag on the current state and persist
    ///
    /// # Errors
    /// Returns error if the node was deleted or cannot be persisted
    pub fn set_edition_in_progress(&mut self, in_progress: bool) -> Result<(), CoreError> {
        self.update(|node| node.set_edition_in_progress(in_progress))
    }

    /// Whether the node can be read
    ///
    /// # Errors
    /// Returns a not-found error if the node was deleted
    pub fn is_ready_for_reading(&mut self) -> Result<bool, CoreError> {
        self.get(DataNode::is_ready_for_reading)
    }
}

impl Synced<Task> {
    /// Current function reference
    ///
    /// # Errors
    /// Returns a not-found error if the task or one of its data nodes was
    /// deleted
    pub fn function(&mut self) -> Result<FunctionRef, CoreError> {
        self.get(|task| task.function().clone())
    }

    /// Replace the function reference on the current state and persist
    ///
    /// # Errors
    /// Returns error if the task was deleted or cannot be persisted
    pub fn set_function(&mut self, function: FunctionRef) -> Result<(), CoreError> {
        self.update(|task| task.set_function(function))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SelfHydrate;
    use serde_json::json;
    use std::sync::Arc;
    use weft_model::{DataNodeId, Scope};
    use weft_repository::MemoryRepository;

    fn setup() -> (EntityManager<DataNode>, DataNode) {
        let manager = EntityManager::new(Arc::new(MemoryRepository::<DataNode>::new()), Arc::new(SelfHydrate));
        let node = DataNode::new(
            DataNodeId::generate("foo"),
            "foo",
            Scope::Scenario,
            "pickle",
            Properties::new(),
        );
        manager.set(&node).unwrap();
        (manager, node)
    }

    #[test]
    fn reads_observe_other_holders() {
        let (manager, node) = setup();
        let mut first = Synced::new(manager.clone(), node.clone());
        let mut second = Synced::new(manager, node);

        first.set_property("name", "foo").unwrap();
        assert_eq!(second.property("name").unwrap(), Some(json!("foo")));
        assert_eq!(second.snapshot().properties().get("name"), Some(&json!("foo")));
    }

    #[test]
    fn writes_are_visible_through_manager() {
        let (manager, node) = setup();
        let mut synced = Synced::new(manager.clone(), node.clone());

        synced.set_edition_in_progress(true).unwrap();
        assert!(manager.load(node.id().as_str()).unwrap().edition_in_progress());
    }

    #[test]
    fn snapshot_does_not_refresh() {
        let (manager, node) = setup();
        let stale = Synced::new(manager.clone(), node.clone());
        let mut writer = Synced::new(manager, node);

        writer.set_property("k", 1).unwrap();
        assert!(stale.snapshot().properties().is_empty());
    }

    #[test]
    fn set_property_keeps_concurrent_properties() {
        let (manager, node) = setup();
        let mut first = Synced::new(manager.clone(), node.clone());
        let mut second = Synced::new(manager, node);

        first.set_property("a", 1).unwrap();
        second.set_property("b", 2).unwrap();

        let properties = first.properties().unwrap();
        assert_eq!(properties.get("a"), Some(&json!(1)));
        assert_eq!(properties.get("b"), Some(&json!(2)));
    }

    #[test]
    fn flag_toggle_keeps_edits_of_other_holders() {
        let (manager, node) = setup();
        let mut toggler = Synced::new(manager.clone(), node.clone());

        let mut edited = manager.load(node.id().as_str()).unwrap();
        edited.track_edit(Some(JobId::from("JOB_other_1")));
        manager.set(&edited).unwrap();

        toggler.set_edition_in_progress(false).unwrap();
        let stored = manager.load(node.id().as_str()).unwrap();
        assert_eq!(stored.job_ids(), [JobId::from("JOB_other_1")].as_slice());
        assert!(stored.last_edition_date().is_some());
    }

    #[test]
    fn write_to_deleted_entity_does_not_resurrect_it() {
        let (manager, node) = setup();
        let mut synced = Synced::new(manager.clone(), node.clone());

        manager.delete(&node).unwrap();
        assert!(synced.set_edition_in_progress(true).unwrap_err().is_not_found());
        assert!(!manager.exists(node.id()).unwrap());
    }

    #[test]
    fn read_of_deleted_entity_fails() {
        let (manager, node) = setup();
        let mut synced = Synced::new(manager.clone(), node.clone());

        manager.delete(&node).unwrap();
        assert!(synced.job_ids().unwrap_err().is_not_found());
    }
}
