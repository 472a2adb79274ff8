//! Generic entity manager
//!
//! [`EntityManager`] is the only path through which entities reach their
//! repository. It converts entities to their persisted model on the way in
//! and hydrates models back into entities on the way out.

use crate::error::CoreError;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use weft_data::DataNode;
use weft_repository::{Model, Repository};

/// Uniquely identified, independently persisted object
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Persisted form
    type Model: Model;

    /// Unique id
    fn entity_id(&self) -> &str;

    /// Persisted form of the current state
    fn to_model(&self) -> Self::Model;
}

/// Turns a persisted model back into an entity
pub trait Hydrate<E: Entity>: Send + Sync {
    /// Build the entity
    ///
    /// # Errors
    /// Returns error if something the model references cannot be loaded
    fn hydrate(&self, model: E::Model) -> Result<E, CoreError>;
}

/// Hydrator for entities that are their own model
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfHydrate;

impl<E> Hydrate<E> for SelfHydrate
where
    E: Entity<Model = E> + Model,
{
    fn hydrate(&self, model: E) -> Result<E, CoreError> {
        Ok(model)
    }
}

impl Entity for DataNode {
    type Model = DataNode;

    fn entity_id(&self) -> &str {
        self.id().as_str()
    }

    fn to_model(&self) -> DataNode {
        self.clone()
    }
}

/// Repository-backed manager for one entity kind
///
/// Cheap to clone: clones share the repository.
pub struct EntityManager<E: Entity> {
    repository: Arc<dyn Repository<E::Model>>,
    hydrator: Arc<dyn Hydrate<E>>,
}

impl<E: Entity> EntityManager<E> {
    /// Create manager over `repository`
    #[must_use]
    pub fn new(repository: Arc<dyn Repository<E::Model>>, hydrator: Arc<dyn Hydrate<E>>) -> Self {
        Self {
            repository,
            hydrator,
        }
    }

    /// Upsert the full state of `entity`
    ///
    /// # Errors
    /// Returns error if the repository cannot persist the model
    pub fn set(&self, entity: &E) -> Result<(), CoreError> {
        self.repository.save(&entity.to_model())?;
        Ok(())
    }

    /// Load an entity, failing when absent
    ///
    /// # Errors
    /// Returns a not-found [`CoreError::Repository`] when absent
    pub fn load(&self, id: &str) -> Result<E, CoreError> {
        let model = self.repository.load(id)?;
        self.hydrator.hydrate(model)
    }

    /// Look an entity up by id or by reference
    ///
    /// Returns `Ok(None)` when nothing is stored under the id.
    ///
    /// # Errors
    /// Returns error on any other repository or hydration failure
    pub fn get(&self, id: impl AsRef<str>) -> Result<Option<E>, CoreError> {
        self.get_model(id)?.map(|model| self.hydrator.hydrate(model)).transpose()
    }

    /// Every stored entity
    ///
    /// # Errors
    /// Returns error if a model cannot be loaded or hydrated
    pub fn get_all(&self) -> Result<Vec<E>, CoreError> {
        self.repository
            .get_all()?
            .into_iter()
            .map(|model| self.hydrator.hydrate(model))
            .collect()
    }

    /// Stored model under the id, without hydration
    ///
    /// # Errors
    /// Returns error on repository failures other than absence
    pub fn get_model(&self, id: impl AsRef<str>) -> Result<Option<E::Model>, CoreError> {
        match self.repository.load(id.as_ref()) {
            Ok(model) => Ok(Some(model)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Build the entity of a model obtained from this manager
    ///
    /// # Errors
    /// Returns error if something the model references cannot be loaded
    pub fn hydrate(&self, model: E::Model) -> Result<E, CoreError> {
        self.hydrator.hydrate(model)
    }

    /// Every stored model, without hydration
    ///
    /// # Errors
    /// Returns error if a model cannot be loaded
    pub fn get_all_models(&self) -> Result<Vec<E::Model>, CoreError> {
        Ok(self.repository.get_all()?)
    }

    /// Delete one entity
    ///
    /// # Errors
    /// Returns a not-found [`CoreError::Repository`] when absent
    pub fn delete(&self, id: impl AsRef<str>) -> Result<(), CoreError> {
        self.repository.delete(id.as_ref())?;
        Ok(())
    }

    /// Delete every entity of this kind
    ///
    /// # Errors
    /// Returns error if the repository cannot be cleared
    pub fn delete_all(&self) -> Result<(), CoreError> {
        self.repository.delete_all()?;
        Ok(())
    }

    /// Whether an entity is stored under the id
    ///
    /// # Errors
    /// Returns error if the repository cannot be queried
    pub fn exists(&self, id: impl AsRef<str>) -> Result<bool, CoreError> {
        Ok(self.repository.exists(id.as_ref())?)
    }
}

impl<E: Entity> Clone for EntityManager<E> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            hydrator: Arc::clone(&self.hydrator),
        }
    }
}

impl<E: Entity> Debug for EntityManager<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityManager")
            .field("kind", &<E::Model as Model>::KIND)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_model::{DataNodeId, Properties, Scope};
    use weft_repository::MemoryRepository;

    fn manager() -> EntityManager<DataNode> {
        EntityManager::new(Arc::new(MemoryRepository::<DataNode>::new()), Arc::new(SelfHydrate))
    }

    fn node() -> DataNode {
        DataNode::new(
            DataNodeId::generate("foo"),
            "foo",
            Scope::Global,
            "pickle",
            Properties::new(),
        )
    }

    #[test]
    fn get_is_soft_and_load_is_hard() {
        let manager = manager();
        assert!(manager.get("DATANODE_missing").unwrap().is_none());
        assert!(manager.load("DATANODE_missing").unwrap_err().is_not_found());
    }

    #[test]
    fn get_accepts_entity_or_id() {
        let manager = manager();
        let node = node();
        manager.set(&node).unwrap();

        assert_eq!(manager.get(&node).unwrap(), Some(node.clone()));
        assert_eq!(manager.get(node.id()).unwrap(), Some(node.clone()));
        assert_eq!(manager.get(node.id().as_str()).unwrap(), Some(node));
    }

    #[test]
    fn set_is_idempotent() {
        let manager = manager();
        let node = node();
        manager.set(&node).unwrap();
        manager.set(&node).unwrap();
        assert_eq!(manager.get_all().unwrap(), vec![node]);
    }

    #[test]
    fn clones_share_storage() {
        let manager = manager();
        let clone = manager.clone();
        let node = node();
        clone.set(&node).unwrap();
        assert!(manager.exists(&node).unwrap());
    }
}
