//! In-memory repository
//!
//! Process-local storage, mainly for tests and ephemeral runs.

use crate::error::{RepositoryError, Result};
use crate::model::{validate_model_id, Model};
use crate::traits::Repository;
use dashmap::DashMap;

/// Repository backed by a concurrent map
#[derive(Debug)]
pub struct MemoryRepository<M> {
    models: DashMap<String, M>,
}

impl<M: Model> MemoryRepository<M> {
    /// Create empty repository
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            models: DashMap::new(),
        }
    }

    /// Number of stored models
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether nothing is stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl<M: Model> Default for MemoryRepository<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Repository<M> for MemoryRepository<M> {
    fn save(&self, model: &M) -> Result<()> {
        let id = validate_model_id(model.model_id())?;
        self.models.insert(id.to_string(), model.clone());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<M> {
        self.models
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RepositoryError::not_found(M::KIND, id))
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.models
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::not_found(M::KIND, id))
    }

    fn delete_all(&self) -> Result<()> {
        self.models.clear();
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<M>> {
        let mut models: Vec<M> = self.models.iter().map(|entry| entry.value().clone()).collect();
        models.sort_by(|a, b| a.model_id().cmp(b.model_id()));
        Ok(models)
    }

    fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.models.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        tags: Vec<String>,
    }

    impl Model for Item {
        const KIND: &'static str = "item";

        fn model_id(&self) -> &str {
            &self.id
        }
    }

    #[test]
    fn loaded_models_are_independent_copies() {
        let repo = MemoryRepository::new();
        repo.save(&Item {
            id: "a".into(),
            tags: vec![],
        })
        .unwrap();

        let mut loaded = repo.load("a").unwrap();
        loaded.tags.push("x".into());
        assert!(repo.load("a").unwrap().tags.is_empty());
    }

    #[test]
    fn get_all_is_sorted_by_id() {
        let repo = MemoryRepository::new();
        for id in ["c", "a", "b"] {
            repo.save(&Item {
                id: id.into(),
                tags: vec![],
            })
            .unwrap();
        }
        let ids: Vec<_> = repo.get_all().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(repo.len(), 3);
    }
}
