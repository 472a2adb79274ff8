//! Repository trait

use crate::error::Result;
use crate::model::Model;

/// Keyed durable store of one model kind
///
/// Implementations are shared across threads behind an `Arc`. Every method
/// works on owned copies: nothing handed out aliases stored state.
pub trait Repository<M: Model>: Send + Sync {
    /// Insert or replace the model stored under its id
    fn save(&self, model: &M) -> Result<()>;

    /// Load the model stored under `id`
    ///
    /// Fails with [`RepositoryError::ModelNotFound`](crate::RepositoryError::ModelNotFound)
    /// when absent.
    fn load(&self, id: &str) -> Result<M>;

    /// Remove the model stored under `id`
    ///
    /// Fails with [`RepositoryError::ModelNotFound`](crate::RepositoryError::ModelNotFound)
    /// when absent.
    fn delete(&self, id: &str) -> Result<()>;

    /// Remove every model of this kind
    fn delete_all(&self) -> Result<()>;

    /// Every stored model, ordered by id
    fn get_all(&self) -> Result<Vec<M>>;

    /// Whether a model is stored under `id`
    fn exists(&self, id: &str) -> Result<bool>;
}
