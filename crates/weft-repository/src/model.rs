//! Persisted model contract

use crate::error::{RepositoryError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Serializable record stored by a [`Repository`](crate::Repository)
pub trait Model: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Kind name, used as the storage namespace
    const KIND: &'static str;

    /// Unique id of this record within its kind
    fn model_id(&self) -> &str;
}

/// Validate an id before using it as a storage key
///
/// Accepts ASCII letters, digits, `_` and `-` so that ids map to plain file
/// names.
///
/// # Errors
/// Returns [`RepositoryError::InvalidId`] for empty ids or ids containing any
/// other character
pub fn validate_model_id(id: &str) -> Result<&str> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(id)
    } else {
        Err(RepositoryError::InvalidId(id.to_string()))
    }
}
