//! Repository errors

use std::path::PathBuf;

/// Result alias for repository operations
pub type Result<T, E = RepositoryError> = std::result::Result<T, E>;

/// Errors raised by repositories
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No model stored under the id
    #[error("{kind} '{id}' not found")]
    ModelNotFound {
        /// Model kind
        kind: &'static str,
        /// Requested id
        id: String,
    },

    /// Id cannot be used as a storage key
    #[error("invalid model id: '{0}'")]
    InvalidId(String),

    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Stored document cannot be (de)serialized
    #[error("serialization error for {kind} '{id}': {source}")]
    Serialization {
        /// Model kind
        kind: &'static str,
        /// Model id
        id: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

impl RepositoryError {
    /// Whether this is a [`RepositoryError::ModelNotFound`]
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModelNotFound { .. })
    }

    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        Self::ModelNotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
