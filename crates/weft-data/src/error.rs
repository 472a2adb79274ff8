//! Data access errors

use std::path::PathBuf;

/// Errors raised by storage backends
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// Node was never written
    #[error("data node '{0}' holds no data")]
    NoData(String),

    /// Backend property missing from the configuration
    #[error("{storage_type} data node requires property '{property}'")]
    MissingRequiredProperty {
        /// Backend tag
        storage_type: String,
        /// Missing property name
        property: String,
    },

    /// Data shape the backend cannot store
    #[error("{storage_type} data node cannot store {reason}")]
    UnsupportedData {
        /// Backend tag
        storage_type: String,
        /// What was wrong with the data
        reason: String,
    },

    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding or decoding failure
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding failure
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataError {
    pub(crate) fn missing(storage_type: &str, property: &str) -> Self {
        Self::MissingRequiredProperty {
            storage_type: storage_type.to_string(),
            property: property.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
