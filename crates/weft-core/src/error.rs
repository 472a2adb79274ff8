//! Error types for weft Core
//!
//! Provides error handling for:
//! - Backend dispatch failures
//! - Lookups of absent entities
//! - Identifier validation
//! - Task attribute resolution
//! - Core service lifecycle

use weft_data::DataError;
use weft_model::{ConfigError, ConfigIssue, IdError};
use weft_repository::RepositoryError;

/// Main weft error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No backend registered for the storage type
    #[error("invalid data node type: '{0}'")]
    InvalidDataNodeType(String),

    /// Repository failure, including absent models
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Identifier failed validation
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdError),

    /// Name is neither an input nor an output of the task
    #[error("{name} is not an attribute of task {task_id}")]
    UnknownAttribute {
        /// Requested name
        name: String,
        /// Task id
        task_id: String,
    },

    /// Storage backend failure
    #[error(transparent)]
    Data(#[from] DataError),

    /// Configuration is locked by a running core service
    #[error("configuration update is blocked while the core service is running")]
    ConfigurationUpdateBlocked,

    /// Configuration registry failure
    #[error("configuration error: {0}")]
    Config(ConfigError),

    /// Configuration failed its checks
    #[error("invalid configuration: {}", format_issues(.0))]
    InvalidConfiguration(Vec<ConfigIssue>),

    /// `run` called twice
    #[error("core service is already running")]
    CoreServiceAlreadyRunning,
}

impl CoreError {
    /// Whether the error reports an absent entity
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repository(e) if e.is_not_found())
    }

    /// Whether the error reports a never-written data node
    #[inline]
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::Data(DataError::NoData(_)))
    }
}

impl From<ConfigError> for CoreError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::UpdateBlocked => Self::ConfigurationUpdateBlocked,
            ConfigError::InvalidId(e) => Self::InvalidIdentifier(e),
            other => Self::Config(other),
        }
    }
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{}: {}", issue.config_id, issue.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_classification() {
        let err: CoreError = RepositoryError::ModelNotFound {
            kind: "task",
            id: "TASK_x".into(),
        }
        .into();
        assert!(err.is_not_found());
        assert!(!CoreError::InvalidDataNodeType("foo".into()).is_not_found());
    }

    #[test]
    fn blocked_config_maps_to_dedicated_variant() {
        let err: CoreError = ConfigError::UpdateBlocked.into();
        assert!(matches!(err, CoreError::ConfigurationUpdateBlocked));
    }

    #[test]
    fn unknown_attribute_message_names_task() {
        let err = CoreError::UnknownAttribute {
            name: "baz".into(),
            task_id: "TASK_t_1".into(),
        };
        assert_eq!(err.to_string(), "baz is not an attribute of task TASK_t_1");
    }

    #[test]
    fn invalid_configuration_lists_issues() {
        let err = CoreError::InvalidConfiguration(vec![ConfigIssue {
            config_id: "foo".into(),
            message: "bad".into(),
        }]);
        assert_eq!(err.to_string(), "invalid configuration: foo: bad");
    }
}
