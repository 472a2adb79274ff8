//! Identifiers
//!
//! Provides identifier validation for configuration ids and the entity id
//! newtypes ([`DataNodeId`], [`TaskId`], [`JobId`]).

use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

/// Separator between the parts of a generated entity id
pub const ID_SEPARATOR: &str = "_";

/// Validate a configuration identifier
///
/// An identifier is non-empty, made of ASCII letters, digits and
/// underscores, and does not start with a digit.
///
/// # Errors
/// Returns [`IdError`] describing the first violated rule
pub fn validate_id(id: &str) -> Result<&str, IdError> {
    let mut chars = id.chars();
    match chars.next() {
        None => return Err(IdError::Empty),
        Some(c) if c.is_ascii_digit() => return Err(IdError::LeadingDigit(id.to_string())),
        Some(_) => {}
    }

    if id.contains(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
        return Err(IdError::InvalidCharacters(id.to_string()));
    }

    Ok(id)
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix of generated ids
            pub const PREFIX: &'static str = $prefix;

            /// Generate a fresh id for a configuration
            ///
            /// Format: `<PREFIX>_<config_id>_<uuid>`
            #[must_use]
            pub fn generate(config_id: &str) -> Self {
                Self([Self::PREFIX, config_id, &Uuid::new_v4().to_string()].join(ID_SEPARATOR))
            }

            /// Borrow as string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume into the inner string
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

entity_id!(
    /// Unique data node identifier
    DataNodeId,
    "DATANODE"
);

entity_id!(
    /// Unique task identifier
    TaskId,
    "TASK"
);

entity_id!(
    /// Identifier of a job that wrote a data node
    JobId,
    "JOB"
);

/// Errors related to identifiers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Identifier is empty
    #[error("identifier is empty")]
    Empty,

    /// Identifier starts with a digit
    #[error("invalid identifier '{0}': must not start with a digit")]
    LeadingDigit(String),

    /// Identifier contains forbidden characters
    #[error("invalid identifier '{0}': must be alphanumeric or underscore")]
    InvalidCharacters(String),
}
