//! Scope hierarchy
//!
//! Provides [`Scope`], the breadth level at which an entity is shared.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Breadth level at which an entity is considered shared and reusable
///
/// Levels are totally ordered from broadest to narrowest:
/// `Global < Cycle < Scenario < Pipeline`. The broadest scope of a
/// collection is therefore its minimum.
///
/// # Example
/// ```
/// use weft_model::Scope;
///
/// let scopes = [Scope::Pipeline, Scope::Scenario];
/// assert_eq!(Scope::broadest(scopes), Some(Scope::Scenario));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// Shared by the whole system
    Global,
    /// Shared within one cycle
    Cycle,
    /// Shared within one scenario
    Scenario,
    /// Private to one pipeline
    Pipeline,
}

impl Scope {
    /// Every level, broadest first
    pub const ALL: [Scope; 4] = [Scope::Global, Scope::Cycle, Scope::Scenario, Scope::Pipeline];

    /// Canonical upper-case name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Scope::Global => "GLOBAL",
            Scope::Cycle => "CYCLE",
            Scope::Scenario => "SCENARIO",
            Scope::Pipeline => "PIPELINE",
        }
    }

    /// Broadest scope of a collection, `None` when empty
    #[inline]
    #[must_use]
    pub fn broadest(scopes: impl IntoIterator<Item = Scope>) -> Option<Scope> {
        scopes.into_iter().min()
    }

    /// Narrowest scope of a collection, `None` when empty
    #[inline]
    #[must_use]
    pub fn narrowest(scopes: impl IntoIterator<Item = Scope>) -> Option<Scope> {
        scopes.into_iter().max()
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ScopeError::Unknown(s.to_string()))
    }
}

impl serde::Serialize for Scope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Scope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to scope literals
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Literal does not name a scope
    #[error("unknown scope: '{0}' (expected GLOBAL, CYCLE, SCENARIO or PIPELINE)")]
    Unknown(String),
}
