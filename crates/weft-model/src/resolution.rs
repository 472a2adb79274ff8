//! Composite resolution keys
//!
//! Provides [`ResolutionKey`], the `(config_id, scope-relevant parent ids)`
//! tuple that decides whether an entity is reused or created.

use crate::scope::Scope;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Identity of an entity for reuse purposes
///
/// Only the parent identifiers that matter for the scope are kept:
///
/// | scope      | key                                   |
/// |------------|---------------------------------------|
/// | `Global`   | `config_id`                           |
/// | `Cycle`    | `config_id`                           |
/// | `Scenario` | `(config_id, scenario_id)`            |
/// | `Pipeline` | `(config_id, scenario_id, pipeline_id)` |
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResolutionKey {
    config_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scenario_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pipeline_id: Option<String>,
}

impl ResolutionKey {
    /// Build the key for a lookup under `scope`
    #[must_use]
    pub fn new(
        config_id: impl Into<String>,
        scope: Scope,
        scenario_id: Option<&str>,
        pipeline_id: Option<&str>,
    ) -> Self {
        let (scenario_id, pipeline_id) = match scope {
            Scope::Global | Scope::Cycle => (None, None),
            Scope::Scenario => (scenario_id, None),
            Scope::Pipeline => (scenario_id, pipeline_id),
        };
        Self {
            config_id: config_id.into(),
            scenario_id: scenario_id.map(str::to_string),
            pipeline_id: pipeline_id.map(str::to_string),
        }
    }

    /// Best-effort key for an entity that only records its `parent_id`
    ///
    /// The parent of a scenario-scoped entity is its scenario, the parent of
    /// a pipeline-scoped one is its pipeline (its scenario is unknown).
    #[must_use]
    pub fn from_parent(config_id: impl Into<String>, scope: Scope, parent_id: Option<&str>) -> Self {
        match scope {
            Scope::Pipeline => Self::new(config_id, scope, None, parent_id),
            _ => Self::new(config_id, scope, parent_id, None),
        }
    }

    /// Parent id recorded on an entity created under this key
    #[inline]
    #[must_use]
    pub fn parent_id(&self, scope: Scope) -> Option<&str> {
        match scope {
            Scope::Global | Scope::Cycle => None,
            Scope::Scenario => self.scenario_id.as_deref(),
            Scope::Pipeline => self.pipeline_id.as_deref(),
        }
    }

    /// Configuration id
    #[inline]
    #[must_use]
    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    /// Scenario id, when relevant to the scope
    #[inline]
    #[must_use]
    pub fn scenario_id(&self) -> Option<&str> {
        self.scenario_id.as_deref()
    }

    /// Pipeline id, when relevant to the scope
    #[inline]
    #[must_use]
    pub fn pipeline_id(&self) -> Option<&str> {
        self.pipeline_id.as_deref()
    }
}

impl Display for ResolutionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config_id)?;
        if let Some(scenario) = &self.scenario_id {
            write!(f, "@{scenario}")?;
        }
        if let Some(pipeline) = &self.pipeline_id {
            write!(f, "/{pipeline}")?;
        }
        Ok(())
    }
}
