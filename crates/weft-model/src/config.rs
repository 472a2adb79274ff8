//! Configuration objects
//!
//! Defines the read-only inputs the managers build entities from:
//! - [`DataNodeConfig`]: template of a data node
//! - [`TaskConfig`]: template of a task and its data nodes
//! - [`CoreSection`]: where and how entities are persisted

use crate::id::{validate_id, IdError};
use crate::scope::Scope;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

/// Open property mapping carried by configurations and data nodes
pub type Properties = IndexMap<String, serde_json::Value>;

/// Data node configuration
///
/// Immutable template: managers copy its properties into every data node
/// they create from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataNodeConfig {
    id: String,
    storage_type: String,
    scope: Scope,
    #[serde(default)]
    properties: Properties,
}

impl DataNodeConfig {
    /// Storage type used when none is given
    pub const DEFAULT_STORAGE_TYPE: &'static str = "pickle";

    /// Scope used when none is given
    pub const DEFAULT_SCOPE: Scope = Scope::Scenario;

    /// Create configuration with default storage type and scope
    ///
    /// # Errors
    /// Returns error if `id` is not a valid identifier
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self {
            id,
            storage_type: Self::DEFAULT_STORAGE_TYPE.to_string(),
            scope: Self::DEFAULT_SCOPE,
            properties: Properties::new(),
        })
    }

    /// With storage type tag
    #[inline]
    #[must_use]
    pub fn with_storage_type(mut self, storage_type: impl Into<String>) -> Self {
        self.storage_type = storage_type.into();
        self
    }

    /// With scope
    #[inline]
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// With a single property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// With several properties
    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Configuration id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Storage type tag
    #[inline]
    #[must_use]
    pub fn storage_type(&self) -> &str {
        &self.storage_type
    }

    /// Declared scope
    #[inline]
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Properties
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Mutable properties
    #[inline]
    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    /// Rename the configuration
    ///
    /// # Errors
    /// Returns error if `id` is not a valid identifier
    pub fn set_id(&mut self, id: impl Into<String>) -> Result<(), IdError> {
        let id = id.into();
        validate_id(&id)?;
        self.id = id;
        Ok(())
    }

    /// Apply overrides coming from a configuration file
    ///
    /// Values present in the override win over the ones already set.
    pub(crate) fn apply_override(&mut self, section: &DataNodeSection) {
        if let Some(storage_type) = &section.storage_type {
            self.storage_type = storage_type.clone();
        }
        if let Some(scope) = section.scope {
            self.scope = scope;
        }
        for (key, value) in &section.properties {
            self.properties.insert(key.clone(), value.clone());
        }
    }
}

/// Reference to the callable a task executes
///
/// The core never invokes it; it only persists and hands out the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionRef(String);

impl FunctionRef {
    /// Parse a function path such as `pipelines::clean` or `pipelines.clean`
    ///
    /// # Errors
    /// Returns error if any path segment is not a valid identifier
    pub fn parse(path: impl Into<String>) -> Result<Self, IdError> {
        let path = path.into();
        for segment in path.split("::").flat_map(|part| part.split('.')) {
            validate_id(segment)?;
        }
        Ok(Self(path))
    }

    /// Function path
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FunctionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TaskConfig {
    id: String,
    function: FunctionRef,
    inputs: Vec<DataNodeConfig>,
    outputs: Vec<DataNodeConfig>,
}

impl TaskConfig {
    /// Create task configuration without data nodes
    ///
    /// # Errors
    /// Returns error if `id` is not a valid identifier
    pub fn new(id: impl Into<String>, function: FunctionRef) -> Result<Self, IdError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self {
            id,
            function,
            inputs: Vec::new(),
            outputs: Vec::new(),
        })
    }

    /// With input data node configuration
    #[inline]
    #[must_use]
    pub fn with_input(mut self, input: DataNodeConfig) -> Self {
        self.inputs.push(input);
        self
    }

    /// With output data node configuration
    #[inline]
    #[must_use]
    pub fn with_output(mut self, output: DataNodeConfig) -> Self {
        self.outputs.push(output);
        self
    }

    /// Configuration id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Function reference
    #[inline]
    #[must_use]
    pub fn function(&self) -> &FunctionRef {
        &self.function
    }

    /// Input data node configurations
    #[inline]
    #[must_use]
    pub fn inputs(&self) -> &[DataNodeConfig] {
        &self.inputs
    }

    /// Output data node configurations
    #[inline]
    #[must_use]
    pub fn outputs(&self) -> &[DataNodeConfig] {
        &self.outputs
    }
}

/// Repository backing selected by the core section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryType {
    /// One JSON file per entity under the storage folder
    #[default]
    Filesystem,
    /// Process-local maps, lost on exit
    Memory,
}

/// Core configuration section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSection {
    /// Root folder of persisted entities and file-based data
    pub storage_folder: PathBuf,
    /// Repository backing
    pub repository_type: RepositoryType,
}

impl CoreSection {
    /// Create default core section
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With storage folder
    #[inline]
    #[must_use]
    pub fn with_storage_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.storage_folder = folder.into();
        self
    }

    /// With repository type
    #[inline]
    #[must_use]
    pub fn with_repository_type(mut self, repository_type: RepositoryType) -> Self {
        self.repository_type = repository_type;
        self
    }
}

impl Default for CoreSection {
    fn default() -> Self {
        Self {
            storage_folder: PathBuf::from(".data"),
            repository_type: RepositoryType::Filesystem,
        }
    }
}

/// Data node section as written in a configuration file
///
/// Every field is optional so the section can act as an override.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct DataNodeSection {
    pub(crate) storage_type: Option<String>,
    pub(crate) scope: Option<Scope>,
    #[serde(flatten)]
    pub(crate) properties: Properties,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_node_config_defaults() {
        let config = DataNodeConfig::new("foo").unwrap();
        assert_eq!(config.id(), "foo");
        assert_eq!(config.storage_type(), "pickle");
        assert_eq!(config.scope(), Scope::Scenario);
        assert!(config.properties().is_empty());
    }

    #[test]
    fn data_node_config_builder() {
        let config = DataNodeConfig::new("foo")
            .unwrap()
            .with_storage_type("csv")
            .with_scope(Scope::Global)
            .with_property("path", "bar")
            .with_property("has_header", true);

        assert_eq!(config.storage_type(), "csv");
        assert_eq!(config.scope(), Scope::Global);
        assert_eq!(config.properties().get("path"), Some(&json!("bar")));
        assert_eq!(config.properties().get("has_header"), Some(&json!(true)));
    }

    #[test]
    fn data_node_config_rejects_invalid_id() {
        assert!(DataNodeConfig::new("1foo").is_err());
        assert!(DataNodeConfig::new("foo bar").is_err());
    }

    #[test]
    fn data_node_config_set_id_validates() {
        let mut config = DataNodeConfig::new("foo").unwrap();
        config.set_id("bar").unwrap();
        assert_eq!(config.id(), "bar");
        assert!(config.set_id("").is_err());
        assert_eq!(config.id(), "bar");
    }

    #[test]
    fn override_wins_over_declared_values() {
        let mut config = DataNodeConfig::new("foo")
            .unwrap()
            .with_storage_type("csv")
            .with_property("path", "bar")
            .with_property("has_header", true);

        let mut properties = Properties::new();
        properties.insert("path".into(), json!("from_file"));
        let section = DataNodeSection {
            storage_type: None,
            scope: Some(Scope::Cycle),
            properties,
        };
        config.apply_override(&section);

        assert_eq!(config.storage_type(), "csv");
        assert_eq!(config.scope(), Scope::Cycle);
        assert_eq!(config.properties().get("path"), Some(&json!("from_file")));
        assert_eq!(config.properties().get("has_header"), Some(&json!(true)));
    }

    #[test]
    fn function_ref_accepts_module_paths() {
        assert!(FunctionRef::parse("pipelines::clean").is_ok());
        assert!(FunctionRef::parse("pipelines.clean").is_ok());
        assert!(FunctionRef::parse("clean").is_ok());
    }

    #[test]
    fn function_ref_rejects_garbage() {
        assert!(FunctionRef::parse("").is_err());
        assert!(FunctionRef::parse("a::").is_err());
        assert!(FunctionRef::parse("a.1b").is_err());
    }

    #[test]
    fn task_config_collects_data_nodes() {
        let input = DataNodeConfig::new("raw").unwrap();
        let output = DataNodeConfig::new("clean").unwrap();
        let task = TaskConfig::new("cleaning", FunctionRef::parse("jobs::clean").unwrap())
            .unwrap()
            .with_input(input.clone())
            .with_output(output.clone());

        assert_eq!(task.inputs(), &[input]);
        assert_eq!(task.outputs(), &[output]);
        assert_eq!(task.function().as_str(), "jobs::clean");
    }

    #[test]
    fn core_section_defaults() {
        let core = CoreSection::default();
        assert_eq!(core.storage_folder, PathBuf::from(".data"));
        assert_eq!(core.repository_type, RepositoryType::Filesystem);
    }
}
