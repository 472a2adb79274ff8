//! Configuration registry
//!
//! Provides [`Config`], the process-level holder of data node and task
//! configurations, loadable from TOML and lockable while a core service runs.
//!
//! # File format
//!
//! ```toml
//! [core]
//! storage_folder = ".data"
//! repository_type = "filesystem"
//!
//! [data_nodes.sales]
//! storage_type = "csv"
//! scope = "GLOBAL"
//! path = "sales.csv"
//!
//! [tasks.clean]
//! function = "jobs::clean"
//! inputs = ["sales"]
//! outputs = ["cleaned"]
//! ```

use crate::config::{CoreSection, DataNodeConfig, DataNodeSection, FunctionRef, TaskConfig};
use crate::id::{validate_id, IdError};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration registry
#[derive(Debug, Default)]
pub struct Config {
    state: RwLock<ConfigState>,
}

#[derive(Debug, Default)]
struct ConfigState {
    blocked: bool,
    core: CoreSection,
    data_nodes: IndexMap<String, DataNodeConfig>,
    tasks: IndexMap<String, TaskSection>,
    file: Option<ConfigFile>,
}

/// Task section: data nodes are referenced by configuration id
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct TaskSection {
    function: FunctionRef,
    #[serde(default)]
    inputs: Vec<String>,
    #[serde(default)]
    outputs: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    core: Option<CoreSection>,
    #[serde(default)]
    data_nodes: IndexMap<String, DataNodeSection>,
    #[serde(default)]
    tasks: IndexMap<String, TaskSection>,
}

/// Problem reported by [`Config::check`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Offending configuration id
    pub config_id: String,
    /// Human-readable description
    pub message: String,
}

impl Config {
    /// Create empty registry with a default core section
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TOML configuration file
    ///
    /// # Errors
    /// Returns error if the registry is blocked, the file cannot be read or
    /// its content is invalid
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&content)
    }

    /// Load a TOML configuration document
    ///
    /// Data node sections override the properties of configurations with the
    /// same id, whether they were added before or after loading.
    ///
    /// # Errors
    /// Returns error if the registry is blocked or the document is invalid
    pub fn load_str(&self, content: &str) -> Result<(), ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        for id in file.data_nodes.keys().chain(file.tasks.keys()) {
            validate_id(id)?;
        }

        let mut state = self.state.write();
        Self::ensure_unblocked(&state)?;

        if let Some(core) = &file.core {
            state.core = core.clone();
        }
        for (id, section) in &file.data_nodes {
            match state.data_nodes.get_mut(id) {
                Some(existing) => existing.apply_override(section),
                None => {
                    let mut config = DataNodeConfig::new(id.clone())?;
                    config.apply_override(section);
                    state.data_nodes.insert(id.clone(), config);
                }
            }
        }
        for (id, section) in &file.tasks {
            state.tasks.insert(id.clone(), section.clone());
        }
        tracing::debug!(
            data_nodes = file.data_nodes.len(),
            tasks = file.tasks.len(),
            "Loaded configuration document"
        );
        state.file = Some(file);
        Ok(())
    }

    /// Register a data node configuration
    ///
    /// Returns the effective configuration, after file overrides.
    ///
    /// # Errors
    /// Returns error if the registry is blocked
    pub fn add_data_node(&self, config: DataNodeConfig) -> Result<DataNodeConfig, ConfigError> {
        let mut state = self.state.write();
        Self::ensure_unblocked(&state)?;

        let mut config = config;
        if let Some(section) = state.file.as_ref().and_then(|f| f.data_nodes.get(config.id())) {
            config.apply_override(section);
        }
        state.data_nodes.insert(config.id().to_string(), config.clone());
        Ok(config)
    }

    /// Register a task configuration referencing data nodes by id
    ///
    /// Referenced data node configurations must be registered before the
    /// task configuration is resolved with [`Config::task`].
    ///
    /// # Errors
    /// Returns error if the registry is blocked or `id` is invalid
    pub fn add_task(
        &self,
        id: &str,
        function: FunctionRef,
        inputs: &[&str],
        outputs: &[&str],
    ) -> Result<(), ConfigError> {
        validate_id(id)?;
        let mut state = self.state.write();
        Self::ensure_unblocked(&state)?;

        let mut section = TaskSection {
            function,
            inputs: inputs.iter().map(|s| (*s).to_string()).collect(),
            outputs: outputs.iter().map(|s| (*s).to_string()).collect(),
        };
        if let Some(file_section) = state.file.as_ref().and_then(|f| f.tasks.get(id)) {
            section = file_section.clone();
        }
        state.tasks.insert(id.to_string(), section);
        Ok(())
    }

    /// Registered data node configuration
    #[must_use]
    pub fn data_node(&self, id: &str) -> Option<DataNodeConfig> {
        self.state.read().data_nodes.get(id).cloned()
    }

    /// Every registered data node configuration
    #[must_use]
    pub fn data_nodes(&self) -> Vec<DataNodeConfig> {
        self.state.read().data_nodes.values().cloned().collect()
    }

    /// Resolve a task configuration with its data node configurations
    ///
    /// # Errors
    /// Returns error if the task or one of its data nodes is not registered
    pub fn task(&self, id: &str) -> Result<TaskConfig, ConfigError> {
        let state = self.state.read();
        let section = state
            .tasks
            .get(id)
            .ok_or_else(|| ConfigError::UnknownTask(id.to_string()))?;

        let resolve = |dn_id: &String| {
            state
                .data_nodes
                .get(dn_id)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownDataNode {
                    task: id.to_string(),
                    data_node: dn_id.clone(),
                })
        };

        let mut config = TaskConfig::new(id, section.function.clone())?;
        for input in &section.inputs {
            config = config.with_input(resolve(input)?);
        }
        for output in &section.outputs {
            config = config.with_output(resolve(output)?);
        }
        Ok(config)
    }

    /// Ids of every registered task configuration
    #[must_use]
    pub fn task_ids(&self) -> Vec<String> {
        self.state.read().tasks.keys().cloned().collect()
    }

    /// Core section
    #[must_use]
    pub fn core(&self) -> CoreSection {
        self.state.read().core.clone()
    }

    /// Replace the core section
    ///
    /// # Errors
    /// Returns error if the registry is blocked
    pub fn set_core(&self, core: CoreSection) -> Result<(), ConfigError> {
        let mut state = self.state.write();
        Self::ensure_unblocked(&state)?;
        state.core = core;
        Ok(())
    }

    /// Validate registered configurations
    ///
    /// Reports data nodes whose storage type is not in `storage_types` and
    /// tasks referencing unregistered data nodes.
    #[must_use]
    pub fn check(&self, storage_types: &[&str]) -> Vec<ConfigIssue> {
        let state = self.state.read();
        let mut issues = Vec::new();

        for config in state.data_nodes.values() {
            if !storage_types.contains(&config.storage_type()) {
                issues.push(ConfigIssue {
                    config_id: config.id().to_string(),
                    message: format!(
                        "storage type '{}' is not one of {}",
                        config.storage_type(),
                        storage_types.join(", ")
                    ),
                });
            }
        }

        for (id, task) in &state.tasks {
            for dn_id in task.inputs.iter().chain(&task.outputs) {
                if !state.data_nodes.contains_key(dn_id) {
                    issues.push(ConfigIssue {
                        config_id: id.clone(),
                        message: format!("data node '{dn_id}' is not registered"),
                    });
                }
            }
        }

        issues
    }

    /// Reject every update until [`Config::unblock_update`]
    pub fn block_update(&self) {
        tracing::info!("Blocking configuration update");
        self.state.write().blocked = true;
    }

    /// Accept updates again
    pub fn unblock_update(&self) {
        tracing::info!("Unblocking configuration update");
        self.state.write().blocked = false;
    }

    /// Whether updates are currently rejected
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.state.read().blocked
    }

    fn ensure_unblocked(state: &ConfigState) -> Result<(), ConfigError> {
        if state.blocked {
            return Err(ConfigError::UpdateBlocked);
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Registry is locked by a running core service
    #[error("configuration update is blocked while the core service is running")]
    UpdateBlocked,

    /// Invalid identifier
    #[error(transparent)]
    InvalidId(#[from] IdError),

    /// Configuration file could not be read
    #[error("cannot read configuration file {path}: {source}")]
    Read {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration document is malformed
    #[error("invalid configuration document: {0}")]
    Parse(#[from] toml::de::Error),

    /// Task configuration not registered
    #[error("task configuration '{0}' is not registered")]
    UnknownTask(String),

    /// Task references an unregistered data node
    #[error("task '{task}' references unregistered data node '{data_node}'")]
    UnknownDataNode {
        /// Task configuration id
        task: String,
        /// Missing data node configuration id
        data_node: String,
    },
}
