//! Task entity
//!
//! A [`Task`] aggregates named input and output data nodes and derives its
//! scope from them. Tasks are persisted as [`TaskModel`], which references
//! data nodes by id.

use crate::data_manager::DataManager;
use crate::entity::{Entity, Hydrate};
use crate::error::CoreError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weft_data::DataNode;
use weft_model::{validate_id, DataNodeId, FunctionRef, ResolutionKey, Scope, TaskId};
use weft_repository::Model;

/// One executable unit and the data nodes it reads and writes
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: TaskId,
    config_id: String,
    parent_id: Option<String>,
    function: FunctionRef,
    input: IndexMap<String, DataNode>,
    output: IndexMap<String, DataNode>,
    resolution_key: Option<ResolutionKey>,
}

impl Task {
    /// Create a task with a fresh id
    ///
    /// Inputs and outputs are keyed by their configuration id.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidIdentifier`] if `config_id` is invalid
    pub fn new(
        config_id: impl Into<String>,
        function: FunctionRef,
        input: impl IntoIterator<Item = DataNode>,
        output: impl IntoIterator<Item = DataNode>,
    ) -> Result<Self, CoreError> {
        let config_id = config_id.into();
        validate_id(&config_id)?;
        Ok(Self {
            id: TaskId::generate(&config_id),
            config_id,
            parent_id: None,
            function,
            input: keyed(input),
            output: keyed(output),
            resolution_key: None,
        })
    }

    /// With owning cycle, scenario or pipeline id
    #[inline]
    #[must_use]
    pub fn with_parent_id(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// With an explicit id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Unique id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// Configuration id this task was created from
    #[inline]
    #[must_use]
    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    /// Owning cycle, scenario or pipeline id
    #[inline]
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Function reference
    #[inline]
    #[must_use]
    pub fn function(&self) -> &FunctionRef {
        &self.function
    }

    /// Replace the function reference
    #[inline]
    pub fn set_function(&mut self, function: FunctionRef) {
        self.function = function;
    }

    /// Input data nodes keyed by configuration id
    #[inline]
    #[must_use]
    pub fn input(&self) -> &IndexMap<String, DataNode> {
        &self.input
    }

    /// Output data nodes keyed by configuration id
    #[inline]
    #[must_use]
    pub fn output(&self) -> &IndexMap<String, DataNode> {
        &self.output
    }

    /// Key this task was created under, if any
    #[inline]
    #[must_use]
    pub fn resolution_key(&self) -> Option<&ResolutionKey> {
        self.resolution_key.as_ref()
    }

    /// Record the key this task is indexed under
    #[inline]
    pub fn set_resolution_key(&mut self, key: Option<ResolutionKey>) {
        self.resolution_key = key;
    }

    /// Inputs and outputs; an output overrides an input of the same key
    #[must_use]
    pub fn data_nodes(&self) -> IndexMap<&str, &DataNode> {
        self.input
            .iter()
            .chain(&self.output)
            .map(|(key, node)| (key.as_str(), node))
            .collect()
    }

    /// Broadest scope among attached data nodes, `Global` when none
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::broadest(self.data_nodes().values().map(|node| node.scope())).unwrap_or(Scope::Global)
    }

    /// Data node attached under `name`, inputs first
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidIdentifier`] if `name` is not an
    /// identifier, [`CoreError::UnknownAttribute`] if nothing is attached
    /// under it
    pub fn resolve(&self, name: &str) -> Result<&DataNode, CoreError> {
        validate_id(name)?;
        self.input
            .get(name)
            .or_else(|| self.output.get(name))
            .ok_or_else(|| CoreError::UnknownAttribute {
                name: name.to_string(),
                task_id: self.id.to_string(),
            })
    }
}

impl AsRef<str> for Task {
    fn as_ref(&self) -> &str {
        self.id.as_str()
    }
}

fn keyed(nodes: impl IntoIterator<Item = DataNode>) -> IndexMap<String, DataNode> {
    nodes
        .into_iter()
        .map(|node| (node.config_id().to_string(), node))
        .collect()
}

/// Persisted form of a [`Task`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskModel {
    /// Task id
    pub id: TaskId,
    /// Configuration id
    pub config_id: String,
    /// Owning cycle, scenario or pipeline id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Function reference
    pub function: FunctionRef,
    /// Input data node ids, in order
    pub input_ids: Vec<DataNodeId>,
    /// Output data node ids, in order
    pub output_ids: Vec<DataNodeId>,
    /// Key the task was created under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_key: Option<ResolutionKey>,
}

impl TaskModel {
    /// Input then output node ids
    pub fn data_node_ids(&self) -> impl Iterator<Item = &DataNodeId> {
        self.input_ids.iter().chain(&self.output_ids)
    }
}

impl Model for TaskModel {
    const KIND: &'static str = "task";

    fn model_id(&self) -> &str {
        self.id.as_str()
    }
}

impl Entity for Task {
    type Model = TaskModel;

    fn entity_id(&self) -> &str {
        self.id.as_str()
    }

    fn to_model(&self) -> TaskModel {
        TaskModel {
            id: self.id.clone(),
            config_id: self.config_id.clone(),
            parent_id: self.parent_id.clone(),
            function: self.function.clone(),
            input_ids: self.input.values().map(|node| node.id().clone()).collect(),
            output_ids: self.output.values().map(|node| node.id().clone()).collect(),
            resolution_key: self.resolution_key.clone(),
        }
    }
}

/// Rebuilds tasks with the current state of their data nodes
#[derive(Debug, Clone)]
pub(crate) struct TaskHydrator {
    data: DataManager,
}

impl TaskHydrator {
    pub(crate) fn new(data: DataManager) -> Self {
        Self { data }
    }

    /// Nodes still stored under `ids`; deleted ones are left out
    fn load_all(&self, task_id: &TaskId, ids: &[DataNodeId]) -> Result<Vec<DataNode>, CoreError> {
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            match self.data.get(id)? {
                Some(node) => nodes.push(node),
                None => tracing::warn!(task = %task_id, data_node = %id, "Task references a deleted data node"),
            }
        }
        Ok(nodes)
    }
}

impl Hydrate<Task> for TaskHydrator {
    fn hydrate(&self, model: TaskModel) -> Result<Task, CoreError> {
        Ok(Task {
            input: keyed(self.load_all(&model.id, &model.input_ids)?),
            output: keyed(self.load_all(&model.id, &model.output_ids)?),
            id: model.id,
            config_id: model.config_id,
            parent_id: model.parent_id,
            function: model.function,
            resolution_key: model.resolution_key,
        })
    }
}
