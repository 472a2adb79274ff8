//! Data node entity
//!
//! Provides [`DataNode`], one logical data container, and typed views over
//! backend-specific properties.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weft_model::{DataNodeId, JobId, Properties, ResolutionKey, Scope};
use weft_repository::Model;

/// Property holding the cacheable flag
pub const CACHEABLE_PROPERTY: &str = "cacheable";

/// One logical data container
///
/// Plain getters never perform I/O. Use the manager (or a synced handle) to
/// observe what other holders persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataNode {
    id: DataNodeId,
    config_id: String,
    scope: Scope,
    storage_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_id: Option<String>,
    #[serde(default)]
    last_edition_date: Option<DateTime<Utc>>,
    #[serde(default)]
    job_ids: Vec<JobId>,
    #[serde(default)]
    edition_in_progress: bool,
    #[serde(default)]
    properties: Properties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resolution_key: Option<ResolutionKey>,
}

impl DataNode {
    /// Create a never-written data node
    #[must_use]
    pub fn new(
        id: DataNodeId,
        config_id: impl Into<String>,
        scope: Scope,
        storage_type: impl Into<String>,
        properties: Properties,
    ) -> Self {
        Self {
            id,
            config_id: config_id.into(),
            scope,
            storage_type: storage_type.into(),
            parent_id: None,
            last_edition_date: None,
            job_ids: Vec::new(),
            edition_in_progress: false,
            properties,
            resolution_key: None,
        }
    }

    /// With owning cycle, scenario or pipeline id
    #[inline]
    #[must_use]
    pub fn with_parent_id(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Unique id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &DataNodeId {
        &self.id
    }

    /// Configuration id this node was created from
    #[inline]
    #[must_use]
    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    /// Scope, fixed at creation
    #[inline]
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Storage type tag, fixed at creation
    #[inline]
    #[must_use]
    pub fn storage_type(&self) -> &str {
        &self.storage_type
    }

    /// Owning cycle, scenario or pipeline id
    #[inline]
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Date of the last completed write
    #[inline]
    #[must_use]
    pub fn last_edition_date(&self) -> Option<DateTime<Utc>> {
        self.last_edition_date
    }

    /// Jobs that wrote this node, oldest first
    #[inline]
    #[must_use]
    pub fn job_ids(&self) -> &[JobId] {
        &self.job_ids
    }

    /// Whether a write is currently in progress
    #[inline]
    #[must_use]
    pub fn edition_in_progress(&self) -> bool {
        self.edition_in_progress
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

    /// Key this node was created under, if any
    #[inline]
    #[must_use]
    pub fn resolution_key(&self) -> Option<&ResolutionKey> {
        self.resolution_key.as_ref()
    }

    /// Whether the node holds data that can be read
    #[inline]
    #[must_use]
    pub fn is_ready_for_reading(&self) -> bool {
        self.last_edition_date.is_some() && !self.edition_in_progress
    }

    /// Value of the `cacheable` property, `false` when absent
    #[must_use]
    pub fn cacheable(&self) -> bool {
        self.properties
            .get(CACHEABLE_PROPERTY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Set the date of the last completed write
    #[inline]
    pub fn set_last_edition_date(&mut self, date: Option<DateTime<Utc>>) {
        self.last_edition_date = date;
    }

    /// Set the edition-in-progress flag
    #[inline]
    pub fn set_edition_in_progress(&mut self, in_progress: bool) {
        self.edition_in_progress = in_progress;
    }

    /// Record the key this node is indexed under
    #[inline]
    pub fn set_resolution_key(&mut self, key: Option<ResolutionKey>) {
        self.resolution_key = key;
    }

    /// Record a completed write
    ///
    /// Stamps the edition date, appends the job id when given and clears the
    /// edition-in-progress flag.
    pub fn track_edit(&mut self, job_id: Option<JobId>) {
        self.last_edition_date = Some(Utc::now());
        if let Some(job_id) = job_id {
            self.job_ids.push(job_id);
        }
        self.edition_in_progress = false;
    }

    /// Typed view for `csv` nodes
    #[must_use]
    pub fn as_csv(&self) -> Option<CsvDataNode<'_>> {
        (self.storage_type == crate::storage::csv::STORAGE_TYPE).then_some(CsvDataNode { node: self })
    }
}

impl Model for DataNode {
    const KIND: &'static str = "data_node";

    fn model_id(&self) -> &str {
        self.id.as_str()
    }
}

impl AsRef<str> for DataNode {
    fn as_ref(&self) -> &str {
        self.id.as_str()
    }
}

/// Read-only view of a `csv` data node
#[derive(Debug, Clone, Copy)]
pub struct CsvDataNode<'a> {
    node: &'a DataNode,
}

impl<'a> CsvDataNode<'a> {
    /// Path of the file
    #[must_use]
    pub fn path(&self) -> Option<&'a str> {
        self.node
            .properties
            .get(crate::storage::csv::PATH_PROPERTY)
            .and_then(serde_json::Value::as_str)
    }

    /// Whether the first row is a header
    #[must_use]
    pub fn has_header(&self) -> bool {
        self.node
            .properties
            .get(crate::storage::csv::HAS_HEADER_PROPERTY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(true)
    }

    /// Underlying node
    #[inline]
    #[must_use]
    pub fn node(&self) -> &'a DataNode {
        self.node
    }
}
