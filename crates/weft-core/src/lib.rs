//! weft Core
//!
//! Entity identity and lifecycle for data pipelines.
//!
//! # Overview
//!
//! - **EntityManager**: create / get / set / delete over a repository
//! - **DataManager**: data node creation, scope resolution and data access
//! - **Task / TaskManager**: tasks aggregating data nodes, scope derived from them
//! - **Synced**: read-refresh / write-through handle on an entity
//! - **Core**: service wiring configuration, repositories and managers
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use weft_core::Core;
//! use weft_model::{Config, CoreSection, DataNodeConfig, RepositoryType, Scope};
//!
//! let config = Arc::new(Config::new());
//! config
//!     .set_core(CoreSection::new().with_repository_type(RepositoryType::Memory))
//!     .unwrap();
//! let sales = config
//!     .add_data_node(
//!         DataNodeConfig::new("sales")
//!             .unwrap()
//!             .with_storage_type("in_memory")
//!             .with_scope(Scope::Global),
//!     )
//!     .unwrap();
//!
//! let core = Core::new(config).unwrap();
//! let data = core.data_manager();
//!
//! let a = data.get_or_create(&sales, Some("scenario_1"), None).unwrap();
//! let b = data.get_or_create(&sales, Some("scenario_2"), None).unwrap();
//! assert_eq!(a.id(), b.id());
//! ```

#![warn(missing_docs)]

pub mod data_manager;
pub mod entity;
pub mod error;
pub mod resolution;
pub mod service;
pub mod synced;
pub mod task;
pub mod task_manager;

// Re-exports
pub use data_manager::DataManager;
pub use entity::{Entity, EntityManager, Hydrate, SelfHydrate};
pub use error::CoreError;
pub use resolution::ResolutionIndex;
pub use service::Core;
pub use synced::Synced;
pub use task::{Task, TaskModel};
pub use task_manager::TaskManager;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for managing weft entities
    pub use crate::{Core, CoreError, DataManager, Synced, Task, TaskManager};
    pub use weft_data::DataNode;
    pub use weft_model::{Config, DataNodeConfig, FunctionRef, Scope, TaskConfig};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
