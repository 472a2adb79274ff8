//! weft Model
//!
//! Value types shared by every weft crate.
//!
//! # Overview
//!
//! - **Scope**: breadth level at which an entity is shared
//! - **Identifiers**: configuration id validation and entity id newtypes
//! - **ResolutionKey**: the tuple deciding whether an entity is reused
//! - **Configs**: immutable data node and task templates
//! - **Config**: TOML-backed registry, blockable while the core runs
//!
//! # Example
//!
//! ```rust
//! use weft_model::{Config, DataNodeConfig, Scope};
//!
//! let config = Config::new();
//! let sales = config
//!     .add_data_node(
//!         DataNodeConfig::new("sales")
//!             .unwrap()
//!             .with_storage_type("csv")
//!             .with_scope(Scope::Global)
//!             .with_property("path", "sales.csv"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(sales.scope(), Scope::Global);
//! assert!(config.check(&["csv"]).is_empty());
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod id;
pub mod registry;
pub mod resolution;
pub mod scope;

// Re-exports
pub use config::{CoreSection, DataNodeConfig, FunctionRef, Properties, RepositoryType, TaskConfig};
pub use id::{validate_id, DataNodeId, IdError, JobId, TaskId, ID_SEPARATOR};
pub use registry::{Config, ConfigError, ConfigIssue};
pub use resolution::ResolutionKey;
pub use scope::{Scope, ScopeError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for configuring weft entities
    pub use crate::{
        Config, CoreSection, DataNodeConfig, DataNodeId, FunctionRef, JobId, Properties,
        RepositoryType, ResolutionKey, Scope, TaskConfig, TaskId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
