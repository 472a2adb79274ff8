//! weft Repository
//!
//! Durable keyed storage for entity models.
//!
//! # Architecture
//!
//! ```text
//!  EntityManager<E>
//!        │
//!        ▼
//!  Repository<M>   [Trait]
//!        │
//!        ├─ FileRepository    one JSON document per model
//!        └─ MemoryRepository  process-local, for tests
//! ```
//!
//! Models are keyed by their id. A model is only ever handed out by value:
//! callers own what they load and must `save` to publish changes.
//!
//! # Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use weft_repository::{MemoryRepository, Model, Repository};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Note {
//!     id: String,
//!     text: String,
//! }
//!
//! impl Model for Note {
//!     const KIND: &'static str = "note";
//!
//!     fn model_id(&self) -> &str {
//!         &self.id
//!     }
//! }
//!
//! let repo = MemoryRepository::<Note>::new();
//! repo.save(&Note { id: "n1".into(), text: "hello".into() }).unwrap();
//! assert_eq!(repo.load("n1").unwrap().text, "hello");
//! ```

#![warn(missing_docs)]

pub mod file;
pub mod memory;

mod error;
mod model;
mod traits;

// Re-exports
pub use error::{RepositoryError, Result};
pub use file::FileRepository;
pub use memory::MemoryRepository;
pub use model::{validate_model_id, Model};
pub use traits::Repository;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
