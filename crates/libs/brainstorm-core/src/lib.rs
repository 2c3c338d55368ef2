//! # brainstorm-core: Storage and Coordination Engine
//!
//! `brainstorm-core` contains the domain logic and persistence layer for the
//! Brainstorm multi-agent collaboration server.
//!
//! There is no database: all state lives as directories and JSON files under
//! a single data root. Concurrency correctness comes from advisory file locks
//! plus atomic write-temp-then-rename primitives, so that separate agent
//! processes sharing the data root observe consistent state.
//!
//! ## Architecture
//!
//! - **BMC Layer**: Stateless controllers for all storage operations
//! - **Model Structs**: Serializable records for every on-disk entity
//! - **ModelManager**: Central handle for the data root and configuration
//! - **Store**: Atomic I/O, advisory locking, and long-poll primitives
//!
//! ## Key Modules
//!
//! - [`model`]: All BMC controllers and data models
//! - [`store`]: Atomic filesystem operations, locks, and polling
//! - [`ctx`]: Request context carrying the caller's session identity
//!
//! ## Example
//!
//! ```no_run
//! use brainstorm_core::model::{ModelManager, project::ProjectBmc};
//! use brainstorm_core::ctx::Ctx;
//!
//! async fn example() -> brainstorm_core::Result<()> {
//!     let mm = ModelManager::new(Default::default())?;
//!     let ctx = Ctx::new("11111111-2222-3333-4444-555555555555");
//!
//!     let projects = ProjectBmc::list(&ctx, &mm, 0, 100, false)?;
//!     println!("Found {} projects", projects.len());
//!     Ok(())
//! }
//! ```

/// Request context carrying the caller's session identity.
pub mod ctx;

/// Error types and Result alias for brainstorm-core operations.
pub mod error;

/// Backend Model Controllers (BMC) and data models for all entities.
pub mod model;

/// Low-level filesystem storage: atomic writes, locks, long-polling.
pub mod store;

/// Identifier, payload, and path validation.
pub mod utils;

// Re-export core types
pub use ctx::Ctx;
pub use error::{Error, Result};
pub use model::ModelManager;
