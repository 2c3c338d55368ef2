//! # Model Layer - BMC Pattern Implementation
//!
//! This module contains all Backend Model Controllers (BMCs) and their
//! associated data structures for the Brainstorm storage engine.
//!
//! ## BMC Pattern
//!
//! Each entity has:
//! - **Data Struct**: Serializable model (e.g., `Project`, `Member`)
//! - **ForCreate Struct**: Input for creation operations
//! - **Bmc Struct**: Stateless controller with async CRUD methods
//!
//! ## Available Controllers
//!
//! | BMC | Description |
//! |-----|-------------|
//! | `project::ProjectBmc` | Project lifecycle, archiving, coordinator backfill |
//! | `member::MemberBmc` | Membership, heartbeats, coordinator handover |
//! | `resource::ResourceBmc` | Versioned shared resources with ACLs |
//! | `message::MessageBmc` | Direct and broadcast messaging, inbox archive |
//! | `identity::ClientBmc` | Session identity and membership index |
//! | `audit::AuditBmc` | Append-only audit log |
//!
//! ## ModelManager
//!
//! The [`ModelManager`] carries the data root and configuration through
//! every call; there is no global state and no in-memory cache — the
//! filesystem is the source of truth for all concurrent callers.

pub mod audit;
pub mod identity;
pub mod member;
pub mod message;
pub mod project;
pub mod resource;

use crate::Result;
use crate::store::DataRoot;
use brainstorm_common::config::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct ModelManager {
    root: DataRoot,
    app_config: Arc<AppConfig>,
}

impl ModelManager {
    /// Constructor. Creates the data-root skeleton; a non-writable root is
    /// a startup failure.
    pub fn new(app_config: Arc<AppConfig>) -> Result<Self> {
        let root = DataRoot::new(app_config.storage.data_root.clone());
        root.ensure_skeleton()?;
        info!(root = %root.root().display(), "Storage engine ready");
        Ok(ModelManager { root, app_config })
    }

    /// Constructor for testing with a custom data root.
    /// This is public so integration tests can use it.
    pub fn new_for_test(data_root: PathBuf, app_config: Arc<AppConfig>) -> Result<Self> {
        let root = DataRoot::new(data_root);
        root.ensure_skeleton()?;
        Ok(ModelManager { root, app_config })
    }

    /// Typed view of the on-disk layout.
    pub fn root(&self) -> &DataRoot {
        &self.root
    }

    /// Application configuration (limits, wait bounds).
    pub fn config(&self) -> &AppConfig {
        &self.app_config
    }
}
