//! Low-level filesystem storage for brainstorm-core.
//!
//! This module provides the storage layer, handling:
//!
//! - **Path schema**: the typed on-disk layout under the data root
//! - **Atomic I/O**: write-temp-then-rename with fsync ([`atomic`])
//! - **Advisory locking**: cross-process file locks ([`dir_lock`])
//! - **Long-polling**: bounded filesystem condition waits ([`longpoll`])
//!
//! # Architecture
//!
//! The filesystem *is* the database. Every entity is a JSON file; every
//! mutation goes through [`atomic`] so that readers in sibling processes
//! never observe a torn write. Invariants that span multiple files (member
//! roles, inbox reads, resource updates) are guarded by [`dir_lock`] locks
//! scoped to the smallest directory that still guarantees the invariant.
//!
//! # On-disk layout
//!
//! ```text
//! <root>/projects/<project_id>/metadata.json
//! <root>/projects/<project_id>/members/<agent_name>.json
//! <root>/projects/<project_id>/resources/<resource_id>/manifest.json
//! <root>/projects/<project_id>/resources/<resource_id>/payload/{data|ref}
//! <root>/projects/<project_id>/messages/<agent_name>/<ts>-<uuid>.json
//! <root>/projects/<project_id>/messages/<agent_name>/archive/...
//! <root>/clients/<client_id>/identity.json
//! <root>/clients/<client_id>/memberships.json
//! <root>/audit/<yyyy-mm-dd>.log
//! ```

use std::path::{Path, PathBuf};

pub mod atomic;
pub mod dir_lock;
pub mod longpoll;

/// Typed view of the data-root directory layout.
///
/// All path construction goes through this struct so that no caller ever
/// joins an unvalidated identifier onto the root by hand.
#[derive(Debug, Clone)]
pub struct DataRoot {
    root: PathBuf,
}

impl DataRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.root.join("projects")
    }

    /// Lock serializing project creation.
    pub fn projects_lock_dir(&self) -> PathBuf {
        self.projects_dir()
    }

    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.projects_dir().join(project_id)
    }

    pub fn project_metadata(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("metadata.json")
    }

    pub fn members_dir(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("members")
    }

    pub fn member_record(&self, project_id: &str, agent_name: &str) -> PathBuf {
        self.members_dir(project_id)
            .join(format!("{agent_name}.json"))
    }

    pub fn resources_dir(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("resources")
    }

    pub fn resource_dir(&self, project_id: &str, resource_id: &str) -> PathBuf {
        self.resources_dir(project_id).join(resource_id)
    }

    pub fn resource_manifest(&self, project_id: &str, resource_id: &str) -> PathBuf {
        self.resource_dir(project_id, resource_id).join("manifest.json")
    }

    pub fn resource_payload_dir(&self, project_id: &str, resource_id: &str) -> PathBuf {
        self.resource_dir(project_id, resource_id).join("payload")
    }

    pub fn resource_payload_data(&self, project_id: &str, resource_id: &str) -> PathBuf {
        self.resource_payload_dir(project_id, resource_id).join("data")
    }

    pub fn resource_payload_ref(&self, project_id: &str, resource_id: &str) -> PathBuf {
        self.resource_payload_dir(project_id, resource_id).join("ref")
    }

    pub fn messages_dir(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join("messages")
    }

    pub fn inbox_dir(&self, project_id: &str, agent_name: &str) -> PathBuf {
        self.messages_dir(project_id).join(agent_name)
    }

    pub fn inbox_archive_dir(&self, project_id: &str, agent_name: &str) -> PathBuf {
        self.inbox_dir(project_id, agent_name).join("archive")
    }

    pub fn clients_dir(&self) -> PathBuf {
        self.root.join("clients")
    }

    pub fn client_dir(&self, client_id: &str) -> PathBuf {
        self.clients_dir().join(client_id)
    }

    pub fn client_identity(&self, client_id: &str) -> PathBuf {
        self.client_dir(client_id).join("identity.json")
    }

    pub fn client_memberships(&self, client_id: &str) -> PathBuf {
        self.client_dir(client_id).join("memberships.json")
    }

    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    pub fn audit_log(&self, date: chrono::NaiveDate) -> PathBuf {
        self.audit_dir().join(format!("{}.log", date.format("%Y-%m-%d")))
    }

    /// Create the top-level directory skeleton.
    ///
    /// Fails if the data root is not writable; the server refuses to start
    /// in that case.
    pub fn ensure_skeleton(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.projects_dir())?;
        std::fs::create_dir_all(self.clients_dir())?;
        std::fs::create_dir_all(self.audit_dir())?;
        Ok(())
    }
}
