//! Common test utilities and fixtures
//!
//! Provides test helpers for setting up isolated test environments.
//!
//! ## Design Principles
//! - Each test gets its own isolated data root (unique temp dir)
//! - Cleanup happens automatically via TempDir RAII

#![allow(dead_code)]

use brainstorm_common::config::AppConfig;
use brainstorm_core::model::member::{MemberBmc, MemberForJoin};
use brainstorm_core::model::project::{Project, ProjectBmc, ProjectForCreate};
use brainstorm_core::{Ctx, ModelManager, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Test context that manages a temporary data root.
pub struct TestContext {
    pub mm: ModelManager,
    pub ctx: Ctx,
    #[allow(dead_code)]
    temp_dir: TempDir, // Keep alive for duration of test
}

impl TestContext {
    /// Create a new test context with an isolated data root.
    pub fn new() -> Result<Self> {
        Self::new_with_config(AppConfig::default())
    }

    pub fn new_with_config(mut config: AppConfig) -> Result<Self> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_root = temp_dir.path().join("brainstorm");
        config.storage.data_root = data_root.clone();

        let mm = ModelManager::new_for_test(data_root, Arc::new(config))?;
        let ctx = Ctx::new("test-client-0001");

        Ok(Self { mm, ctx, temp_dir })
    }

    /// Context for a second, distinct client session.
    pub fn other_ctx(&self) -> Ctx {
        Ctx::new("test-client-0002")
    }

    /// Get the data root path for direct filesystem assertions.
    pub fn data_root(&self) -> PathBuf {
        self.mm.root().root().to_path_buf()
    }

    /// Create a project with `creator` auto-joined as coordinator.
    pub async fn create_project(&self, project_id: &str, creator: &str) -> Result<Project> {
        ProjectBmc::create(
            &self.ctx,
            &self.mm,
            ProjectForCreate {
                project_id: project_id.to_string(),
                name: format!("{project_id} workspace"),
                created_by: Some(creator.to_string()),
            },
        )
        .await
    }

    /// Join `agent` as a contributor of `project_id` under `ctx`.
    pub async fn join(&self, ctx: &Ctx, project_id: &str, agent: &str) -> Result<()> {
        MemberBmc::join(
            ctx,
            &self.mm,
            MemberForJoin {
                project_id: project_id.to_string(),
                agent_name: agent.to_string(),
                capabilities: Vec::new(),
                labels: Default::default(),
            },
        )
        .await?;
        Ok(())
    }
}
