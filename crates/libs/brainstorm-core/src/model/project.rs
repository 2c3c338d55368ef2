//! Project lifecycle: creation, listing, archiving, deletion, and the
//! coordinator backfill for pre-v0.10 data.

use crate::ctx::Ctx;
use crate::error::{Error, Result};
use crate::model::ModelManager;
use crate::model::audit::AuditBmc;
use crate::model::identity::{ClientBmc, MembershipEntry};
use crate::model::member::{Member, MemberBmc, Role};
use crate::store::atomic;
use crate::store::dir_lock::{DirLock, LOCK_TIMEOUT};
use crate::utils::validation::validate_identifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current on-disk schema version written to new project metadata.
pub const SCHEMA_VERSION: &str = "1.0";

/// Pagination defaults for `listProjects` / `listResources`.
pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const MAX_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub schema_version: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectForCreate {
    pub project_id: String,
    pub name: String,
    /// Agent name of the creator; when present the creator is written as a
    /// coordinator member in the same operation.
    pub created_by: Option<String>,
}

pub struct ProjectBmc;

impl ProjectBmc {
    /// Create a project.
    ///
    /// Creation races are serialized twice over: the projects-directory
    /// lock, and the exclusive create of `metadata.json` underneath it.
    /// Exactly one concurrent caller wins; the rest see
    /// [`Error::AlreadyExists`].
    pub async fn create(ctx: &Ctx, mm: &ModelManager, project_c: ProjectForCreate) -> Result<Project> {
        validate_identifier("project_id", &project_c.project_id)?;
        if let Some(creator) = project_c.created_by.as_deref() {
            validate_identifier("agent_name", creator)?;
        }

        let projects_dir = mm.root().projects_dir();
        let lock = DirLock::for_dir(&projects_dir);
        let _guard = lock.acquire(project_c.created_by.clone(), LOCK_TIMEOUT).await?;

        let project = Project {
            project_id: project_c.project_id.clone(),
            name: project_c.name.clone(),
            created_by: project_c.created_by.clone(),
            created_at: Utc::now(),
            schema_version: SCHEMA_VERSION.to_string(),
            archived: false,
            archived_at: None,
            archived_by: None,
            archive_reason: None,
        };

        let metadata_path = mm.root().project_metadata(&project.project_id);
        match atomic::create_json_exclusive(&metadata_path, &project) {
            Ok(()) => {}
            Err(Error::AlreadyExists(_)) => {
                return Err(Error::AlreadyExists(project.project_id.clone()));
            }
            Err(e) => return Err(e),
        }

        if let Some(creator) = project.created_by.clone() {
            let now = Utc::now();
            let member = Member {
                agent_name: creator.clone(),
                agent_id: Uuid::new_v4(),
                client_id: Some(ctx.client_id().to_string()),
                joined_at: now,
                last_seen: now,
                online: true,
                capabilities: Vec::new(),
                labels: Default::default(),
                role: Some(Role::Coordinator),
            };
            atomic::write_json_atomic(
                &mm.root().member_record(&project.project_id, &creator),
                &member,
            )?;
            drop(_guard);

            ClientBmc::record_membership(
                mm,
                ctx.client_id(),
                MembershipEntry {
                    project_id: project.project_id.clone(),
                    agent_name: creator.clone(),
                    project_name: project.name.clone(),
                },
            )
            .await?;
            AuditBmc::record(
                mm,
                "create_project",
                &creator,
                Some(project.project_id.as_str()),
                None,
                "ok",
            );
        } else {
            drop(_guard);
            AuditBmc::record(
                mm,
                "create_project",
                ctx.client_id(),
                Some(project.project_id.as_str()),
                None,
                "ok",
            );
        }

        Ok(project)
    }

    pub fn get(_ctx: &Ctx, mm: &ModelManager, project_id: &str) -> Result<Project> {
        validate_identifier("project_id", project_id)?;
        atomic::read_json_opt(&mm.root().project_metadata(project_id))?
            .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))
    }

    /// Whether `metadata.json` exists for the project.
    pub fn exists(mm: &ModelManager, project_id: &str) -> Result<bool> {
        validate_identifier("project_id", project_id)?;
        Ok(mm.root().project_metadata(project_id).exists())
    }

    /// List projects in lexicographic `project_id` order.
    ///
    /// Archived projects are excluded unless `include_archived`. The limit
    /// is clamped to `[1, 1000]`.
    pub fn list(
        _ctx: &Ctx,
        mm: &ModelManager,
        offset: usize,
        limit: usize,
        include_archived: bool,
    ) -> Result<Vec<Project>> {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        let mut projects = Vec::new();
        for project_id in atomic::list_subdirs(&mm.root().projects_dir())? {
            let Some(project) =
                atomic::read_json_opt::<Project>(&mm.root().project_metadata(&project_id))?
            else {
                // Directory without metadata: a creation in flight, or debris.
                continue;
            };
            if project.archived && !include_archived {
                continue;
            }
            projects.push(project);
        }
        Ok(projects.into_iter().skip(offset).take(limit).collect())
    }

    /// Soft-archive a project. Creator-only; children are retained.
    pub async fn archive(
        ctx: &Ctx,
        mm: &ModelManager,
        project_id: &str,
        actor: &str,
        reason: Option<String>,
    ) -> Result<Project> {
        let mut project = Self::get(ctx, mm, project_id)?;
        Self::authorize_creator(mm, &project, actor, "archive_project")?;

        project.archived = true;
        project.archived_at = Some(Utc::now());
        project.archived_by = Some(actor.to_string());
        project.archive_reason = reason;
        atomic::write_json_atomic(&mm.root().project_metadata(project_id), &project)?;

        AuditBmc::record(mm, "archive_project", actor, Some(project_id), None, "ok");
        Ok(project)
    }

    /// Delete a project tree. Creator-only; membership-index entries of all
    /// member clients are swept afterwards.
    pub async fn delete(ctx: &Ctx, mm: &ModelManager, project_id: &str, actor: &str) -> Result<()> {
        let project = Self::get(ctx, mm, project_id)?;
        Self::authorize_creator(mm, &project, actor, "delete_project")?;

        let members = MemberBmc::list(ctx, mm, project_id)?;
        std::fs::remove_dir_all(mm.root().project_dir(project_id))?;

        for member in members {
            if let Some(client_id) = member.client_id.as_deref() {
                if let Err(e) =
                    ClientBmc::remove_membership(mm, client_id, project_id, &member.agent_name).await
                {
                    tracing::warn!(
                        client_id,
                        project_id,
                        error = %e,
                        "Failed to sweep membership index entry"
                    );
                }
            }
        }

        AuditBmc::record(mm, "delete_project", actor, Some(project_id), None, "ok");
        Ok(())
    }

    fn authorize_creator(mm: &ModelManager, project: &Project, actor: &str, op: &str) -> Result<()> {
        match project.created_by.as_deref() {
            Some(creator) if creator == actor => Ok(()),
            _ => {
                AuditBmc::record(mm, op, actor, Some(project.project_id.as_str()), None, "denied");
                Err(Error::Forbidden(format!(
                    "only the project creator may {op}"
                )))
            }
        }
    }

    /// Backward-compat migration: assign the coordinator role to the
    /// creator when no member holds it (pre-v0.10 data).
    ///
    /// Idempotent and safe to call from every project access path.
    pub async fn ensure_coordinator(ctx: &Ctx, mm: &ModelManager, project_id: &str) -> Result<()> {
        let project = Self::get(ctx, mm, project_id)?;
        let Some(creator) = project.created_by else {
            return Ok(());
        };

        let members = MemberBmc::list(ctx, mm, project_id)?;
        if members.iter().any(Member::is_coordinator) {
            return Ok(());
        }
        if !members.iter().any(|m| m.agent_name == creator) {
            return Ok(());
        }

        let members_dir = mm.root().members_dir(project_id);
        let lock = DirLock::for_dir(&members_dir);
        let _guard = lock.acquire(Some(creator.clone()), LOCK_TIMEOUT).await?;

        // Re-read under the lock: another access path may have backfilled.
        let members = MemberBmc::list(ctx, mm, project_id)?;
        if members.iter().any(Member::is_coordinator) {
            return Ok(());
        }
        let Some(mut member) = members.into_iter().find(|m| m.agent_name == creator) else {
            return Ok(());
        };
        member.role = Some(Role::Coordinator);
        atomic::write_json_atomic(&mm.root().member_record(project_id, &creator), &member)?;

        AuditBmc::record(
            mm,
            "ensure_coordinator",
            &creator,
            Some(project_id),
            None,
            "ok",
        );
        Ok(())
    }
}
