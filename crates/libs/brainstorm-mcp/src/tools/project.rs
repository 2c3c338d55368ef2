//! Project management tool implementations
//!
//! Handles project creation, listing, info retrieval, archiving, deletion,
//! and the caller's status overview.

use brainstorm_core::{
    ctx::Ctx,
    model::{
        ModelManager,
        identity::ClientBmc,
        member::MemberBmc,
        message::MessageBmc,
        project::{ProjectBmc, ProjectForCreate},
    },
    store::longpoll::{self, WaitOutcome},
};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::helpers::{self, json_result, to_mcp};
use super::{
    ArchiveProjectParams, CreateProjectParams, DeleteProjectParams, GetProjectInfoParams,
    ListProjectsParams,
};

pub async fn version_impl() -> Result<CallToolResult, McpError> {
    json_result(&serde_json::json!({
        "name": "brainstorm",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Overview of every project the calling client belongs to.
pub async fn status_impl(ctx: &Ctx, mm: &Arc<ModelManager>) -> Result<CallToolResult, McpError> {
    let memberships = ClientBmc::memberships(mm, ctx.client_id()).map_err(|e| to_mcp(mm, e))?;

    let mut projects = Vec::new();
    for membership in &memberships {
        // Project may have been deleted since the index entry was written
        let Ok(project) = ProjectBmc::get(ctx, mm, &membership.project_id) else {
            continue;
        };
        ProjectBmc::ensure_coordinator(ctx, mm, &membership.project_id)
            .await
            .map_err(|e| to_mcp(mm, e))?;

        let unread = MessageBmc::unread_count(mm, &membership.project_id, &membership.agent_name)
            .map_err(|e| to_mcp(mm, e))?;
        let role = MemberBmc::get(ctx, mm, &membership.project_id, &membership.agent_name)
            .ok()
            .and_then(|m| m.role);

        projects.push(serde_json::json!({
            "project_id": membership.project_id,
            "project_name": membership.project_name,
            "agent_name": membership.agent_name,
            "role": role,
            "unread_messages": unread,
            "archived": project.archived,
        }));
    }

    json_result(&serde_json::json!({
        "client_id": ctx.client_id(),
        "projects": projects,
        "identity_reminder": helpers::identity_reminder(ctx.client_id()),
        "critical_reminder": helpers::critical_reminder(),
    }))
}

/// Create a project; the creator is auto-joined as coordinator.
pub async fn create_project_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    params: CreateProjectParams,
) -> Result<CallToolResult, McpError> {
    let name = params.name.unwrap_or_else(|| params.project_id.clone());
    let project = ProjectBmc::create(
        ctx,
        mm,
        ProjectForCreate {
            project_id: params.project_id,
            name,
            created_by: Some(params.agent_name.clone()),
        },
    )
    .await
    .map_err(|e| to_mcp(mm, e))?;

    json_result(&serde_json::json!({
        "project": project,
        "joined_as": params.agent_name,
        "role": "coordinator",
    }))
}

pub async fn list_projects_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    params: ListProjectsParams,
) -> Result<CallToolResult, McpError> {
    let projects = ProjectBmc::list(
        ctx,
        mm,
        params.offset.unwrap_or(0),
        params.limit.unwrap_or(brainstorm_core::model::project::DEFAULT_PAGE_LIMIT),
        params.include_archived.unwrap_or(false),
    )
    .map_err(|e| to_mcp(mm, e))?;

    json_result(&serde_json::json!({
        "count": projects.len(),
        "projects": projects,
    }))
}

/// Project metadata plus members; optionally blocks until the project
/// exists.
pub async fn get_project_info_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    cancel: CancellationToken,
    params: GetProjectInfoParams,
) -> Result<CallToolResult, McpError> {
    let timeout_seconds = mm.config().effective_wait_timeout(params.timeout_seconds);

    if params.wait.unwrap_or(false) && !ProjectBmc::exists(mm, &params.project_id).map_err(|e| to_mcp(mm, e))? {
        let project_id = params.project_id.clone();
        let poll_mm = Arc::clone(mm);
        let outcome = longpoll::wait_until(
            std::time::Duration::from_secs(timeout_seconds),
            &cancel,
            move || ProjectBmc::exists(&poll_mm, &project_id),
        )
        .await
        .map_err(|e| to_mcp(mm, e))?;
        if outcome != WaitOutcome::Satisfied {
            return helpers::wait_timeout_result("get_project_info", timeout_seconds);
        }
    }

    let project = ProjectBmc::get(ctx, mm, &params.project_id).map_err(|e| to_mcp(mm, e))?;
    ProjectBmc::ensure_coordinator(ctx, mm, &params.project_id)
        .await
        .map_err(|e| to_mcp(mm, e))?;

    let members: Vec<serde_json::Value> = MemberBmc::list(ctx, mm, &params.project_id)
        .map_err(|e| to_mcp(mm, e))?
        .into_iter()
        .map(|m| {
            serde_json::json!({
                "agent_name": m.agent_name,
                "agent_id": m.agent_id,
                "joined_at": m.joined_at,
                "last_seen": m.last_seen,
                "online": m.online,
                "capabilities": m.capabilities,
                "labels": m.labels,
                "role": m.role,
            })
        })
        .collect();

    json_result(&serde_json::json!({
        "project": project,
        "members": members,
    }))
}

/// Creator-only hard delete.
pub async fn delete_project_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    params: DeleteProjectParams,
) -> Result<CallToolResult, McpError> {
    ProjectBmc::delete(ctx, mm, &params.project_id, &params.agent_name)
        .await
        .map_err(|e| to_mcp(mm, e))?;

    json_result(&serde_json::json!({
        "deleted": params.project_id,
    }))
}

/// Creator-only soft archive.
pub async fn archive_project_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    params: ArchiveProjectParams,
) -> Result<CallToolResult, McpError> {
    let project = ProjectBmc::archive(
        ctx,
        mm,
        &params.project_id,
        &params.agent_name,
        params.reason,
    )
    .await
    .map_err(|e| to_mcp(mm, e))?;

    json_result(&serde_json::json!({
        "project": project,
    }))
}
