//! Membership tool implementations
//!
//! Handles joining, leaving, and coordinator handover.

use brainstorm_core::model::identity::resolve_client_id;
use brainstorm_core::{
    Ctx,
    model::{
        ModelManager,
        member::{MemberBmc, MemberForJoin},
        project::ProjectBmc,
    },
};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use std::sync::Arc;

use super::helpers::{self, json_result, to_mcp};
use super::{HandoverCoordinatorParams, JoinProjectParams, LeaveProjectParams};

/// Join a project, claiming (or reclaiming) an agent-name slot.
///
/// The session identity for the join is derived from the supplied
/// `working_directory`, with `BRAINSTORM_CLIENT_ID` still taking priority,
/// so the same checkout always maps to the same client.
pub async fn join_project_impl(
    mm: &Arc<ModelManager>,
    params: JoinProjectParams,
) -> Result<CallToolResult, McpError> {
    let env_id = std::env::var(brainstorm_core::model::identity::CLIENT_ID_ENV).ok();
    let client_id = resolve_client_id(env_id.as_deref(), &params.working_directory)
        .map_err(|e| to_mcp(mm, e))?;
    let ctx = Ctx::new(client_id);

    ProjectBmc::ensure_coordinator(&ctx, mm, &params.project_id)
        .await
        .map_err(|e| to_mcp(mm, e))?;

    let member = MemberBmc::join(
        &ctx,
        mm,
        MemberForJoin {
            project_id: params.project_id.clone(),
            agent_name: params.agent_name.clone(),
            capabilities: params.capabilities.unwrap_or_default(),
            labels: params.labels.unwrap_or_default(),
        },
    )
    .await
    .map_err(|e| to_mcp(mm, e))?;

    json_result(&serde_json::json!({
        "project_id": params.project_id,
        "agent_name": member.agent_name,
        "agent_id": member.agent_id,
        "role": member.role,
        "client_id": ctx.client_id(),
        "role_reminder": helpers::role_reminder(member.role),
        "critical_reminder": helpers::critical_reminder(),
    }))
}

/// Leave a project. Coordinators must hand over first.
pub async fn leave_project_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    params: LeaveProjectParams,
) -> Result<CallToolResult, McpError> {
    MemberBmc::leave(ctx, mm, &params.project_id, &params.agent_name)
        .await
        .map_err(|e| to_mcp(mm, e))?;

    json_result(&serde_json::json!({
        "left": params.agent_name,
        "project_id": params.project_id,
    }))
}

/// Atomic coordinator role transfer.
pub async fn handover_coordinator_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    params: HandoverCoordinatorParams,
) -> Result<CallToolResult, McpError> {
    let new_coordinator = MemberBmc::handover(
        ctx,
        mm,
        &params.project_id,
        &params.from_agent,
        &params.to_agent,
    )
    .await
    .map_err(|e| to_mcp(mm, e))?;

    json_result(&serde_json::json!({
        "project_id": params.project_id,
        "coordinator": new_coordinator.agent_name,
        "previous": params.from_agent,
        "role_reminder": helpers::role_reminder(new_coordinator.role),
    }))
}
