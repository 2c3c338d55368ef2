//! Messaging tool implementations
//!
//! Handles direct sends, broadcasts, and the read-once inbox.

use brainstorm_core::{
    ctx::Ctx,
    model::{
        ModelManager,
        member::MemberBmc,
        message::{MessageBmc, MessageForSend},
        project::ProjectBmc,
    },
    store::longpoll::{self, WaitOutcome},
};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::helpers::{self, json_result, to_mcp};
use super::{ReceiveMessagesParams, SendMessageParams};

/// Send a direct message or broadcast to all other members.
pub async fn send_message_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    params: SendMessageParams,
) -> Result<CallToolResult, McpError> {
    ProjectBmc::ensure_coordinator(ctx, mm, &params.project_id)
        .await
        .map_err(|e| to_mcp(mm, e))?;

    let receipt = MessageBmc::send(
        ctx,
        mm,
        MessageForSend {
            project_id: params.project_id.clone(),
            from_agent: params.from_agent.clone(),
            to_agent: params.to_agent,
            reply_expected: params.reply_expected,
            message_type: params.message_type,
            payload: params.payload,
        },
    )
    .await
    .map_err(|e| to_mcp(mm, e))?;

    let sender_role = MemberBmc::get(ctx, mm, &params.project_id, &params.from_agent)
        .ok()
        .and_then(|m| m.role);

    let mut response = serde_json::json!({
        "message_id": receipt.message_id,
        "broadcast": receipt.broadcast,
        "recipients": receipt.recipients,
        "role_reminder": helpers::role_reminder(sender_role),
        "conversation_etiquette": helpers::conversation_etiquette(),
    });
    if params.reply_expected {
        response["reply_expected_guidance"] =
            serde_json::Value::String(helpers::reply_expected_guidance());
    }
    json_result(&response)
}

/// Read and archive pending messages; optionally blocks for the first one.
pub async fn receive_messages_impl(
    ctx: &Ctx,
    mm: &Arc<ModelManager>,
    cancel: CancellationToken,
    params: ReceiveMessagesParams,
) -> Result<CallToolResult, McpError> {
    ProjectBmc::ensure_coordinator(ctx, mm, &params.project_id)
        .await
        .map_err(|e| to_mcp(mm, e))?;

    let timeout_seconds = mm.config().effective_wait_timeout(params.timeout_seconds);

    if params.wait.unwrap_or(false)
        && !MessageBmc::has_pending(mm, &params.project_id, &params.agent_name)
            .map_err(|e| to_mcp(mm, e))?
    {
        let project_id = params.project_id.clone();
        let agent_name = params.agent_name.clone();
        let poll_mm = Arc::clone(mm);
        let outcome = longpoll::wait_until(
            std::time::Duration::from_secs(timeout_seconds),
            &cancel,
            move || MessageBmc::has_pending(&poll_mm, &project_id, &agent_name),
        )
        .await
        .map_err(|e| to_mcp(mm, e))?;
        if outcome != WaitOutcome::Satisfied {
            return helpers::wait_timeout_result("receive_messages", timeout_seconds);
        }
    }

    let messages = MessageBmc::receive(ctx, mm, &params.project_id, &params.agent_name)
        .await
        .map_err(|e| to_mcp(mm, e))?;

    // Polling the inbox doubles as a liveness signal
    if let Err(e) = MemberBmc::heartbeat(ctx, mm, &params.project_id, &params.agent_name, true).await
    {
        tracing::warn!(agent = %params.agent_name, error = %e, "Heartbeat update failed");
    }

    let reply_warnings = helpers::reply_warnings(&messages);
    let handoff_alerts = helpers::handoff_alerts(&messages);
    json_result(&serde_json::json!({
        "count": messages.len(),
        "messages": messages,
        "reply_warnings": reply_warnings,
        "handoff_alerts": handoff_alerts,
    }))
}
