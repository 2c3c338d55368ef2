//! Common helper functions for MCP tools
//!
//! Error conversion, response shaping, and the advisory texts (role
//! reminders, etiquette, reply warnings) attached to tool responses.

use brainstorm_core::model::ModelManager;
use brainstorm_core::model::member::Role;
use brainstorm_core::model::message::{
    Message, TYPE_HANDOFF, TYPE_HANDOFF_ACCEPTED, TYPE_HANDOFF_REJECTED,
};
use brainstorm_core::model::resource::ResourceManifest;
use rmcp::{ErrorData as McpError, model::CallToolResult, model::Content};
use std::sync::Arc;

use super::errors;

/// Convert a core error, scrubbing data-root paths from its message.
pub fn to_mcp(mm: &Arc<ModelManager>, err: brainstorm_core::Error) -> McpError {
    errors::core_error(&err, mm.root().root())
}

/// Wrap a JSON value as a successful tool result.
pub fn json_result(value: &serde_json::Value) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Structured "timed out, retry allowed" envelope for expired waits.
pub fn wait_timeout_result(operation: &str, timeout_seconds: u64) -> Result<CallToolResult, McpError> {
    json_result(&serde_json::json!({
        "status": "WAIT_TIMEOUT",
        "operation": operation,
        "timeout_seconds": timeout_seconds,
        "retry_allowed": true,
    }))
}

/// Shape a manifest for agents: `creator_agent` is never echoed, and the
/// absolute `source_path` is storage-internal.
pub fn manifest_json(manifest: &ResourceManifest) -> serde_json::Value {
    serde_json::json!({
        "resource_id": manifest.resource_id,
        "name": manifest.name,
        "created_at": manifest.created_at,
        "updated_at": manifest.updated_at,
        "etag": manifest.etag,
        "permissions": manifest.permissions,
        "mime_type": manifest.mime_type,
        "size_bytes": manifest.size_bytes,
    })
}

// ============================================================================
// Advisory texts
// ============================================================================

pub fn role_reminder(role: Option<Role>) -> String {
    match role {
        Some(Role::Coordinator) => {
            "You are the coordinator: keep work assigned, answer handoff requests \
             with handoff_accepted or handoff_rejected, and hand over before leaving."
                .to_string()
        }
        _ => "You are a contributor: report progress to the coordinator and use a \
              'handoff' message when you need to pass work on."
            .to_string(),
    }
}

pub fn conversation_etiquette() -> String {
    "Keep messages short and actionable. Prefer direct messages over broadcasts; \
     broadcast only what every member needs."
        .to_string()
}

pub fn reply_expected_guidance() -> String {
    "You set reply_expected=true: poll receive_messages (optionally with wait=true) \
     so the reply is not left sitting in your inbox."
        .to_string()
}

pub fn identity_reminder(client_id: &str) -> String {
    format!(
        "Your session identity is '{client_id}'. It is derived from your working \
         directory unless BRAINSTORM_CLIENT_ID is set."
    )
}

pub fn critical_reminder() -> String {
    "Always call join_project with the same absolute working_directory, otherwise \
     you will appear as a different client and cannot reclaim your memberships."
        .to_string()
}

/// Warnings for received messages that still expect an answer.
pub fn reply_warnings(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.reply_expected)
        .map(|m| {
            format!(
                "'{}' expects a reply to message {} - answer or decline explicitly",
                m.from_agent, m.message_id
            )
        })
        .collect()
}

/// Alerts for handoff-flow messages in a received batch.
pub fn handoff_alerts(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m.message_type.as_deref() {
            Some(TYPE_HANDOFF) => Some(format!(
                "'{}' requests a handoff (message {}) - accept or reject it",
                m.from_agent, m.message_id
            )),
            Some(TYPE_HANDOFF_ACCEPTED) => {
                Some(format!("'{}' accepted your handoff request", m.from_agent))
            }
            Some(TYPE_HANDOFF_REJECTED) => {
                Some(format!("'{}' rejected your handoff request", m.from_agent))
            }
            _ => None,
        })
        .collect()
}
