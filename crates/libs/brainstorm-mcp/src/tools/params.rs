//! Tool Parameter Types
//!
//! This module contains all parameter types for MCP tools. Unknown fields
//! are rejected at the boundary: every struct is `deny_unknown_fields`.

use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::BTreeMap;

// ============================================================================
// Tool Parameter Types
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectParams {
    /// Project identifier (safe-id: alphanumeric, `_`, `-`)
    pub project_id: String,
    /// Human-readable project name (defaults to the project id)
    pub name: Option<String>,
    /// Creator's agent name; auto-joined as coordinator
    pub agent_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListProjectsParams {
    /// Number of projects to skip
    pub offset: Option<usize>,
    /// Page size (default 100, max 1000)
    pub limit: Option<usize>,
    /// Include archived projects (default false)
    pub include_archived: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetProjectInfoParams {
    /// Project identifier
    pub project_id: String,
    /// Block until the project exists (default false)
    pub wait: Option<bool>,
    /// Wait deadline in seconds (default 300, max 3600)
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DeleteProjectParams {
    /// Project identifier
    pub project_id: String,
    /// Caller's agent name; must be the project creator
    pub agent_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ArchiveProjectParams {
    /// Project identifier
    pub project_id: String,
    /// Caller's agent name; must be the project creator
    pub agent_name: String,
    /// Why the project is being archived
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct JoinProjectParams {
    /// Project identifier
    pub project_id: String,
    /// Agent name to claim within the project
    pub agent_name: String,
    /// Absolute working directory of the agent session; the session
    /// identity is derived from it
    pub working_directory: String,
    /// Capabilities advertised to other members
    pub capabilities: Option<Vec<String>>,
    /// Free-form labels
    pub labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LeaveProjectParams {
    /// Project identifier
    pub project_id: String,
    /// Agent name leaving the project
    pub agent_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct HandoverCoordinatorParams {
    /// Project identifier
    pub project_id: String,
    /// Current coordinator
    pub from_agent: String,
    /// Member receiving the coordinator role
    pub to_agent: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PermissionsParam {
    /// Agent names allowed to read; `"*"` means any project member
    pub read: Vec<String>,
    /// Agent names allowed to write; `"*"` means any project member
    pub write: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StoreResourceParams {
    /// Project identifier
    pub project_id: String,
    /// Resource identifier
    pub resource_id: String,
    /// Caller's agent name (the writer)
    pub agent_name: String,
    /// Display name (defaults to the resource id)
    pub name: Option<String>,
    /// Inline content (max 50 KB); mutually exclusive with `source_path`
    pub content: Option<String>,
    /// Path to a file under your home directory (max 500 KB); mutually
    /// exclusive with `content`
    pub source_path: Option<String>,
    /// Current ETag; required when updating an existing resource
    pub etag: Option<String>,
    /// Access control lists; only the creator may change them
    pub permissions: Option<PermissionsParam>,
    /// MIME type hint
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetResourceParams {
    /// Project identifier
    pub project_id: String,
    /// Resource identifier
    pub resource_id: String,
    /// Caller's agent name
    pub agent_name: String,
    /// Block until the resource exists (default false)
    pub wait: Option<bool>,
    /// Wait deadline in seconds (default 300, max 3600)
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ListResourcesParams {
    /// Project identifier
    pub project_id: String,
    /// Caller's agent name
    pub agent_name: String,
    /// Number of manifests to skip
    pub offset: Option<usize>,
    /// Page size (default 100, max 1000)
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SendMessageParams {
    /// Project identifier
    pub project_id: String,
    /// Sender's agent name
    pub from_agent: String,
    /// Recipient agent name; omit to broadcast to all other members
    pub to_agent: Option<String>,
    /// Whether the sender expects a reply. Mandatory: recipients are warned
    /// about unanswered messages
    pub reply_expected: bool,
    /// Message type; `handoff` family types are role-checked
    pub message_type: Option<String>,
    /// Message payload: any JSON value, nesting depth <= 100
    pub payload: serde_json::Value,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReceiveMessagesParams {
    /// Project identifier
    pub project_id: String,
    /// Agent whose inbox is read; messages are archived on read
    pub agent_name: String,
    /// Block until a message arrives (default false)
    pub wait: Option<bool>,
    /// Wait deadline in seconds (default 300, max 3600)
    pub timeout_seconds: Option<u64>,
}
