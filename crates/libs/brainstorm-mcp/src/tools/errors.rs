//! Structured error codes for MCP tool responses.
//!
//! Storage-engine errors bubble up unchanged to this boundary, which maps
//! them onto wire error codes and scrubs absolute data-root paths from the
//! messages before they reach agents.

use brainstorm_core::Error as CoreError;
use rmcp::ErrorData as McpError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidId,
    PathEscape,
    PayloadTooLarge,
    PayloadTooDeep,

    NotFound,
    AlreadyExists,
    Conflict,

    Forbidden,
    NoPermissionsDefined,
    InsufficientRead,
    InsufficientWrite,

    EtagMismatch,
    LockTimeout,

    CoordinatorHandoverRequired,
    HandoffAuthorityError,

    WaitTimeout,
    IoError,
}

impl ErrorCode {
    pub fn to_mcp_error(self, message: &str, context: Option<serde_json::Value>) -> McpError {
        let mut data = context.unwrap_or_else(|| serde_json::json!({}));

        if let Some(obj) = data.as_object_mut() {
            obj.insert(
                "error_code".to_string(),
                serde_json::to_value(self).unwrap_or_default(),
            );
        }

        match self {
            Self::IoError => McpError::internal_error(message.to_string(), Some(data)),
            _ => McpError::invalid_params(message.to_string(), Some(data)),
        }
    }
}

#[macro_export]
macro_rules! mcp_err {
    ($code:expr, $msg:expr) => {
        $code.to_mcp_error($msg, None)
    };
    ($code:expr, $msg:expr, $ctx:tt) => {
        $code.to_mcp_error($msg, Some(serde_json::json!($ctx)))
    };
}

pub use mcp_err;

/// Map a core error onto its wire code.
pub fn code_for(err: &CoreError) -> ErrorCode {
    match err {
        CoreError::InvalidId { .. } => ErrorCode::InvalidId,
        CoreError::PathEscape { .. } => ErrorCode::PathEscape,
        CoreError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
        CoreError::PayloadTooDeep { .. } => ErrorCode::PayloadTooDeep,
        CoreError::ProjectNotFound(_)
        | CoreError::MemberNotFound(_)
        | CoreError::ResourceNotFound(_) => ErrorCode::NotFound,
        CoreError::AlreadyExists(_) => ErrorCode::AlreadyExists,
        CoreError::Conflict(_) => ErrorCode::Conflict,
        CoreError::Forbidden(_) => ErrorCode::Forbidden,
        CoreError::NoPermissionsDefined(_) => ErrorCode::NoPermissionsDefined,
        CoreError::InsufficientRead { .. } => ErrorCode::InsufficientRead,
        CoreError::InsufficientWrite { .. } => ErrorCode::InsufficientWrite,
        CoreError::EtagMismatch { .. } => ErrorCode::EtagMismatch,
        CoreError::LockTimeout { .. } => ErrorCode::LockTimeout,
        CoreError::CoordinatorHandoverRequired { .. } => ErrorCode::CoordinatorHandoverRequired,
        CoreError::HandoffAuthority { .. } => ErrorCode::HandoffAuthorityError,
        CoreError::SerdeJson(_) | CoreError::Io(_) => ErrorCode::IoError,
    }
}

/// Replace any occurrence of the data root in an error message with a
/// logical placeholder. Agents never see absolute storage paths.
pub fn scrub_paths(message: &str, data_root: &Path) -> String {
    let root = data_root.display().to_string();
    if root.is_empty() {
        return message.to_string();
    }
    message.replace(&root, "<data-root>")
}

/// Convert a core error into an MCP error with code, scrubbed message, and
/// structured context where the error carries any.
pub fn core_error(err: &CoreError, data_root: &Path) -> McpError {
    let code = code_for(err);
    let message = scrub_paths(&err.to_string(), data_root);
    let context = match err {
        CoreError::CoordinatorHandoverRequired { candidates } => Some(serde_json::json!({
            "candidates": candidates,
            "suggestion": "Call handover_coordinator before leave_project",
        })),
        CoreError::EtagMismatch { current, .. } => Some(serde_json::json!({
            "current_etag": current,
            "suggestion": "Re-read the resource and retry with its current etag",
        })),
        CoreError::LockTimeout { .. } => Some(serde_json::json!({
            "suggestion": "Another writer holds the lock; retry shortly",
        })),
        _ => None,
    };
    code.to_mcp_error(&message, context)
}
