//! Error types for brainstorm-core operations.
//!
//! This module defines the error types used throughout the brainstorm-core
//! crate. Errors are categorized into:
//!
//! - **External errors**: Wrapped errors from dependencies (serde_json, io)
//! - **Validation errors**: Identifier, path, and payload rejections
//! - **Lookup errors**: Entity-specific not-found / already-exists failures
//! - **Authorization errors**: Permission and role-rule violations
//! - **Concurrency errors**: ETag conflicts and lock timeouts
//!
//! A timed-out long-poll is *not* an error: waiters report it through their
//! return value so the tool surface can answer with a structured
//! "timed out, retry allowed" envelope.

use strum_macros::AsRefStr;
use thiserror::Error;

/// The error type for brainstorm-core operations.
///
/// This enum represents all possible errors that can occur in the
/// brainstorm-core crate. It implements [`std::error::Error`] via `thiserror`
/// and provides `From` implementations for automatic conversion from
/// underlying error types.
#[derive(Debug, Error, AsRefStr)]
pub enum Error {
    // -- External errors from dependencies
    /// JSON serialization/deserialization error.
    ///
    /// Automatically converted from [`serde_json::Error`] via `From`.
    #[error("Serde JSON Error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Standard I/O error.
    ///
    /// Automatically converted from [`std::io::Error`] via `From`.
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    // -- Input validation
    /// An externally supplied identifier failed the safe-id rules.
    ///
    /// Identifiers become path components, so anything containing `.`,
    /// `..`, `/`, `\`, a leading `-`, or out-of-range length is rejected
    /// before it reaches the filesystem.
    #[error("Invalid {field}: {provided:?}")]
    InvalidId { field: &'static str, provided: String },

    /// A file-reference path resolved outside the user's home directory.
    #[error("Path escapes the allowed root: {provided}")]
    PathEscape { provided: String },

    /// A payload exceeded its configured byte limit.
    #[error("Payload too large: {actual} bytes (limit {limit})")]
    PayloadTooLarge { actual: usize, limit: usize },

    /// A JSON payload nests deeper than the configured maximum.
    #[error("Payload nesting exceeds {max_depth} levels")]
    PayloadTooDeep { max_depth: usize },

    // -- Lookup / existence
    /// Project lookup failed.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Member lookup failed within a project.
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Resource lookup failed within a project.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Exclusive creation hit an existing entity.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A slot is occupied by a different owner.
    #[error("Conflict: {0}")]
    Conflict(String),

    // -- Authorization
    /// The actor may not perform this operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The resource manifest carries no `permissions` object.
    ///
    /// Absent permissions always deny; they are never treated as an empty
    /// allow list.
    #[error("No permissions defined on resource: {0}")]
    NoPermissionsDefined(String),

    /// The actor is not in the resource's read ACL.
    #[error("Read access denied for '{agent}' on resource '{resource}'")]
    InsufficientRead { agent: String, resource: String },

    /// The actor is not in the resource's write ACL.
    #[error("Write access denied for '{agent}' on resource '{resource}'")]
    InsufficientWrite { agent: String, resource: String },

    // -- Concurrency
    /// Optimistic concurrency failure: the caller's ETag is stale.
    #[error("ETag mismatch on resource '{resource}': current {current}, provided {provided}")]
    EtagMismatch {
        resource: String,
        current: String,
        provided: String,
    },

    /// Lock acquisition exceeded its timeout.
    #[error("Lock timeout on {path}, held by PID {owner_pid}")]
    LockTimeout { path: String, owner_pid: u32 },

    // -- Role rules
    /// A coordinator tried to leave without handing over first.
    ///
    /// `candidates` lists the remaining members eligible to receive the role.
    #[error("Coordinator must hand over before leaving; candidates: {candidates:?}")]
    CoordinatorHandoverRequired { candidates: Vec<String> },

    /// A handoff-typed message was sent by the wrong role.
    #[error("Message type '{message_type}' not allowed for role '{role}'")]
    HandoffAuthority { role: String, message_type: String },
}

/// A specialized [`Result`] type for brainstorm-core operations.
pub type Result<T> = core::result::Result<T, Error>;
