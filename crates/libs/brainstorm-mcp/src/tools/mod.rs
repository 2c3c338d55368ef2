//! MCP Tool implementations for Brainstorm
//!
//! This module defines all MCP tools that wrap the brainstorm-core
//! storage and coordination engine.

use brainstorm_common::config::AppConfig;
use brainstorm_core::model::identity::{CLIENT_ID_ENV, resolve_client_id};
use brainstorm_core::{Ctx, ModelManager, Result};
use rmcp::{
    ErrorData as McpError,
    handler::server::{ServerHandler, tool::ToolRouter, wrapper::Parameters},
    model::{CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam},
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod errors;
pub mod helpers;
pub mod membership;
pub mod messaging;
mod params;
pub mod project;
pub mod resources;

pub use params::*;

// ============================================================================
// Schema Export Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterSchema {
    pub name: String,
    pub param_type: String,
    pub required: bool,
    pub description: String,
}

fn param(name: &str, param_type: &str, required: bool, description: &str) -> ParameterSchema {
    ParameterSchema {
        name: name.into(),
        param_type: param_type.into(),
        required,
        description: description.into(),
    }
}

/// Get schema information for all tools
pub fn get_tool_schemas() -> Vec<ToolSchema> {
    vec![
        ToolSchema {
            name: "version".into(),
            description: "Return the server version.".into(),
            parameters: vec![],
        },
        ToolSchema {
            name: "status".into(),
            description: "List the caller's projects with unread counts and roles.".into(),
            parameters: vec![],
        },
        ToolSchema {
            name: "create_project".into(),
            description: "Create a project; the creator joins as coordinator.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("name", "string", false, "Human-readable project name"),
                param("agent_name", "string", true, "Creator's agent name"),
            ],
        },
        ToolSchema {
            name: "list_projects".into(),
            description: "Paginated project list.".into(),
            parameters: vec![
                param("offset", "integer", false, "Projects to skip"),
                param("limit", "integer", false, "Page size (max 1000)"),
                param("include_archived", "boolean", false, "Include archived projects"),
            ],
        },
        ToolSchema {
            name: "get_project_info".into(),
            description: "Project metadata and members; can wait for the project to appear.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("wait", "boolean", false, "Block until the project exists"),
                param("timeout_seconds", "integer", false, "Wait deadline in seconds"),
            ],
        },
        ToolSchema {
            name: "delete_project".into(),
            description: "Delete a project tree. Creator only.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("agent_name", "string", true, "Caller's agent name"),
            ],
        },
        ToolSchema {
            name: "archive_project".into(),
            description: "Soft-archive a project. Creator only.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("agent_name", "string", true, "Caller's agent name"),
                param("reason", "string", false, "Archive reason"),
            ],
        },
        ToolSchema {
            name: "join_project".into(),
            description: "Join a project, reclaiming legacy slots by session identity.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("agent_name", "string", true, "Agent name to claim"),
                param("working_directory", "string", true, "Absolute session working directory"),
                param("capabilities", "array", false, "Advertised capabilities"),
                param("labels", "object", false, "Free-form labels"),
            ],
        },
        ToolSchema {
            name: "leave_project".into(),
            description: "Leave a project. Coordinators must hand over first.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("agent_name", "string", true, "Agent name leaving"),
            ],
        },
        ToolSchema {
            name: "handover_coordinator".into(),
            description: "Atomically transfer the coordinator role.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("from_agent", "string", true, "Current coordinator"),
                param("to_agent", "string", true, "New coordinator"),
            ],
        },
        ToolSchema {
            name: "store_resource".into(),
            description: "Create or update a shared resource (inline content or file reference)."
                .into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("resource_id", "string", true, "Resource identifier"),
                param("agent_name", "string", true, "Caller's agent name"),
                param("name", "string", false, "Display name"),
                param("content", "string", false, "Inline content (max 50 KB)"),
                param("source_path", "string", false, "File under your home (max 500 KB)"),
                param("etag", "string", false, "Current ETag; required on update"),
                param("permissions", "object", false, "read/write ACLs; creator only"),
                param("mime_type", "string", false, "MIME type hint"),
            ],
        },
        ToolSchema {
            name: "get_resource".into(),
            description: "ACL-checked resource read; can wait for the resource to appear.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("resource_id", "string", true, "Resource identifier"),
                param("agent_name", "string", true, "Caller's agent name"),
                param("wait", "boolean", false, "Block until the resource exists"),
                param("timeout_seconds", "integer", false, "Wait deadline in seconds"),
            ],
        },
        ToolSchema {
            name: "list_resources".into(),
            description: "Readable resource manifests; payloads are not loaded.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("agent_name", "string", true, "Caller's agent name"),
                param("offset", "integer", false, "Manifests to skip"),
                param("limit", "integer", false, "Page size (max 1000)"),
            ],
        },
        ToolSchema {
            name: "send_message".into(),
            description: "Send a direct message or broadcast to all other members.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("from_agent", "string", true, "Sender's agent name"),
                param("to_agent", "string", false, "Recipient; omit to broadcast"),
                param("reply_expected", "boolean", true, "Whether a reply is expected"),
                param("message_type", "string", false, "Message type (handoff family is role-checked)"),
                param("payload", "object", true, "JSON payload, depth <= 100"),
            ],
        },
        ToolSchema {
            name: "receive_messages".into(),
            description: "Read and archive pending messages; can wait for the first one.".into(),
            parameters: vec![
                param("project_id", "string", true, "Project identifier"),
                param("agent_name", "string", true, "Inbox owner"),
                param("wait", "boolean", false, "Block until a message arrives"),
                param("timeout_seconds", "integer", false, "Wait deadline in seconds"),
            ],
        },
    ]
}

/// The main MCP service for Brainstorm
#[derive(Clone)]
pub struct BrainstormService {
    mm: Arc<ModelManager>,
    tool_router: ToolRouter<Self>,
    /// Session identity resolved once at startup from the environment and
    /// process working directory; join_project derives its own per call.
    client_id: String,
    /// Parent token for wait paths; cancelled on shutdown.
    cancel: CancellationToken,
}

impl BrainstormService {
    /// Create a new BrainstormService with configuration from env/files.
    pub fn new() -> Result<Self> {
        let config = AppConfig::load().unwrap_or_default();
        Self::new_with_config(config)
    }

    /// Create a new BrainstormService with an explicit configuration.
    pub fn new_with_config(config: AppConfig) -> Result<Self> {
        let mm = Arc::new(ModelManager::new(Arc::new(config))?);
        let working_dir = std::env::current_dir()?.to_string_lossy().to_string();
        let env_id = std::env::var(CLIENT_ID_ENV).ok();
        let client_id = resolve_client_id(env_id.as_deref(), &working_dir)?;

        tracing::info!(%client_id, "MCP service starting");

        Ok(Self {
            mm,
            tool_router: Self::tool_router(),
            client_id,
            cancel: CancellationToken::new(),
        })
    }

    /// Create a new service with an existing ModelManager (for testing).
    pub fn new_with_mm(mm: Arc<ModelManager>, client_id: impl Into<String>) -> Self {
        Self {
            mm,
            tool_router: Self::tool_router(),
            client_id: client_id.into(),
            cancel: CancellationToken::new(),
        }
    }

    fn ctx(&self) -> Ctx {
        Ctx::new(self.client_id.clone())
    }

    fn wait_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }
}

#[allow(clippy::manual_async_fn)]
impl ServerHandler for BrainstormService {
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<ListToolsResult, McpError>> + Send + '_
    {
        async move {
            Ok(ListToolsResult {
                tools: self.tool_router.list_all(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = std::result::Result<CallToolResult, McpError>> + Send + '_
    {
        async move {
            let tool_name = request.name.clone();
            let start = std::time::Instant::now();

            let tool_context =
                rmcp::handler::server::tool::ToolCallContext::new(self, request, context);
            let result = self.tool_router.call(tool_context).await;

            tracing::debug!(
                tool = %tool_name,
                duration_ms = start.elapsed().as_millis() as u64,
                ok = result.is_ok(),
                "Tool call finished"
            );
            result
        }
    }
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl BrainstormService {
    #[tool(description = "Return the Brainstorm server version.")]
    async fn version(&self) -> std::result::Result<CallToolResult, McpError> {
        project::version_impl().await
    }

    #[tool(
        description = "List all projects for this session: unread message counts, your role in each, and identity reminders."
    )]
    async fn status(&self) -> std::result::Result<CallToolResult, McpError> {
        project::status_impl(&self.ctx(), &self.mm).await
    }

    #[tool(
        description = "Create a project. Projects are shared workspaces with members, resources, and message inboxes; the creator is auto-joined as coordinator."
    )]
    async fn create_project(
        &self,
        params: Parameters<CreateProjectParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        project::create_project_impl(&self.ctx(), &self.mm, params.0).await
    }

    #[tool(description = "List projects, paginated and lexicographic by project id.")]
    async fn list_projects(
        &self,
        params: Parameters<ListProjectsParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        project::list_projects_impl(&self.ctx(), &self.mm, params.0).await
    }

    #[tool(
        description = "Get project metadata and members. With wait=true, blocks until the project exists or the timeout elapses."
    )]
    async fn get_project_info(
        &self,
        params: Parameters<GetProjectInfoParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        project::get_project_info_impl(&self.ctx(), &self.mm, self.wait_token(), params.0).await
    }

    #[tool(description = "Delete a project and everything in it. Only the creator may do this.")]
    async fn delete_project(
        &self,
        params: Parameters<DeleteProjectParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        project::delete_project_impl(&self.ctx(), &self.mm, params.0).await
    }

    #[tool(
        description = "Archive a project: it keeps its contents but drops out of default listings. Only the creator may do this."
    )]
    async fn archive_project(
        &self,
        params: Parameters<ArchiveProjectParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        project::archive_project_impl(&self.ctx(), &self.mm, params.0).await
    }

    #[tool(
        description = "Join a project under an agent name. Pass your absolute working_directory: it determines your session identity and lets you reclaim your slots."
    )]
    async fn join_project(
        &self,
        params: Parameters<JoinProjectParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        membership::join_project_impl(&self.mm, params.0).await
    }

    #[tool(
        description = "Leave a project. A coordinator must call handover_coordinator first."
    )]
    async fn leave_project(
        &self,
        params: Parameters<LeaveProjectParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        membership::leave_project_impl(&self.ctx(), &self.mm, params.0).await
    }

    #[tool(
        description = "Transfer the coordinator role to another member. Only the current coordinator may call this."
    )]
    async fn handover_coordinator(
        &self,
        params: Parameters<HandoverCoordinatorParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        membership::handover_coordinator_impl(&self.ctx(), &self.mm, params.0).await
    }

    #[tool(
        description = "Create or update a shared resource. Pass inline content (max 50 KB) or a source_path under your home (max 500 KB), and the current etag when updating."
    )]
    async fn store_resource(
        &self,
        params: Parameters<StoreResourceParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        resources::store_resource_impl(&self.ctx(), &self.mm, params.0).await
    }

    #[tool(
        description = "Read a resource if its ACL allows you. With wait=true, blocks until the resource exists."
    )]
    async fn get_resource(
        &self,
        params: Parameters<GetResourceParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        resources::get_resource_impl(&self.ctx(), &self.mm, self.wait_token(), params.0).await
    }

    #[tool(description = "List resource manifests you may read; payloads are not loaded.")]
    async fn list_resources(
        &self,
        params: Parameters<ListResourcesParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        resources::list_resources_impl(&self.ctx(), &self.mm, params.0).await
    }

    #[tool(
        description = "Send a message to one member, or broadcast by omitting to_agent. reply_expected is mandatory and drives reply warnings on the receiving side."
    )]
    async fn send_message(
        &self,
        params: Parameters<SendMessageParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        messaging::send_message_impl(&self.ctx(), &self.mm, params.0).await
    }

    #[tool(
        description = "Read your inbox. Returned messages are archived and will not be returned again. With wait=true, blocks until a message arrives."
    )]
    async fn receive_messages(
        &self,
        params: Parameters<ReceiveMessagesParams>,
    ) -> std::result::Result<CallToolResult, McpError> {
        messaging::receive_messages_impl(&self.ctx(), &self.mm, self.wait_token(), params.0).await
    }
}
