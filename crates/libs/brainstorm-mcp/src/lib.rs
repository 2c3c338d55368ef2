use anyhow::Result;
use brainstorm_common::config::AppConfig;
use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};

pub mod tools;
pub use tools::BrainstormService;

/// Run the MCP server over stdio.
///
/// Tracing must already be initialized to stderr by the caller: stdout is
/// reserved for the MCP protocol stream.
pub async fn run_stdio(config: AppConfig) -> Result<()> {
    tracing::info!("Starting Brainstorm server (stdio mode)...");

    let service = BrainstormService::new_with_config(config)?;

    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;

    tracing::info!("MCP server initialized, waiting for requests...");

    let quit_reason = server.waiting().await?;
    tracing::info!("Server shutting down: {:?}", quit_reason);

    Ok(())
}

/// Get schema information for all tools.
pub fn get_tool_schemas() -> Vec<tools::ToolSchema> {
    tools::get_tool_schemas()
}
