//! Brainstorm - stdio MCP server for multi-agent collaboration
//!
//! This binary exposes the Brainstorm storage and coordination engine as
//! MCP tools over stdio. Agents organize into projects, exchange direct and
//! broadcast messages, and share versioned resources persisted on the local
//! filesystem.

use anyhow::Result;
use brainstorm_common::config::AppConfig;
use brainstorm_common::tracing::setup_tracing;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "brainstorm")]
#[command(about = "Brainstorm - multi-agent collaboration server over MCP")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server over stdio (default)
    Serve,
    /// Export JSON schemas for all tools
    Schema {
        /// Output format: json or markdown
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List all available tools
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_stdio_server().await,
        Commands::Schema { format, output } => export_schema(&format, output.as_deref()),
        Commands::Tools => list_tools(),
    }
}

async fn run_stdio_server() -> Result<()> {
    // Logging goes to stderr: stdout is reserved for MCP
    setup_tracing(false);

    let config = AppConfig::load()?;
    brainstorm_mcp::run_stdio(config).await
}

fn export_schema(format: &str, output: Option<&str>) -> Result<()> {
    let schemas = brainstorm_mcp::get_tool_schemas();

    let content = match format {
        "markdown" | "md" => generate_markdown_docs(&schemas),
        _ => serde_json::to_string_pretty(&schemas)?,
    };

    if let Some(path) = output {
        std::fs::write(path, &content)?;
        eprintln!("Schema written to {}", path);
    } else {
        println!("{}", content);
    }

    Ok(())
}

fn list_tools() -> Result<()> {
    let schemas = brainstorm_mcp::get_tool_schemas();

    println!("Brainstorm Tools ({} total)\n", schemas.len());
    println!("{:<25} {}", "TOOL", "DESCRIPTION");
    println!("{}", "-".repeat(80));

    for schema in &schemas {
        println!("{:<25} {}", schema.name, schema.description);
    }

    Ok(())
}

fn generate_markdown_docs(schemas: &[brainstorm_mcp::tools::ToolSchema]) -> String {
    let mut md = String::from("# Brainstorm - Tool Reference\n\n");
    md.push_str(&format!("Total tools: {}\n\n", schemas.len()));

    for schema in schemas {
        md.push_str(&format!("## {}\n\n", schema.name));
        md.push_str(&format!("{}\n\n", schema.description));

        if !schema.parameters.is_empty() {
            md.push_str("| Name | Type | Required | Description |\n");
            md.push_str("|------|------|----------|-------------|\n");
            for param in &schema.parameters {
                md.push_str(&format!(
                    "| `{}` | {} | {} | {} |\n",
                    param.name,
                    param.param_type,
                    if param.required { "Yes" } else { "No" },
                    param.description
                ));
            }
            md.push('\n');
        }
    }

    md
}
