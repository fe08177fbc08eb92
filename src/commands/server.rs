use super::Context;
use crate::mcp::CompkitServer;
use anyhow::Result;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use std::process::ExitCode;

/// Run the MCP server on stdio until the client disconnects
pub async fn serve(ctx: Context) -> Result<ExitCode> {
    tracing::info!("Starting compkit MCP server");

    let tools = crate::mcp::tools::list_tools()?;
    tracing::info!("Registered {} tools", tools.tools.len());
    eprintln!(
        "Serving {} components from registry '{}' v{} ({} tools, stdio)",
        ctx.registry.components.len(),
        ctx.registry.name,
        ctx.registry.version,
        tools.tools.len()
    );

    let server = CompkitServer::new(ctx);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;

    Ok(ExitCode::SUCCESS)
}
