//! MCP server implementation
//!
//! The server holds the command [`Context`] (registry loaded once at start-up)
//! and delegates every tool call to [`crate::mcp::tools`].

use crate::commands::Context;
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;
use rmcp::model::*;
use rmcp::service::{RequestContext, RoleServer};
use std::sync::Arc;

#[derive(Clone)]
pub struct CompkitServer {
    ctx: Arc<Context>,
}

impl CompkitServer {
    pub fn new(ctx: Context) -> Self {
        Self { ctx: Arc::new(ctx) }
    }
}

impl ServerHandler for CompkitServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::V_2025_03_26,
            server_info: Implementation {
                name: "compkit-mcp-server".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("compkit MCP Server".into()),
                icons: None,
                website_url: self.ctx.registry.meta.homepage.clone(),
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!(
                "MCP server for the '{}' component registry (v{}). \
                 Components are copied into the project as source, not installed as packages. \
                 Use list_components and get_component to explore, get_install_command or \
                 copy_component to add them, and the generate_* tools for collection-specific code.",
                self.ctx.registry.name, self.ctx.registry.version
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let result = crate::mcp::tools::list_tools()?;
        tracing::info!("ListTools returning {} tools", result.tools.len());
        Ok(result)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("CallTool {}", request.name);
        let arguments = request.arguments.unwrap_or_default();
        crate::mcp::tools::call_tool(&self.ctx, &request.name, arguments)
    }
}
