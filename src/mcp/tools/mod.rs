//! MCP tool definitions and handlers
//!
//! Tools are grouped by concern:
//! - `registry` - read-only queries over the registry and resolver
//! - `install` - copying components into a project
//! - `generate` - code generated from templates for a collection

pub mod generate;
pub mod install;
pub mod registry;


use crate::commands::Context;
use crate::registry::ResolveError;
use rmcp::ErrorData as McpError;
use rmcp::model::*;
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub use generate::{CollectionFieldsArgs, FieldSpec, FieldType, RbacPatternArgs, UsageExampleArgs};
pub use install::{CopyComponentArgs, CopyOwnInfoArgs};
pub use registry::{
    GetComponentArgs, InstallCommandArgs, ListComponentsArgs, ListPackagesArgs,
};

fn tool<T: JsonSchema>(name: &str, description: &str) -> Result<Tool, McpError> {
    let schema = schema_for!(T);
    let json_value = serde_json::to_value(schema).map_err(|e| {
        McpError::internal_error(format!("Failed to serialize schema: {}", e), None)
    })?;
    let object = json_value
        .as_object()
        .ok_or_else(|| McpError::internal_error("Schema is not a JSON object", None))?
        .clone();

    Ok(Tool {
        name: name.to_string().into(),
        title: None,
        description: Some(description.to_string().into()),
        input_schema: Arc::new(object),
        output_schema: None,
        annotations: None,
        icons: None,
    })
}

/// List all available tools
pub fn list_tools() -> Result<ListToolsResult, McpError> {
    Ok(ListToolsResult {
        tools: vec![
            tool::<ListComponentsArgs>(
                "list_components",
                "List registry components, optionally filtered by category",
            )?,
            tool::<GetComponentArgs>(
                "get_component",
                "Show a component's files, dependencies and full install closure",
            )?,
            tool::<ListPackagesArgs>(
                "list_packages",
                "List the npm packages needed by the given components (or by the whole registry)",
            )?,
            tool::<InstallCommandArgs>(
                "get_install_command",
                "Commands that copy the given components and install their packages",
            )?,
            tool::<CopyOwnInfoArgs>(
                "get_copy_own_info",
                "Explain how copied components, aliases and the project manifest work",
            )?,
            tool::<CopyComponentArgs>(
                "copy_component",
                "Copy components and their dependencies into the project, rewriting imports",
            )?,
            tool::<CollectionFieldsArgs>(
                "generate_form",
                "Generate a form component for a collection from its fields",
            )?,
            tool::<CollectionFieldsArgs>(
                "generate_interface",
                "Generate a TypeScript interface for a collection from its fields",
            )?,
            tool::<UsageExampleArgs>(
                "get_usage_example",
                "Show a minimal usage example for a component",
            )?,
            tool::<RbacPatternArgs>(
                "get_rbac_pattern",
                "Generate a permission-check hook for an action on a collection",
            )?,
        ],
        next_cursor: None,
    })
}

fn parse<T: DeserializeOwned>(args: serde_json::Value) -> Result<T, McpError> {
    serde_json::from_value(args)
        .map_err(|e| McpError::invalid_params(format!("Invalid arguments: {}", e), None))
}

/// Call a tool by name with given arguments
pub fn call_tool(
    ctx: &Context,
    tool_name: &str,
    arguments: serde_json::Map<String, serde_json::Value>,
) -> Result<CallToolResult, McpError> {
    let args = serde_json::Value::Object(arguments);

    match tool_name {
        "list_components" => registry::list_components(ctx, parse(args)?),
        "get_component" => registry::get_component(ctx, parse(args)?),
        "list_packages" => registry::list_packages(ctx, parse(args)?),
        "get_install_command" => registry::get_install_command(ctx, parse(args)?),
        "get_copy_own_info" => install::get_copy_own_info(ctx, parse(args)?),
        "copy_component" => install::copy_component(ctx, parse(args)?),
        "generate_form" => generate::generate_form(ctx, parse(args)?),
        "generate_interface" => generate::generate_interface(ctx, parse(args)?),
        "get_usage_example" => generate::get_usage_example(ctx, parse(args)?),
        "get_rbac_pattern" => generate::get_rbac_pattern(ctx, parse(args)?),
        _ => Err(McpError::method_not_found::<CallToolRequestMethod>()),
    }
}

/// Unknown names are the caller's mistake; anything else is a registry defect
pub(crate) fn resolve_error(err: ResolveError) -> McpError {
    match &err {
        ResolveError::ComponentNotFound { name, suggestion } => McpError::invalid_params(
            err.to_string(),
            Some(serde_json::json!({
                "name": name,
                "suggestion": suggestion,
            })),
        ),
        _ => McpError::internal_error(err.to_string(), None),
    }
}

pub(crate) fn text(output: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(output.into())])
}
