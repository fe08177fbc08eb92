//! Read-only registry queries

use super::{resolve_error, text};
use crate::commands::Context;
use crate::registry::Resolver;
use crate::types::{Category, PackageManager};
use rmcp::ErrorData as McpError;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListComponentsArgs {
    /// Only list components in this category
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetComponentArgs {
    /// Component name, e.g. "select-m2o"
    pub name: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListPackagesArgs {
    /// Components to collect packages for; the whole registry when omitted
    #[serde(default)]
    pub components: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallCommandArgs {
    /// Components to install
    pub components: Vec<String>,
    /// Package manager for the dependency install line (defaults to the project's)
    #[serde(default)]
    pub package_manager: Option<PackageManager>,
}

#[derive(Serialize)]
struct ComponentSummary<'a> {
    name: &'a str,
    title: &'a str,
    category: Category,
    description: &'a str,
}

pub(super) fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("Failed to serialize result: {}", e), None)
    })
}

pub fn list_components(
    ctx: &Context,
    args: ListComponentsArgs,
) -> Result<CallToolResult, McpError> {
    let components: Vec<ComponentSummary> = ctx
        .registry
        .components
        .iter()
        .filter(|c| args.category.is_none_or(|wanted| c.category == wanted))
        .map(|c| ComponentSummary {
            name: &c.name,
            title: &c.title,
            category: c.category,
            description: &c.description,
        })
        .collect();

    Ok(text(to_json(&components)?))
}

pub fn get_component(ctx: &Context, args: GetComponentArgs) -> Result<CallToolResult, McpError> {
    let entry = ctx
        .registry
        .find_component(&args.name)
        .map_err(resolve_error)?;
    let resolved = Resolver::new(&ctx.registry)
        .resolve(&[&args.name])
        .map_err(resolve_error)?;

    let mut value = serde_json::to_value(entry).map_err(|e| {
        McpError::internal_error(format!("Failed to serialize component: {}", e), None)
    })?;
    if let Some(object) = value.as_object_mut() {
        object.insert(
            "resolved".to_string(),
            serde_json::json!({
                "components": resolved.components,
                "lib": resolved.lib,
                "packages": resolved.packages,
            }),
        );
    }

    Ok(text(to_json(&value)?))
}

pub fn list_packages(ctx: &Context, args: ListPackagesArgs) -> Result<CallToolResult, McpError> {
    let packages = match args.components {
        Some(names) => {
            Resolver::new(&ctx.registry)
                .resolve(&names)
                .map_err(resolve_error)?
                .packages
        }
        None => ctx.registry.all_packages(),
    };

    Ok(text(to_json(&packages)?))
}

pub fn get_install_command(
    ctx: &Context,
    args: InstallCommandArgs,
) -> Result<CallToolResult, McpError> {
    if args.components.is_empty() {
        return Err(McpError::invalid_params(
            "At least one component is required",
            None,
        ));
    }

    let resolved = Resolver::new(&ctx.registry)
        .resolve(&args.components)
        .map_err(resolve_error)?;
    let manager = args
        .package_manager
        .unwrap_or_else(|| ctx.package_manager());

    let mut requested = args.components.clone();
    requested.sort();
    requested.dedup();

    let mut lines = vec![format!(
        "{} {} add {}",
        manager.runner(),
        crate::BIN_NAME,
        requested.join(" ")
    )];
    if let Some(install) = manager.install_command(&resolved.packages) {
        lines.push(install);
    }

    Ok(text(lines.join("\n")))
}
