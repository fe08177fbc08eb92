//! Copying components into a project

use super::text;
use crate::commands::Context;
use crate::install::Installer;
use crate::manifest::MANIFEST_FILE;
use crate::materialize::MaterializeOptions;
use crate::template;
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CopyOwnInfoArgs {}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CopyComponentArgs {
    /// Components to copy; their dependencies are copied too
    pub components: Vec<String>,
    /// Project directory to copy into; relative to the server's project
    /// directory unless absolute
    #[serde(default)]
    pub target_root: Option<PathBuf>,
    /// Replace files that already exist
    #[serde(default)]
    pub overwrite: bool,
}

pub fn get_copy_own_info(ctx: &Context, _args: CopyOwnInfoArgs) -> Result<CallToolResult, McpError> {
    let aliases = ctx
        .default_aliases()
        .map_err(|e| McpError::internal_error(format!("{:#}", e), None))?;
    let alias_lines: Vec<String> = aliases
        .iter()
        .map(|(from, to)| format!("   - `{}` → `{}`", from, to))
        .collect();

    let registry = &ctx.registry;
    let lib_names: Vec<&str> = registry.lib.keys().map(String::as_str).collect();
    let values = template::values([
        ("registry_name", registry.name.clone()),
        ("registry_version", registry.version.clone()),
        ("bin", crate::BIN_NAME.to_string()),
        ("manifest_file", MANIFEST_FILE.to_string()),
        ("scope", registry.meta.scope.clone()),
        ("aliases", alias_lines.join("\n")),
        ("component_count", registry.components.len().to_string()),
        ("category_count", registry.categories.len().to_string()),
        ("lib_count", registry.lib.len().to_string()),
        ("lib_names", lib_names.join(", ")),
    ]);

    let rendered = template::render_embedded("copy-own.md", &values)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(text(rendered))
}

pub fn copy_component(ctx: &Context, args: CopyComponentArgs) -> Result<CallToolResult, McpError> {
    if args.components.is_empty() {
        return Err(McpError::invalid_params(
            "At least one component is required",
            None,
        ));
    }

    let source_root = ctx
        .source_root()
        .map_err(|e| McpError::internal_error(format!("{:#}", e), None))?;
    let target_root = match args.target_root {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => ctx.project_root.join(dir),
        None => ctx.project_root.clone(),
    };
    let aliases = ctx
        .default_aliases()
        .map_err(|e| McpError::internal_error(format!("{:#}", e), None))?;

    tracing::info!(
        "Copying {:?} into {}",
        args.components,
        target_root.display()
    );

    let outcome = Installer::new(&ctx.registry, source_root, &target_root, &aliases)
        .install(
            &args.components,
            MaterializeOptions {
                overwrite: args.overwrite,
                dry_run: false,
            },
        )
        .map_err(|e| McpError::internal_error(format!("{:#}", e), None))?;

    let mut output = String::new();
    for err in &outcome.errors {
        let _ = writeln!(output, "✗ {}", err);
    }
    if outcome.initialized {
        let _ = writeln!(output, "Initialized {}", MANIFEST_FILE);
    }
    if !outcome.set.is_empty() {
        let _ = writeln!(
            output,
            "Copied into {}:\n{}",
            target_root.display(),
            outcome.report
        );
    }
    if let Some(install) = ctx.package_manager().install_command(&outcome.set.packages) {
        let _ = writeln!(output, "\nInstall the required packages:\n  {}", install);
    }

    if outcome.is_success() {
        Ok(text(output))
    } else {
        Ok(CallToolResult::error(vec![Content::text(output)]))
    }
}
