//! Code generated from the embedded templates

use super::{resolve_error, text};
use crate::commands::Context;
use crate::template::{self, TemplateError};
use regex::Regex;
use rmcp::ErrorData as McpError;
use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::LazyLock;

static COLLECTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("collection pattern is valid")
});

static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("field pattern is valid"));

/// Data type of a collection field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
    Json,
    Uuid,
    File,
    M2o,
    O2m,
    M2m,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
            FieldType::Json => "json",
            FieldType::Uuid => "uuid",
            FieldType::File => "file",
            FieldType::M2o => "m2o",
            FieldType::O2m => "o2m",
            FieldType::M2m => "m2m",
        }
    }

    /// Component that edits this type when the field names none
    pub fn default_interface(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::Integer | FieldType::Float | FieldType::Uuid => "input",
            FieldType::Text => "textarea",
            FieldType::Boolean => "toggle",
            FieldType::Date | FieldType::Datetime => "datetime",
            FieldType::Json => "input-code",
            FieldType::File => "file-image",
            FieldType::M2o => "select-m2o",
            FieldType::O2m => "list-o2m",
            FieldType::M2m => "list-m2m",
        }
    }

    pub fn ts_type(&self) -> &'static str {
        match self {
            FieldType::String
            | FieldType::Text
            | FieldType::Date
            | FieldType::Datetime
            | FieldType::Uuid
            | FieldType::File => "string",
            FieldType::Integer | FieldType::Float => "number",
            FieldType::Boolean => "boolean",
            FieldType::Json => "Record<string, unknown>",
            FieldType::M2o => "string | number",
            FieldType::O2m | FieldType::M2m => "Array<string | number>",
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FieldSpec {
    /// Field key, e.g. "published_at"
    pub name: String,
    /// Data type (defaults to "string")
    #[serde(rename = "type", default)]
    pub kind: FieldType,
    /// Component used to edit the field (defaults by type)
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Display label (defaults to the title-cased name)
    #[serde(default)]
    pub label: Option<String>,
    /// Set by the backend; excluded from the input type
    #[serde(default)]
    pub readonly: bool,
}

impl FieldSpec {
    pub fn interface(&self) -> &str {
        self.interface
            .as_deref()
            .unwrap_or_else(|| self.kind.default_interface())
    }

    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| title_case(&self.name))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CollectionFieldsArgs {
    /// Collection name, e.g. "articles"
    pub collection: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UsageExampleArgs {
    /// Component name
    pub component: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Create,
    #[default]
    Read,
    Update,
    Delete,
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::Create => "create",
            PermissionAction::Read => "read",
            PermissionAction::Update => "update",
            PermissionAction::Delete => "delete",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RbacPatternArgs {
    pub collection: String,
    /// Action to check (defaults to "read")
    #[serde(default)]
    pub action: PermissionAction,
}

/// `blog_posts` → `BlogPosts`
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// `published_at` → `Published At`
pub fn title_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn template_error(err: TemplateError) -> McpError {
    McpError::internal_error(err.to_string(), None)
}

fn check_collection(collection: &str) -> Result<(), McpError> {
    if COLLECTION_NAME.is_match(collection) {
        Ok(())
    } else {
        Err(McpError::invalid_params(
            format!("Invalid collection name '{}'", collection),
            None,
        ))
    }
}

/// Reject empty, duplicate or malformed fields and unknown interfaces
fn check_fields(ctx: &Context, args: &CollectionFieldsArgs) -> Result<(), McpError> {
    check_collection(&args.collection)?;
    if args.fields.is_empty() {
        return Err(McpError::invalid_params("At least one field is required", None));
    }

    let mut seen = HashSet::new();
    for field in &args.fields {
        if !FIELD_NAME.is_match(&field.name) {
            return Err(McpError::invalid_params(
                format!("Invalid field name '{}'", field.name),
                None,
            ));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(McpError::invalid_params(
                format!("Duplicate field '{}'", field.name),
                None,
            ));
        }
        ctx.registry
            .find_component(field.interface())
            .map_err(resolve_error)?;
    }
    Ok(())
}

/// Interfaces a generated form needs, in field order
fn required_components(args: &CollectionFieldsArgs) -> Vec<&str> {
    let mut components = vec!["vform"];
    for field in &args.fields {
        let interface = field.interface();
        if !components.contains(&interface) {
            components.push(interface);
        }
    }
    components
}

pub fn generate_form(ctx: &Context, args: CollectionFieldsArgs) -> Result<CallToolResult, McpError> {
    check_fields(ctx, &args)?;

    let fields: Vec<String> = args
        .fields
        .iter()
        .map(|field| {
            let mut entry = format!(
                "  {{ field: '{}', type: '{}', interface: '{}', label: '{}'",
                field.name,
                field.kind.as_str(),
                field.interface(),
                field.label().replace('\'', "\\'")
            );
            if field.required {
                entry.push_str(", required: true");
            }
            if field.readonly {
                entry.push_str(", readonly: true");
            }
            entry.push_str(" },");
            entry
        })
        .collect();

    let aliases = &ctx.registry.meta;
    let values = template::values([
        ("components_alias", aliases.components_alias.clone()),
        ("lib_alias", aliases.lib_alias.clone()),
        ("type_name", pascal_case(&args.collection)),
        ("fields", fields.join("\n")),
        ("collection", args.collection.clone()),
    ]);
    let code = template::render_embedded("form.tsx.tmpl", &values).map_err(template_error)?;

    let note = format!(
        "Requires: {} add {}",
        crate::BIN_NAME,
        required_components(&args).join(" ")
    );
    Ok(CallToolResult::success(vec![
        Content::text(code),
        Content::text(note),
    ]))
}

pub fn generate_interface(
    ctx: &Context,
    args: CollectionFieldsArgs,
) -> Result<CallToolResult, McpError> {
    check_fields(ctx, &args)?;

    let properties: Vec<String> = args
        .fields
        .iter()
        .map(|field| {
            let readonly = if field.readonly { "readonly " } else { "" };
            if field.required {
                format!("  {}{}: {};", readonly, field.name, field.kind.ts_type())
            } else {
                format!("  {}{}?: {} | null;", readonly, field.name, field.kind.ts_type())
            }
        })
        .collect();

    let readonly: Vec<String> = args
        .fields
        .iter()
        .filter(|f| f.readonly)
        .map(|f| format!("'{}'", f.name))
        .collect();
    let readonly_keys = if readonly.is_empty() {
        "never".to_string()
    } else {
        readonly.join(" | ")
    };

    let values = template::values([
        ("collection", args.collection.clone()),
        ("type_name", pascal_case(&args.collection)),
        ("properties", properties.join("\n")),
        ("readonly_keys", readonly_keys),
    ]);
    let code = template::render_embedded("interface.ts.tmpl", &values).map_err(template_error)?;
    Ok(text(code))
}

pub fn get_usage_example(
    ctx: &Context,
    args: UsageExampleArgs,
) -> Result<CallToolResult, McpError> {
    let entry = ctx
        .registry
        .find_component(&args.component)
        .map_err(resolve_error)?;

    let values = template::values([
        ("export_name", pascal_case(&entry.name)),
        ("components_alias", ctx.registry.meta.components_alias.clone()),
        ("component", entry.name.clone()),
        ("title", entry.title.clone()),
    ]);
    let code = template::render_embedded("usage.tsx.tmpl", &values).map_err(template_error)?;

    let note = format!("Install with: {} add {}", crate::BIN_NAME, entry.name);
    Ok(CallToolResult::success(vec![
        Content::text(code),
        Content::text(note),
    ]))
}

pub fn get_rbac_pattern(ctx: &Context, args: RbacPatternArgs) -> Result<CallToolResult, McpError> {
    check_collection(&args.collection)?;

    let action = args.action.as_str();
    let values = template::values([
        ("lib_alias", ctx.registry.meta.lib_alias.clone()),
        ("action", action.to_string()),
        ("collection", args.collection.clone()),
        ("type_name", pascal_case(&args.collection)),
        ("action_title", capitalize(action)),
    ]);
    let code = template::render_embedded("rbac.ts.tmpl", &values).map_err(template_error)?;
    Ok(text(code))
}
