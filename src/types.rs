use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Component category. The set is closed: registry documents using any other
/// value fail to parse.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
    JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum Category {
    Input,
    Selection,
    Datetime,
    Media,
    Relational,
    RichText,
    Layout,
    Collection,
    Form,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Input => "input",
            Category::Selection => "selection",
            Category::Datetime => "datetime",
            Category::Media => "media",
            Category::Relational => "relational",
            Category::RichText => "rich-text",
            Category::Layout => "layout",
            Category::Collection => "collection",
            Category::Form => "form",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, JsonSchema, Default,
)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

impl PackageManager {
    /// Guess the package manager from lockfiles in `project_root`
    pub fn detect(project_root: &Path) -> Self {
        if project_root.join("pnpm-lock.yaml").exists() {
            PackageManager::Pnpm
        } else if project_root.join("yarn.lock").exists() {
            PackageManager::Yarn
        } else if project_root.join("bun.lockb").exists() || project_root.join("bun.lock").exists()
        {
            PackageManager::Bun
        } else {
            PackageManager::Npm
        }
    }

    /// Command line that installs `packages`, or `None` when there is nothing to install
    pub fn install_command<S: AsRef<str>>(&self, packages: &[S]) -> Option<String> {
        if packages.is_empty() {
            return None;
        }
        let verb = match self {
            PackageManager::Npm => "npm install",
            PackageManager::Pnpm => "pnpm add",
            PackageManager::Yarn => "yarn add",
            PackageManager::Bun => "bun add",
        };
        let list: Vec<&str> = packages.iter().map(AsRef::as_ref).collect();
        Some(format!("{} {}", verb, list.join(" ")))
    }

    /// Runner used to invoke the CLI without installing it
    pub fn runner(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npx",
            PackageManager::Pnpm => "pnpm dlx",
            PackageManager::Yarn => "yarn dlx",
            PackageManager::Bun => "bunx",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PackageManager::Npm => write!(f, "npm"),
            PackageManager::Pnpm => write!(f, "pnpm"),
            PackageManager::Yarn => write!(f, "yarn"),
            PackageManager::Bun => write!(f, "bun"),
        }
    }
}
