//! Component registry
//!
//! The registry is a static JSON document describing every distributable
//! component, the shared lib modules they depend on, and the categories used
//! for filtering. It is loaded once per process into an immutable [`Registry`]
//! value which is then passed by reference to the resolver, materializer and
//! validator.
//!
//! ## Sources
//!
//! - The document shipped with this crate (`registry.json`), embedded at compile time
//! - Any other document on disk, selected with `--registry` or the user config

pub mod resolve;

pub use resolve::{Resolution, ResolveError, ResolvedInstallSet, Resolver};

use crate::types::Category;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Registry document embedded at compile time
const EMBEDDED_REGISTRY: &str = include_str!("../../registry.json");

/// Maximum edit distance for "did you mean" suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub meta: RegistryMeta,
    #[serde(default)]
    pub lib: IndexMap<String, LibModule>,
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

/// Import scope and project aliases used to build the default alias table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryMeta {
    /// Package-style scope used by imports inside the registry sources
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Project alias that lib modules are imported through
    #[serde(default = "default_lib_alias")]
    pub lib_alias: String,

    /// Project alias that components are imported through
    #[serde(default = "default_components_alias")]
    pub components_alias: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

fn default_scope() -> String {
    "@compkit".to_string()
}

fn default_lib_alias() -> String {
    "@/lib/compkit".to_string()
}

fn default_components_alias() -> String {
    "@/components/ui".to_string()
}

impl Default for RegistryMeta {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            lib_alias: default_lib_alias(),
            components_alias: default_components_alias(),
            homepage: None,
        }
    }
}

/// One source file and where it lands in the consuming project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileMapping {
    /// Relative to the registry source tree
    pub source: String,
    /// Relative to the consuming project root
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentEntry {
    pub name: String,
    pub title: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<FileMapping>,

    /// External npm packages
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Lib module names
    #[serde(default)]
    pub internal_dependencies: Vec<String>,

    /// Other component names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registry_dependencies: Vec<String>,

    /// Stylesheets (project-relative) the component needs at runtime
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub css: Vec<String>,

    /// Client-only wrapper (project-relative) needed for server rendering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssr_wrapper: Option<String>,

    /// Backend routes (project-relative) the component calls
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_routes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibModule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<FileMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub internal_dependencies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: Category,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Where a registry document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    Embedded,
    File(PathBuf),
}

impl RegistrySource {
    /// Default source tree for this registry: the directory holding the document.
    ///
    /// The embedded document has no source tree on disk.
    pub fn default_source_root(&self) -> Option<PathBuf> {
        match self {
            RegistrySource::Embedded => None,
            RegistrySource::File(path) => path
                .parent()
                .map(|p| if p.as_os_str().is_empty() { Path::new(".") } else { p })
                .map(Path::to_path_buf),
        }
    }
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrySource::Embedded => write!(f, "<embedded>"),
            RegistrySource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Data-integrity defect found in a registry document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    DanglingComponent { referenced_by: String, name: String },
    DanglingLibModule { referenced_by: String, name: String },
    DuplicateComponent { name: String },
    LibKeyMismatch { key: String, name: String },
    UndeclaredCategory { component: String, category: Category },
    Cycle { path: Vec<String> },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingComponent { referenced_by, name } => write!(
                f,
                "'{}' depends on component '{}' which is not in the registry",
                referenced_by, name
            ),
            Self::DanglingLibModule { referenced_by, name } => write!(
                f,
                "'{}' depends on lib module '{}' which is not in the registry",
                referenced_by, name
            ),
            Self::DuplicateComponent { name } => {
                write!(f, "component '{}' is declared more than once", name)
            }
            Self::LibKeyMismatch { key, name } => {
                write!(f, "lib key '{}' holds a module named '{}'", key, name)
            }
            Self::UndeclaredCategory {
                component,
                category,
            } => write!(
                f,
                "component '{}' uses category '{}' which has no category entry",
                component, category
            ),
            Self::Cycle { path } => write!(f, "dependency cycle: {}", path.join(" → ")),
        }
    }
}

impl Registry {
    /// Parse the registry document embedded in the binary
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_REGISTRY).context("Failed to parse embedded registry.json")
    }

    /// Load a registry document from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse registry: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from `source` and log any integrity issues.
    ///
    /// Integrity issues are not fatal here: resolution reports the affected
    /// names precisely when they are actually requested.
    pub fn load(source: &RegistrySource) -> Result<Self> {
        let registry = match source {
            RegistrySource::Embedded => Self::embedded()?,
            RegistrySource::File(path) => Self::from_file(path)?,
        };

        let issues = registry.check();
        for issue in &issues {
            tracing::warn!("registry {}: {}", source, issue);
        }
        tracing::debug!(
            "Loaded registry '{}' v{} from {} ({} components, {} lib modules)",
            registry.name,
            registry.version,
            source,
            registry.components.len(),
            registry.lib.len()
        );

        Ok(registry)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentEntry> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn lib_module(&self, name: &str) -> Option<&LibModule> {
        self.lib.get(name)
    }

    /// Look up a component, failing with a suggestion when it does not exist
    pub fn find_component(&self, name: &str) -> Result<&ComponentEntry, ResolveError> {
        self.component(name)
            .ok_or_else(|| ResolveError::ComponentNotFound {
                name: name.to_string(),
                suggestion: self.suggest(name),
            })
    }

    /// Closest component name to `name`.
    ///
    /// A case-insensitive exact match wins; otherwise the name with the
    /// smallest edit distance, if it is close enough.
    pub fn suggest(&self, name: &str) -> Option<String> {
        if let Some(exact) = self
            .components
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
        {
            return Some(exact.name.clone());
        }

        let needle = name.to_lowercase();
        self.components
            .iter()
            .map(|c| (strsim::levenshtein(&needle, &c.name), &c.name))
            .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name.clone())
    }

    pub fn components_in(&self, category: Category) -> impl Iterator<Item = &ComponentEntry> {
        self.components
            .iter()
            .filter(move |c| c.category == category)
    }

    pub fn category_entry(&self, category: Category) -> Option<&CategoryEntry> {
        self.categories.iter().find(|c| c.name == category)
    }

    /// Check the document for dangling references, duplicates and cycles
    pub fn check(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        let mut seen = HashSet::new();
        for component in &self.components {
            if !seen.insert(component.name.as_str()) {
                issues.push(IntegrityIssue::DuplicateComponent {
                    name: component.name.clone(),
                });
            }
        }

        for (key, module) in &self.lib {
            if key != &module.name {
                issues.push(IntegrityIssue::LibKeyMismatch {
                    key: key.clone(),
                    name: module.name.clone(),
                });
            }
            for dep in &module.internal_dependencies {
                if !self.lib.contains_key(dep) {
                    issues.push(IntegrityIssue::DanglingLibModule {
                        referenced_by: key.clone(),
                        name: dep.clone(),
                    });
                }
            }
        }

        for component in &self.components {
            for dep in &component.registry_dependencies {
                if self.component(dep).is_none() {
                    issues.push(IntegrityIssue::DanglingComponent {
                        referenced_by: component.name.clone(),
                        name: dep.clone(),
                    });
                }
            }
            for dep in &component.internal_dependencies {
                if !self.lib.contains_key(dep) {
                    issues.push(IntegrityIssue::DanglingLibModule {
                        referenced_by: component.name.clone(),
                        name: dep.clone(),
                    });
                }
            }
            if self.category_entry(component.category).is_none() {
                issues.push(IntegrityIssue::UndeclaredCategory {
                    component: component.name.clone(),
                    category: component.category,
                });
            }
        }

        // Each cycle is reported once, however many roots reach it
        let resolver = Resolver::new(self);
        let component_results = self
            .components
            .iter()
            .map(|component| resolver.resolve(&[component.name.as_str()]).map(drop));
        let lib_results = self
            .lib
            .keys()
            .map(|key| resolver.resolve_lib(&[key.as_str()]).map(drop));
        let mut cycles: Vec<Vec<String>> = Vec::new();
        for result in component_results.chain(lib_results) {
            if let Err(ResolveError::CyclicDependency { path }) = result {
                let key = cycle_members(&path);
                if !cycles.iter().any(|c| cycle_members(c) == key) {
                    cycles.push(path);
                }
            }
        }
        issues.extend(cycles.into_iter().map(|path| IntegrityIssue::Cycle { path }));

        issues
    }

    /// All external packages across every component and lib module
    pub fn all_packages(&self) -> Vec<String> {
        let mut packages = indexmap::IndexSet::new();
        for component in &self.components {
            packages.extend(component.dependencies.iter().cloned());
        }
        for module in self.lib.values() {
            packages.extend(module.dependencies.iter().cloned());
        }
        let mut packages: Vec<String> = packages.into_iter().collect();
        packages.sort();
        packages
    }
}

/// Members of a closed cycle path, order-independent
fn cycle_members(path: &[String]) -> Vec<&str> {
    let mut members: Vec<&str> = path[..path.len().saturating_sub(1)]
        .iter()
        .map(String::as_str)
        .collect();
    members.sort_unstable();
    members
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_embedded_registry_parses_and_is_consistent() {
        let registry = Registry::embedded().expect("embedded registry should parse");
        assert!(!registry.components.is_empty());
        assert!(registry.lib.contains_key("types"));
        let issues = registry.check();
        assert!(issues.is_empty(), "embedded registry has issues: {:?}", issues);
    }

    #[test]
    fn test_suggest_prefers_case_insensitive_match() {
        let registry = registry(
            vec![component("input", &[], &[]), component("inputs", &[], &[])],
            vec![],
        );
        assert_eq!(registry.suggest("INPUT"), Some("input".to_string()));
    }

    #[test]
    fn test_suggest_by_edit_distance() {
        let registry = registry(vec![component("textarea", &[], &[])], vec![]);
        assert_eq!(registry.suggest("texarea"), Some("textarea".to_string()));
        assert_eq!(registry.suggest("completely-different"), None);
    }

    #[test]
    fn test_find_component_error_carries_name_and_suggestion() {
        let registry = registry(vec![component("vform", &[], &[])], vec![]);
        let err = registry.find_component("VForm").unwrap_err();
        assert_eq!(
            err,
            ResolveError::ComponentNotFound {
                name: "VForm".to_string(),
                suggestion: Some("vform".to_string()),
            }
        );
        assert!(err.to_string().contains("did you mean 'vform'"));
    }

    #[test]
    fn test_check_reports_dangling_references() {
        let registry = registry(
            vec![component("vform", &["types", "ghost-lib"], &["input", "ghost"])],
            vec![lib("types", &[])],
        );
        let issues = registry.check();
        assert!(issues.contains(&IntegrityIssue::DanglingComponent {
            referenced_by: "vform".to_string(),
            name: "input".to_string(),
        }));
        assert!(issues.contains(&IntegrityIssue::DanglingLibModule {
            referenced_by: "vform".to_string(),
            name: "ghost-lib".to_string(),
        }));
    }

    #[test]
    fn test_check_reports_each_cycle_once() {
        let registry = registry(
            vec![component("a", &[], &["b"]), component("b", &[], &["a"])],
            vec![],
        );
        let cycles: Vec<_> = registry
            .check()
            .into_iter()
            .filter(|i| matches!(i, IntegrityIssue::Cycle { .. }))
            .collect();
        assert_eq!(cycles.len(), 1);
    }

    #[test]
    fn test_check_reports_lib_cycle_no_component_reaches() {
        let registry = registry(
            vec![component("input", &["types"], &[])],
            vec![lib("types", &[]), lib("x", &["y"]), lib("y", &["x"])],
        );
        let cycles: Vec<_> = registry
            .check()
            .into_iter()
            .filter_map(|i| match i {
                IntegrityIssue::Cycle { path } => Some(path),
                _ => None,
            })
            .collect();
        assert_eq!(cycles, vec![vec!["x", "y", "x"]]);
    }

    #[test]
    fn test_check_reports_duplicates_and_undeclared_categories() {
        let mut dup = component("input", &[], &[]);
        dup.category = Category::Media;
        let registry = registry(vec![component("input", &[], &[]), dup], vec![]);
        let issues = registry.check();
        assert!(issues.contains(&IntegrityIssue::DuplicateComponent {
            name: "input".to_string()
        }));
        assert!(issues.iter().any(|i| matches!(
            i,
            IntegrityIssue::UndeclaredCategory {
                category: Category::Media,
                ..
            }
        )));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let json = r#"{
            "version": "1", "name": "x",
            "components": [{ "name": "a", "title": "A", "category": "charts" }]
        }"#;
        assert!(Registry::from_json(json).is_err());
    }

    #[test]
    fn test_default_source_root_for_file() {
        let source = RegistrySource::File(PathBuf::from("/repo/registry.json"));
        assert_eq!(source.default_source_root(), Some(PathBuf::from("/repo")));

        let relative = RegistrySource::File(PathBuf::from("registry.json"));
        assert_eq!(relative.default_source_root(), Some(PathBuf::from(".")));

        assert_eq!(RegistrySource::Embedded.default_source_root(), None);
    }
}
