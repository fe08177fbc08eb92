//! Configuration schema for compkit
//!
//! All fields use `#[serde(default)]` so partial configs parse, and
//! `skip_serializing_if` so saved files only contain what was set.

use crate::rewrite::AliasTable;
use crate::types::PackageManager;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CompkitConfig {
    /// Registry document to use instead of the embedded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,

    /// Tree the registry's `source` paths are relative to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,

    /// Package manager for install hints (detected from lockfiles when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<PackageManager>,

    /// Alias entries merged over the registry defaults by `init`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
}

impl CompkitConfig {
    /// Validate the configuration for common errors
    ///
    /// Returns Ok(()) if valid, or Err with a list of error messages
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (key, path) in [
            ("registry", &self.registry),
            ("source-root", &self.source_root),
        ] {
            if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                errors.push(format!("'{}' cannot be an empty path", key));
            }
        }

        if let Err(e) = AliasTable::new(self.aliases.clone()) {
            errors.push(format!("invalid aliases: {}", e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CompkitConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: CompkitConfig = toml::from_str(
            r#"
package-manager = "pnpm"

[aliases]
"@compkit/ui" = "~/ui"
"#,
        )
        .unwrap();
        assert_eq!(config.package_manager, Some(PackageManager::Pnpm));
        assert!(config.registry.is_none());
        assert_eq!(config.aliases.get("@compkit/ui").unwrap(), "~/ui");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_every_error() {
        let config = CompkitConfig {
            registry: Some(PathBuf::new()),
            aliases: BTreeMap::from([("@ui".to_string(), "@ui/x".to_string())]),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("registry"));
        assert!(errors[1].contains("invalid aliases"));
    }
}
