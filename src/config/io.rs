//! Configuration file I/O operations
//!
//! All operations include automatic validation.

use super::paths::get_config_path;
use super::schema::CompkitConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load configuration from the default location
///
/// Returns a default (empty) config if the file doesn't exist.
pub fn load_config() -> Result<CompkitConfig> {
    load_config_from(&get_config_path()?)
}

/// Load and validate configuration from `path`
pub fn load_config_from(path: &Path) -> Result<CompkitConfig> {
    if !path.exists() {
        return Ok(CompkitConfig::default());
    }

    let content =
        fs::read_to_string(path).context(format!("Failed to read config: {}", path.display()))?;

    let config: CompkitConfig =
        toml::from_str(&content).context(format!("Failed to parse config: {}", path.display()))?;

    if let Err(errors) = config.validate() {
        anyhow::bail!(
            "Config validation failed in {}:\n  {}",
            path.display(),
            errors.join("\n  ")
        );
    }

    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Validate and save configuration to `path`, creating parent directories
pub fn save_config_to(config: &CompkitConfig, path: &Path) -> Result<()> {
    if let Err(errors) = config.validate() {
        anyhow::bail!("cannot save invalid config:\n  {}", errors.join("\n  "));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(format!(
            "Failed to create config directory: {}",
            parent.display()
        ))?;
    }

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(path, content).context(format!("Failed to write config: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageManager;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_load_nonexistent_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, CompkitConfig::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let config = CompkitConfig {
            registry: Some(PathBuf::from("/srv/registry/registry.json")),
            package_manager: Some(PackageManager::Bun),
            ..Default::default()
        };
        save_config_to(&config, &config_path).unwrap();

        let loaded = load_config_from(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_config_is_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[aliases]\n\"@a\" = \"@a/b\"\n").unwrap();

        let err = load_config_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("Config validation failed"));
    }

    #[test]
    fn test_unparseable_config_mentions_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "package-manager = 3").unwrap();

        let err = load_config_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
