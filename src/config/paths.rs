//! Directory path management for compkit

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Base compkit config directory (~/.config/compkit/)
pub fn get_compkit_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Failed to get config directory")?
        .join("compkit"))
}

/// Config file path (~/.config/compkit/config.toml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_compkit_dir()?.join("config.toml"))
}

/// Log directory for the MCP server
///
/// - XDG_DATA_HOME/compkit/logs/ on Unix (typically ~/.local/share/compkit/logs/)
/// - ~/Library/Application Support/compkit/logs/ on macOS
/// - {FOLDERID_LocalAppData}/compkit/logs/ on Windows
pub fn get_log_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .context("Failed to determine data directory (XDG_DATA_HOME or platform equivalent)")?;
    Ok(data_dir.join("compkit").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compkit_dir_is_under_config() {
        let dir = get_compkit_dir().unwrap();
        assert!(dir.ends_with("compkit"));
        assert_eq!(dir.parent().unwrap(), dirs::config_dir().unwrap());
        assert_eq!(get_config_path().unwrap(), dir.join("config.toml"));
    }

    #[test]
    fn test_log_dir() {
        let log_dir = get_log_dir().unwrap();
        assert!(log_dir.ends_with("compkit/logs"));
    }
}
