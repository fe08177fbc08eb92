//! CLI subcommands
//!
//! Every command receives a [`Context`] built once from the global flags and
//! the user config, and returns the process exit code.

pub mod add;
pub mod bootstrap;
pub mod diff;
pub mod info;
pub mod init;
pub mod list;
pub mod outdated;
pub mod server;
pub mod status;
pub mod tree;
pub mod validate;

use crate::config::{self, CompkitConfig};
use crate::registry::{Registry, RegistrySource};
use crate::rewrite::AliasTable;
use crate::types::PackageManager;
use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Registry document to use instead of the embedded one
    #[arg(long, global = true, env = "COMPKIT_REGISTRY", value_name = "FILE")]
    pub registry: Option<PathBuf>,

    /// Directory the registry's source paths are relative to
    /// (defaults to the directory holding the registry document)
    #[arg(long, global = true, env = "COMPKIT_SOURCE_ROOT", value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Everything a command needs, resolved once per process
#[derive(Debug)]
pub struct Context {
    pub registry: Registry,
    pub source: RegistrySource,
    pub project_root: PathBuf,
    pub config: CompkitConfig,
    source_root: Option<PathBuf>,
}

impl Context {
    /// Resolve flags over the user config (flag > env > config > default)
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let config = config::load_config()?;
        Self::with_config(args, config)
    }

    pub fn with_config(args: &GlobalArgs, config: CompkitConfig) -> Result<Self> {
        let project_root = match &args.cwd {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to get current directory")?,
        };

        let source = match args.registry.as_ref().or(config.registry.as_ref()) {
            Some(path) => RegistrySource::File(path.clone()),
            None => RegistrySource::Embedded,
        };
        let registry = Registry::load(&source)?;

        let source_root = args
            .source_root
            .clone()
            .or_else(|| config.source_root.clone())
            .or_else(|| source.default_source_root());

        tracing::debug!(
            "Project root {}, registry {}, source root {:?}",
            project_root.display(),
            source,
            source_root
        );

        Ok(Self {
            registry,
            source,
            project_root,
            config,
            source_root,
        })
    }

    /// Source tree to copy from; commands that write files need one
    pub fn source_root(&self) -> Result<&Path> {
        self.source_root.as_deref().with_context(|| {
            format!(
                "No registry source tree is available for the {} registry.\n\
                 Pass --source-root <DIR> (or set COMPKIT_SOURCE_ROOT), or point \
                 --registry at a registry.json inside a checkout.",
                self.source
            )
        })
    }

    pub fn has_source_root(&self) -> bool {
        self.source_root.is_some()
    }

    /// Configured package manager, else the one the project's lockfile implies
    pub fn package_manager(&self) -> PackageManager {
        self.config
            .package_manager
            .unwrap_or_else(|| PackageManager::detect(&self.project_root))
    }

    /// Alias table for new manifests: registry defaults overlaid with the config
    pub fn default_aliases(&self) -> Result<AliasTable> {
        let mut entries: BTreeMap<String, String> =
            AliasTable::for_registry(&self.registry)?.into();
        entries.extend(self.config.aliases.clone());
        AliasTable::new(entries).context("Configured aliases conflict with the registry defaults")
    }
}

/// Print a value as pretty JSON on stdout
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

/// Print the package install hint, if there is anything to install
pub(crate) fn print_install_hint(ctx: &Context, packages: &[String]) {
    if let Some(command) = ctx.package_manager().install_command(packages) {
        println!("\nInstall the required packages:");
        println!("  {}", command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(dir: &TempDir) -> GlobalArgs {
        GlobalArgs {
            cwd: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_embedded_registry_has_no_source_root() {
        let dir = TempDir::new().unwrap();
        let ctx = Context::with_config(&args(&dir), CompkitConfig::default()).unwrap();
        assert_eq!(ctx.source, RegistrySource::Embedded);
        assert!(!ctx.has_source_root());
        assert!(ctx.source_root().unwrap_err().to_string().contains("--source-root"));
    }

    #[test]
    fn test_flag_wins_over_config() {
        let dir = TempDir::new().unwrap();
        let config = CompkitConfig {
            source_root: Some(PathBuf::from("/from/config")),
            package_manager: Some(PackageManager::Yarn),
            ..Default::default()
        };

        let ctx = Context::with_config(&args(&dir), config.clone()).unwrap();
        assert_eq!(ctx.source_root().unwrap(), Path::new("/from/config"));
        assert_eq!(ctx.package_manager(), PackageManager::Yarn);

        let flagged = GlobalArgs {
            source_root: Some(PathBuf::from("/from/flag")),
            ..args(&dir)
        };
        let ctx = Context::with_config(&flagged, config).unwrap();
        assert_eq!(ctx.source_root().unwrap(), Path::new("/from/flag"));
    }

    #[test]
    fn test_registry_file_provides_source_root() {
        let dir = TempDir::new().unwrap();
        let registry_path = dir.path().join("registry.json");
        std::fs::write(&registry_path, include_str!("../../registry.json")).unwrap();

        let ctx = Context::with_config(
            &GlobalArgs {
                registry: Some(registry_path),
                ..args(&dir)
            },
            CompkitConfig::default(),
        )
        .unwrap();
        assert_eq!(ctx.source_root().unwrap(), dir.path());
    }

    #[test]
    fn test_package_manager_detected_from_lockfile() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pnpm-lock.yaml"), "").unwrap();
        let ctx = Context::with_config(&args(&dir), CompkitConfig::default()).unwrap();
        assert_eq!(ctx.package_manager(), PackageManager::Pnpm);
    }

    #[test]
    fn test_config_aliases_overlay_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CompkitConfig {
            aliases: BTreeMap::from([("@compkit/ui".to_string(), "~/ui".to_string())]),
            ..Default::default()
        };
        let ctx = Context::with_config(&args(&dir), config).unwrap();
        let aliases = ctx.default_aliases().unwrap();
        assert_eq!(
            aliases.rewrite_specifier("@compkit/ui/input"),
            Some("~/ui/input".to_string())
        );
        assert_eq!(
            aliases.rewrite_specifier("@compkit/types"),
            Some("@/lib/compkit/types".to_string())
        );
    }
}
