use super::{Context, print_json};
use crate::manifest::{InstalledUnit, Manifest};
use crate::materialize::{Owner, content_hash};
use crate::registry::{FileMapping, Registry};
use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutdatedEntry {
    pub owner: Owner,
    pub installed_version: String,
    /// `None` when the registry no longer has this component or lib module
    pub registry_version: Option<String>,
    /// Registry sources that changed since they were copied
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changed_files: Vec<String>,
    /// Files the registry ships now that were not copied
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub new_files: Vec<String>,
}

/// Installed units that differ from the current registry.
///
/// Without a source tree only versions are compared.
pub fn check(
    registry: &Registry,
    manifest: &Manifest,
    source_root: Option<&Path>,
) -> Vec<OutdatedEntry> {
    let mut entries = Vec::new();

    let units = manifest
        .components
        .iter()
        .map(|(name, unit)| (Owner::Component(name.clone()), unit))
        .chain(
            manifest
                .lib
                .iter()
                .map(|(name, unit)| (Owner::Lib(name.clone()), unit)),
        );

    for (owner, unit) in units {
        let files = match &owner {
            Owner::Component(name) => registry.component(name).map(|c| c.files.as_slice()),
            Owner::Lib(name) => registry.lib_module(name).map(|m| m.files.as_slice()),
        };

        let Some(files) = files else {
            entries.push(OutdatedEntry {
                owner,
                installed_version: unit.version.clone(),
                registry_version: None,
                changed_files: Vec::new(),
                new_files: Vec::new(),
            });
            continue;
        };

        let (changed_files, new_files) = match source_root {
            Some(root) => compare_sources(unit, files, root),
            None => (Vec::new(), Vec::new()),
        };

        if unit.version != registry.version || !changed_files.is_empty() || !new_files.is_empty()
        {
            entries.push(OutdatedEntry {
                owner,
                installed_version: unit.version.clone(),
                registry_version: Some(registry.version.clone()),
                changed_files,
                new_files,
            });
        }
    }

    entries
}

fn compare_sources(
    unit: &InstalledUnit,
    files: &[FileMapping],
    source_root: &Path,
) -> (Vec<String>, Vec<String>) {
    let mut changed = Vec::new();
    for recorded in &unit.files {
        let current = files
            .iter()
            .find(|m| m.target == recorded.target)
            .and_then(|m| fs::read(source_root.join(&m.source)).ok())
            .map(|bytes| content_hash(&bytes));
        if current.as_deref() != Some(recorded.source_hash.as_str()) {
            changed.push(recorded.target.clone());
        }
    }

    let new = files
        .iter()
        .filter(|m| !unit.files.iter().any(|f| f.target == m.target))
        .map(|m| m.target.clone())
        .collect();

    (changed, new)
}

pub fn run(ctx: &Context, json: bool) -> Result<ExitCode> {
    let manifest = Manifest::require(&ctx.project_root)?;
    let source_root = if ctx.has_source_root() {
        Some(ctx.source_root()?)
    } else {
        tracing::warn!("No registry source tree; comparing versions only");
        None
    };
    let entries = check(&ctx.registry, &manifest, source_root);

    if json {
        print_json(&entries)?;
        return Ok(ExitCode::SUCCESS);
    }

    if entries.is_empty() {
        println!(
            "✅ Everything is up to date with {} v{}",
            ctx.registry.name, ctx.registry.version
        );
        return Ok(ExitCode::SUCCESS);
    }

    for entry in &entries {
        match &entry.registry_version {
            None => println!("{}: removed from the registry", entry.owner),
            Some(version) => println!(
                "{}: installed v{}, registry v{}",
                entry.owner, entry.installed_version, version
            ),
        }
        for file in &entry.changed_files {
            println!("  ~ {}", file);
        }
        for file in &entry.new_files {
            println!("  + {}", file);
        }
    }
    println!(
        "\nRun `{} diff <component>` to review, then `{} add <component> --overwrite` to update.",
        crate::BIN_NAME,
        crate::BIN_NAME
    );

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::InstalledFile;
    use crate::registry::testing::{component, lib, registry};
    use chrono::Utc;
    use tempfile::TempDir;

    fn unit(version: &str, files: Vec<InstalledFile>) -> InstalledUnit {
        InstalledUnit {
            version: version.to_string(),
            installed_at: Utc::now(),
            files,
        }
    }

    fn recorded(target: &str, source_hash: String) -> InstalledFile {
        InstalledFile {
            source: String::new(),
            target: target.to_string(),
            source_hash,
            hash: String::new(),
        }
    }

    #[test]
    fn test_check_reports_changes() {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("ui")).unwrap();
        fs::write(source.path().join("ui/a.tsx"), "v2").unwrap();
        fs::write(source.path().join("ui/b.tsx"), "same").unwrap();

        let registry = registry(
            vec![component("a", &[], &[]), component("b", &[], &[])],
            vec![lib("types", &[])],
        );
        let mut manifest = Manifest::new(&registry).unwrap();
        manifest.components.insert(
            "a".to_string(),
            unit(
                "1.0.0",
                vec![recorded("src/components/ui/a.tsx", content_hash(b"v1"))],
            ),
        );
        manifest.components.insert(
            "b".to_string(),
            unit(
                "1.0.0",
                vec![recorded("src/components/ui/b.tsx", content_hash(b"same"))],
            ),
        );
        manifest
            .components
            .insert("removed".to_string(), unit("0.9.0", vec![]));
        manifest.lib.insert("types".to_string(), unit("0.9.0", vec![]));

        let entries = check(&registry, &manifest, Some(source.path()));
        let owners: Vec<String> = entries.iter().map(|e| e.owner.to_string()).collect();
        assert_eq!(owners, vec!["a", "removed", "lib/types"]);

        assert_eq!(entries[0].changed_files, vec!["src/components/ui/a.tsx"]);
        assert!(entries[1].registry_version.is_none());
        assert_eq!(entries[2].new_files, vec!["src/lib/compkit/types/index.ts"]);
    }

    #[test]
    fn test_check_without_sources_compares_versions() {
        let registry = registry(vec![component("a", &[], &[])], vec![]);
        let mut manifest = Manifest::new(&registry).unwrap();
        manifest.components.insert(
            "a".to_string(),
            unit("1.0.0", vec![recorded("x", String::new())]),
        );
        assert!(check(&registry, &manifest, None).is_empty());

        manifest.components.get_mut("a").unwrap().version = "0.1.0".to_string();
        assert_eq!(check(&registry, &manifest, None).len(), 1);
    }
}
