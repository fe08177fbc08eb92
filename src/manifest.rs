//! Project manifest (`compkit.json`)
//!
//! Records which components and lib modules have been materialized into a
//! project, the hash of every file as written, and the alias table used to
//! rewrite imports. Read by `status`, `validate`, `fix`, `diff` and `outdated`.

use crate::materialize::{FileOutcome, MaterializeReport, Owner};
use crate::registry::Registry;
use crate::rewrite::AliasTable;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "compkit.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default)]
    pub registry: RegistryRef,

    /// Import prefix → project alias
    #[serde(default)]
    pub aliases: AliasTable,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub components: BTreeMap<String, InstalledUnit>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lib: BTreeMap<String, InstalledUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryRef {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledUnit {
    /// Registry version the files were copied from
    pub version: String,
    pub installed_at: DateTime<Utc>,
    pub files: Vec<InstalledFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledFile {
    pub source: String,
    pub target: String,
    pub source_hash: String,
    pub hash: String,
}

impl Manifest {
    /// Fresh manifest with the registry's default aliases
    pub fn new(registry: &Registry) -> Result<Self> {
        let aliases = AliasTable::for_registry(registry)
            .context("Registry meta produces an invalid alias table")?;
        Ok(Self::with_aliases(registry, aliases))
    }

    /// Fresh manifest with an explicit alias table
    pub fn with_aliases(registry: &Registry, aliases: AliasTable) -> Self {
        Self {
            registry: RegistryRef {
                name: registry.name.clone(),
                version: registry.version.clone(),
            },
            aliases,
            components: BTreeMap::new(),
            lib: BTreeMap::new(),
        }
    }

    pub fn path(project_root: &Path) -> PathBuf {
        project_root.join(MANIFEST_FILE)
    }

    /// Load the manifest, or `None` if the project has not been initialised
    pub fn load(project_root: &Path) -> Result<Option<Self>> {
        let path = Self::path(project_root);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        let manifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;
        Ok(Some(manifest))
    }

    /// Load the manifest, failing with a hint when it is missing
    pub fn require(project_root: &Path) -> Result<Self> {
        Self::load(project_root)?.with_context(|| {
            format!(
                "No {} found in {}. Run `{} init` first.",
                MANIFEST_FILE,
                project_root.display(),
                crate::BIN_NAME
            )
        })
    }

    /// Load the manifest or create one in memory with `aliases`.
    ///
    /// Returns `true` alongside when the manifest was created.
    pub fn load_or_new(
        project_root: &Path,
        registry: &Registry,
        aliases: &AliasTable,
    ) -> Result<(Self, bool)> {
        match Self::load(project_root)? {
            Some(manifest) => Ok((manifest, false)),
            None => Ok((Self::with_aliases(registry, aliases.clone()), true)),
        }
    }

    pub fn save(&self, project_root: &Path) -> Result<()> {
        let path = Self::path(project_root);
        let mut content =
            serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        content.push('\n');
        fs::write(&path, content)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
        Ok(())
    }

    pub fn is_installed(&self, owner: &Owner) -> bool {
        self.units(owner).contains_key(owner.name())
    }

    pub fn installed(&self, owner: &Owner) -> Option<&InstalledUnit> {
        self.units(owner).get(owner.name())
    }

    fn units(&self, owner: &Owner) -> &BTreeMap<String, InstalledUnit> {
        match owner {
            Owner::Component(_) => &self.components,
            Owner::Lib(_) => &self.lib,
        }
    }

    fn units_mut(&mut self, owner: &Owner) -> &mut BTreeMap<String, InstalledUnit> {
        match owner {
            Owner::Component(_) => &mut self.components,
            Owner::Lib(_) => &mut self.lib,
        }
    }

    /// Record every owner that materialized without failures
    pub fn record(&mut self, registry: &Registry, report: &MaterializeReport) {
        let now = Utc::now();
        for owner in report.completed_owners() {
            let files = report
                .files_of(&owner)
                .filter_map(installed_file)
                .collect();
            self.units_mut(&owner).insert(
                owner.name().to_string(),
                InstalledUnit {
                    version: registry.version.clone(),
                    installed_at: now,
                    files,
                },
            );
        }
        self.registry = RegistryRef {
            name: registry.name.clone(),
            version: registry.version.clone(),
        };
    }

    /// Update (or add) a single file entry after a targeted restore
    pub fn record_file(&mut self, registry: &Registry, outcome: &FileOutcome) {
        let Some(file) = installed_file(outcome) else {
            return;
        };
        let unit = self
            .units_mut(&outcome.owner)
            .entry(outcome.owner.name().to_string())
            .or_insert_with(|| InstalledUnit {
                version: registry.version.clone(),
                installed_at: Utc::now(),
                files: Vec::new(),
            });
        match unit.files.iter_mut().find(|f| f.target == file.target) {
            Some(existing) => *existing = file,
            None => unit.files.push(file),
        }
    }

    /// Replace the recorded hash for `target`, wherever it is tracked
    pub fn refresh_hash(&mut self, target: &str, hash: &str) {
        for unit in self.components.values_mut().chain(self.lib.values_mut()) {
            for file in unit.files.iter_mut().filter(|f| f.target == target) {
                file.hash = hash.to_string();
            }
        }
    }

    /// Every tracked file with its owner
    pub fn files(&self) -> impl Iterator<Item = (Owner, &InstalledFile)> {
        let components = self.components.iter().flat_map(|(name, unit)| {
            unit.files
                .iter()
                .map(move |f| (Owner::Component(name.clone()), f))
        });
        let lib = self
            .lib
            .iter()
            .flat_map(|(name, unit)| unit.files.iter().map(move |f| (Owner::Lib(name.clone()), f)));
        components.chain(lib)
    }
}

fn installed_file(outcome: &FileOutcome) -> Option<InstalledFile> {
    if outcome.is_failure() {
        return None;
    }
    Some(InstalledFile {
        source: outcome.mapping.source.clone(),
        target: outcome.mapping.target.clone(),
        source_hash: outcome.source_hash.clone()?,
        hash: outcome.hash.clone()?,
    })
}
