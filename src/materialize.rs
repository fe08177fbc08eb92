//! File materialization
//!
//! Copies the files of a resolved install set from the registry source tree
//! into a project, passing source code through the import rewriter.
//!
//! Failures never abort the batch. Every file gets an entry in the returned
//! [`MaterializeReport`] so callers can show exactly what was written,
//! skipped or failed.

use crate::registry::{FileMapping, Registry, ResolvedInstallSet};
use crate::rewrite::{self, AliasTable};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Extensions whose content goes through the import rewriter
const SOURCE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts", "css", "scss",
];

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("source file missing: {}", .path.display())]
    SourceFileMissing { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    TargetWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("target path '{target}' escapes the project root")]
    UnsafeTarget { target: String },
}

/// What a file belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Owner {
    Component(String),
    Lib(String),
}

impl Owner {
    pub fn name(&self) -> &str {
        match self {
            Owner::Component(name) | Owner::Lib(name) => name,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Component(name) => write!(f, "{}", name),
            Owner::Lib(name) => write!(f, "lib/{}", name),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializeOptions {
    /// Replace files that already exist at the target
    pub overwrite: bool,
    /// Report what would happen without touching the filesystem
    pub dry_run: bool,
}

#[derive(Debug)]
pub enum FileStatus {
    Written { rewritten: bool },
    WouldWrite { rewritten: bool },
    /// Target already exists and overwrite was not requested
    Skipped,
    Failed(MaterializeError),
}

#[derive(Debug)]
pub struct FileOutcome {
    pub owner: Owner,
    pub mapping: FileMapping,
    pub status: FileStatus,
    /// SHA-256 of the registry source
    pub source_hash: Option<String>,
    /// SHA-256 of the content now at the target
    pub hash: Option<String>,
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, FileStatus::Failed(_))
    }
}

#[derive(Debug, Default)]
pub struct MaterializeReport {
    pub files: Vec<FileOutcome>,
}

impl MaterializeReport {
    pub fn written(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| {
            matches!(
                f.status,
                FileStatus::Written { .. } | FileStatus::WouldWrite { .. }
            )
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Skipped))
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.files.iter().any(FileOutcome::is_failure)
    }

    /// Owners whose every file was written or already present
    pub fn completed_owners(&self) -> Vec<Owner> {
        let mut owners: Vec<Owner> = Vec::new();
        for file in &self.files {
            if !owners.contains(&file.owner) {
                owners.push(file.owner.clone());
            }
        }
        owners.retain(|owner| {
            !self
                .files
                .iter()
                .any(|f| &f.owner == owner && f.is_failure())
        });
        owners
    }

    pub fn files_of<'a>(&'a self, owner: &'a Owner) -> impl Iterator<Item = &'a FileOutcome> {
        self.files.iter().filter(move |f| &f.owner == owner)
    }
}

impl fmt::Display for MaterializeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            match &file.status {
                FileStatus::Written { rewritten } => writeln!(
                    f,
                    "  ✓ {}{}",
                    file.mapping.target,
                    if *rewritten { " (imports rewritten)" } else { "" }
                )?,
                FileStatus::WouldWrite { rewritten } => writeln!(
                    f,
                    "  + {}{}",
                    file.mapping.target,
                    if *rewritten { " (imports rewritten)" } else { "" }
                )?,
                FileStatus::Skipped => {
                    writeln!(f, "  - {} (skipped, already exists)", file.mapping.target)?
                }
                FileStatus::Failed(err) => writeln!(f, "  ✗ {}: {}", file.mapping.target, err)?,
            }
        }
        let failed = self.failed().count();
        write!(
            f,
            "{} written, {} skipped, {} failed",
            self.written().count(),
            self.skipped().count(),
            failed
        )
    }
}

/// Content a mapping produces once rewritten, without writing it anywhere
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub rewritten: bool,
    pub source_hash: String,
}

pub struct Materializer<'a> {
    registry: &'a Registry,
    source_root: &'a Path,
    target_root: &'a Path,
    aliases: &'a AliasTable,
}

impl<'a> Materializer<'a> {
    pub fn new(
        registry: &'a Registry,
        source_root: &'a Path,
        target_root: &'a Path,
        aliases: &'a AliasTable,
    ) -> Self {
        Self {
            registry,
            source_root,
            target_root,
            aliases,
        }
    }

    pub fn target_root(&self) -> &Path {
        self.target_root
    }

    /// Materialize every file of every component, then every lib module
    pub fn materialize(
        &self,
        set: &ResolvedInstallSet,
        options: MaterializeOptions,
    ) -> MaterializeReport {
        let mut report = MaterializeReport::default();

        for name in &set.components {
            let Some(entry) = self.registry.component(name) else {
                tracing::warn!("Resolved component '{}' vanished from registry", name);
                continue;
            };
            for mapping in &entry.files {
                report.files.push(self.materialize_file(
                    Owner::Component(name.clone()),
                    mapping,
                    options,
                ));
            }
        }

        for name in &set.lib {
            let Some(module) = self.registry.lib_module(name) else {
                tracing::warn!("Resolved lib module '{}' vanished from registry", name);
                continue;
            };
            for mapping in &module.files {
                report
                    .files
                    .push(self.materialize_file(Owner::Lib(name.clone()), mapping, options));
            }
        }

        tracing::info!(
            "Materialized {} files into {} ({} failed)",
            report.files.len(),
            self.target_root.display(),
            report.failed().count()
        );

        report
    }

    /// Read and rewrite one mapping's source
    pub fn render(&self, mapping: &FileMapping) -> Result<Rendered, MaterializeError> {
        let path = self.source_root.join(&mapping.source);
        let bytes = fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => MaterializeError::SourceFileMissing { path: path.clone() },
            _ => MaterializeError::SourceUnreadable {
                path: path.clone(),
                source,
            },
        })?;
        let source_hash = content_hash(&bytes);

        if !is_source_file(&mapping.target) {
            return Ok(Rendered {
                bytes,
                rewritten: false,
                source_hash,
            });
        }

        match String::from_utf8(bytes) {
            Ok(text) => {
                let result = rewrite::rewrite_counted(&text, self.aliases);
                Ok(Rendered {
                    bytes: result.text.into_bytes(),
                    rewritten: result.replaced > 0,
                    source_hash,
                })
            }
            Err(err) => {
                tracing::debug!("{} is not UTF-8, copying verbatim", path.display());
                Ok(Rendered {
                    bytes: err.into_bytes(),
                    rewritten: false,
                    source_hash,
                })
            }
        }
    }

    /// Absolute target path for a mapping, refusing paths that leave the project
    pub fn target_path(&self, mapping: &FileMapping) -> Result<PathBuf, MaterializeError> {
        let relative = Path::new(&mapping.target);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || mapping.target.is_empty() {
            return Err(MaterializeError::UnsafeTarget {
                target: mapping.target.clone(),
            });
        }
        Ok(self.target_root.join(relative))
    }

    pub fn materialize_file(
        &self,
        owner: Owner,
        mapping: &FileMapping,
        options: MaterializeOptions,
    ) -> FileOutcome {
        let outcome = |status, source_hash, hash| FileOutcome {
            owner: owner.clone(),
            mapping: mapping.clone(),
            status,
            source_hash,
            hash,
        };

        let target = match self.target_path(mapping) {
            Ok(target) => target,
            Err(err) => return outcome(FileStatus::Failed(err), None, None),
        };

        let rendered = match self.render(mapping) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!("{}: {}", owner, err);
                return outcome(FileStatus::Failed(err), None, None);
            }
        };

        if target.exists() && !options.overwrite {
            let existing = fs::read(&target).ok().map(|bytes| content_hash(&bytes));
            tracing::debug!("Skipping existing {}", target.display());
            return outcome(FileStatus::Skipped, Some(rendered.source_hash), existing);
        }

        let hash = content_hash(&rendered.bytes);
        if options.dry_run {
            return outcome(
                FileStatus::WouldWrite {
                    rewritten: rendered.rewritten,
                },
                Some(rendered.source_hash),
                Some(hash),
            );
        }

        match write_file(&target, &rendered.bytes) {
            Ok(()) => outcome(
                FileStatus::Written {
                    rewritten: rendered.rewritten,
                },
                Some(rendered.source_hash),
                Some(hash),
            ),
            Err(source) => {
                let err = MaterializeError::TargetWriteFailed {
                    path: target,
                    source,
                };
                tracing::warn!("{}: {}", owner, err);
                outcome(FileStatus::Failed(err), Some(rendered.source_hash), None)
            }
        }
    }
}

fn write_file(target: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, bytes)
}

/// Whether a path's content should go through the import rewriter
pub fn is_source_file(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Hex SHA-256 of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
