//! Project validation
//!
//! Scans a project that components were materialized into for the failure
//! signatures that break a copied component at build or run time:
//!
//! - import specifiers still using the registry scope
//! - lib module files that are required but missing
//! - stylesheets, server-safe wrappers and API routes that installed
//!   components need but the project lacks
//!
//! Every check runs independently and only ever produces findings; nothing
//! here fails the scan as a whole. Findings with a deterministic remedy can be
//! applied with [`Validator::fix`].

mod fix;

pub use fix::{FixReport, RewrittenFile};

use crate::manifest::Manifest;
use crate::materialize::{Owner, is_source_file};
use crate::registry::{FileMapping, Registry, Resolver};
use crate::rewrite;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Directories never descended into by a deep scan
const SKIP_DIRS: &[&str] = &["node_modules", ".git", ".next", "dist", "build"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    UntransformedImport,
    MissingLibFile,
    MissingCss,
    MissingSsrWrapper,
    MissingApiRoute,
}

/// Deterministic fix for a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Remedy {
    /// Run the import rewriter over a project file in place
    RewriteImports { path: String },
    /// Materialize one registry file again
    RestoreFile { owner: Owner, mapping: FileMapping },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub check: CheckKind,
    pub severity: Severity,
    pub message: String,
    /// Relative to the project root
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remedy: Option<Remedy>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
    pub files_scanned: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn of_kind(&self, check: CheckKind) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.check == check)
    }

    pub fn fixable(&self) -> usize {
        self.findings.iter().filter(|f| f.remedy.is_some()).count()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            let location = match finding.line {
                Some(line) => format!("{}:{}", finding.file_path, line),
                None => finding.file_path.clone(),
            };
            writeln!(
                f,
                "  {:<7} {}: {}{}",
                finding.severity,
                location,
                finding.message,
                if finding.remedy.is_some() {
                    " [fixable]"
                } else {
                    ""
                }
            )?;
        }
        write!(
            f,
            "{} files scanned: {} errors, {} warnings",
            self.files_scanned,
            self.count(Severity::Error),
            self.count(Severity::Warning)
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Scan every source file under the project root, not only tracked files
    pub deep: bool,
}

pub struct Validator<'a> {
    registry: &'a Registry,
    manifest: &'a Manifest,
    target_root: &'a Path,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a Registry, manifest: &'a Manifest, target_root: &'a Path) -> Self {
        Self {
            registry,
            manifest,
            target_root,
        }
    }

    pub fn validate(&self, options: ValidateOptions) -> ValidationReport {
        let mut report = ValidationReport::default();

        self.check_imports(options, &mut report);
        self.check_lib_files(&mut report);
        self.check_component_requirements(&mut report);

        tracing::info!(
            "Validated {}: {} findings",
            self.target_root.display(),
            report.findings.len()
        );
        report
    }

    fn check_imports(&self, options: ValidateOptions, report: &mut ValidationReport) {
        let files = self.files_to_scan(options);
        report.files_scanned = files.len();

        let scope = &self.registry.meta.scope;
        let scoped = format!("{}/", scope);

        for relative in files {
            let path = self.target_root.join(&relative);
            let Ok(text) = fs::read_to_string(&path) else {
                continue;
            };
            for spec in rewrite::specifiers(&text) {
                let aliased = self.manifest.aliases.lookup(spec.value).is_some();
                if !aliased && spec.value != scope.as_str() && !spec.value.starts_with(&scoped) {
                    continue;
                }
                report.findings.push(Finding {
                    check: CheckKind::UntransformedImport,
                    severity: Severity::Error,
                    message: format!("untransformed import '{}'", spec.value),
                    file_path: relative.clone(),
                    line: Some(spec.line),
                    remedy: aliased.then(|| Remedy::RewriteImports {
                        path: relative.clone(),
                    }),
                });
            }
        }
    }

    /// Tracked source files, plus every source file on disk when `deep`
    fn files_to_scan(&self, options: ValidateOptions) -> BTreeSet<String> {
        let mut files: BTreeSet<String> = self
            .manifest
            .files()
            .map(|(_, file)| file.target.clone())
            .filter(|target| is_source_file(target) && self.target_root.join(target).is_file())
            .collect();

        if options.deep {
            let walker = WalkDir::new(self.target_root)
                .into_iter()
                .filter_entry(|entry| {
                    !(entry.file_type().is_dir()
                        && entry
                            .file_name()
                            .to_str()
                            .is_some_and(|name| SKIP_DIRS.contains(&name)))
                });
            for entry in walker.filter_map(Result::ok) {
                if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                    continue;
                }
                if let Ok(relative) = entry.path().strip_prefix(self.target_root) {
                    files.insert(to_slash(relative));
                }
            }
        }

        files
    }

    /// Lib modules the project needs: the closure of every installed
    /// component's lib dependencies plus every lib module recorded directly
    fn required_lib(&self) -> Vec<String> {
        let resolver = Resolver::new(self.registry);
        let components: Vec<&str> = self.manifest.components.keys().map(String::as_str).collect();
        let mut required = resolver.resolve_partial(&components).set.lib;

        let recorded: Vec<&str> = self
            .manifest
            .lib
            .keys()
            .map(String::as_str)
            .filter(|name| self.registry.lib_module(name).is_some())
            .collect();
        match resolver.resolve_lib(&recorded) {
            Ok(lib) => {
                for name in lib {
                    if !required.contains(&name) {
                        required.push(name);
                    }
                }
            }
            Err(err) => tracing::warn!("Cannot resolve recorded lib modules: {}", err),
        }
        required
    }

    fn check_lib_files(&self, report: &mut ValidationReport) {
        for name in self.required_lib() {
            let Some(module) = self.registry.lib_module(&name) else {
                continue;
            };
            for mapping in &module.files {
                if self.exists(&mapping.target) {
                    continue;
                }
                report.findings.push(Finding {
                    check: CheckKind::MissingLibFile,
                    severity: Severity::Error,
                    message: format!("lib module '{}' file is missing", name),
                    file_path: mapping.target.clone(),
                    line: None,
                    remedy: Some(Remedy::RestoreFile {
                        owner: Owner::Lib(name.clone()),
                        mapping: mapping.clone(),
                    }),
                });
            }
        }
    }

    fn check_component_requirements(&self, report: &mut ValidationReport) {
        // Routes are shared between components; report each once
        let mut routes: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for name in self.manifest.components.keys() {
            let Some(entry) = self.registry.component(name) else {
                continue;
            };

            for css in &entry.css {
                if !self.exists(css) {
                    report.findings.push(Finding {
                        check: CheckKind::MissingCss,
                        severity: Severity::Warning,
                        message: format!("stylesheet required by '{}' is missing", name),
                        file_path: css.clone(),
                        line: None,
                        remedy: restore_remedy(name, &entry.files, css),
                    });
                }
            }

            if let Some(wrapper) = &entry.ssr_wrapper
                && !self.exists(wrapper)
            {
                report.findings.push(Finding {
                    check: CheckKind::MissingSsrWrapper,
                    severity: Severity::Warning,
                    message: format!("client-only wrapper for '{}' is missing", name),
                    file_path: wrapper.clone(),
                    line: None,
                    remedy: restore_remedy(name, &entry.files, wrapper),
                });
            }

            for route in &entry.api_routes {
                routes.entry(route.as_str()).or_default().push(name.as_str());
            }
        }

        for (route, users) in routes {
            if self.exists(route) {
                continue;
            }
            report.findings.push(Finding {
                check: CheckKind::MissingApiRoute,
                severity: Severity::Warning,
                message: format!("API route used by {} is missing", users.join(", ")),
                file_path: route.to_string(),
                line: None,
                remedy: None,
            });
        }
    }

    fn exists(&self, relative: &str) -> bool {
        self.target_root.join(relative).exists()
    }
}

/// Restoring is only possible when the file is one the component ships
fn restore_remedy(component: &str, files: &[FileMapping], target: &str) -> Option<Remedy> {
    files
        .iter()
        .find(|m| m.target == target)
        .map(|mapping| Remedy::RestoreFile {
            owner: Owner::Component(component.to_string()),
            mapping: mapping.clone(),
        })
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::manifest::{InstalledFile, InstalledUnit};
    use crate::registry::testing::{component, lib, registry};
    use chrono::Utc;
    use tempfile::TempDir;

    pub(crate) fn unit(files: &[&str]) -> InstalledUnit {
        InstalledUnit {
            version: "1.0.0".to_string(),
            installed_at: Utc::now(),
            files: files
                .iter()
                .map(|target| InstalledFile {
                    source: String::new(),
                    target: target.to_string(),
                    source_hash: String::new(),
                    hash: String::new(),
                })
                .collect(),
        }
    }

    pub(crate) fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub(crate) fn fixture() -> (Registry, Manifest, TempDir) {
        let mut editor = component("editor", &["hooks"], &[]);
        editor.css = vec!["src/app/editor.css".to_string()];
        editor.ssr_wrapper = Some("src/components/ui/editor-client.tsx".to_string());
        editor.files.push(FileMapping {
            source: "ui/editor-client.tsx".to_string(),
            target: "src/components/ui/editor-client.tsx".to_string(),
        });
        editor.api_routes = vec!["src/app/api/files/route.ts".to_string()];

        let registry = registry(
            vec![editor],
            vec![lib("types", &[]), lib("hooks", &["types"])],
        );
        let mut manifest = Manifest::new(&registry).unwrap();
        manifest
            .components
            .insert("editor".to_string(), unit(&["src/components/ui/editor.tsx"]));
        (registry, manifest, TempDir::new().unwrap())
    }

    #[test]
    fn test_reports_every_missing_requirement() {
        let (registry, manifest, dir) = fixture();
        write(
            dir.path(),
            "src/components/ui/editor.tsx",
            "import { x } from '@/lib/compkit/hooks';\n",
        );

        let report = Validator::new(&registry, &manifest, dir.path()).validate(Default::default());

        assert_eq!(report.of_kind(CheckKind::MissingLibFile).count(), 2);
        assert_eq!(report.of_kind(CheckKind::MissingCss).count(), 1);
        assert_eq!(report.of_kind(CheckKind::MissingSsrWrapper).count(), 1);
        assert_eq!(report.of_kind(CheckKind::MissingApiRoute).count(), 1);
        assert_eq!(report.of_kind(CheckKind::UntransformedImport).count(), 0);
        assert_eq!(report.count(Severity::Error), 2);
        assert_eq!(report.count(Severity::Warning), 3);

        // css is not shipped by the component, the wrapper is
        let css = report.of_kind(CheckKind::MissingCss).next().unwrap();
        assert!(css.remedy.is_none());
        let wrapper = report.of_kind(CheckKind::MissingSsrWrapper).next().unwrap();
        assert!(matches!(wrapper.remedy, Some(Remedy::RestoreFile { .. })));
    }

    #[test]
    fn test_clean_project() {
        let (registry, manifest, dir) = fixture();
        for file in [
            "src/components/ui/editor.tsx",
            "src/components/ui/editor-client.tsx",
            "src/app/editor.css",
            "src/app/api/files/route.ts",
            "src/lib/compkit/types/index.ts",
            "src/lib/compkit/hooks/index.ts",
        ] {
            write(dir.path(), file, "export {};\n");
        }

        let report = Validator::new(&registry, &manifest, dir.path()).validate(Default::default());
        assert!(report.is_clean(), "{report}");
        assert_eq!(report.files_scanned, 1);
    }

    #[test]
    fn test_untransformed_imports_with_lines() {
        let (registry, manifest, dir) = fixture();
        write(
            dir.path(),
            "src/components/ui/editor.tsx",
            "import React from 'react';\nimport { a } from '@compkit/hooks';\nimport { b } from '@compkit/unknown';\n",
        );

        let report = Validator::new(&registry, &manifest, dir.path()).validate(Default::default());
        let found: Vec<&Finding> = report.of_kind(CheckKind::UntransformedImport).collect();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].line, Some(2));
        assert_eq!(
            found[0].remedy,
            Some(Remedy::RewriteImports {
                path: "src/components/ui/editor.tsx".to_string()
            })
        );
        // Scope import with no alias: reported, but no deterministic fix
        assert_eq!(found[1].line, Some(3));
        assert!(found[1].remedy.is_none());
    }

    #[test]
    fn test_deep_scan_skips_vendored_dirs() {
        let (registry, manifest, dir) = fixture();
        write(dir.path(), "src/components/ui/editor.tsx", "export {};\n");
        write(dir.path(), "src/app/page.tsx", "import '@compkit/types';\n");
        write(
            dir.path(),
            "node_modules/pkg/index.js",
            "require('@compkit/types');\n",
        );

        let validator = Validator::new(&registry, &manifest, dir.path());
        let shallow = validator.validate(ValidateOptions { deep: false });
        assert_eq!(shallow.of_kind(CheckKind::UntransformedImport).count(), 0);

        let deep = validator.validate(ValidateOptions { deep: true });
        let found: Vec<&Finding> = deep.of_kind(CheckKind::UntransformedImport).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file_path, "src/app/page.tsx");
        assert_eq!(deep.files_scanned, 2);
    }

    #[test]
    fn test_checks_are_independent_of_registry_drift() {
        let (registry, mut manifest, dir) = fixture();
        manifest
            .components
            .insert("removed".to_string(), unit(&["src/components/ui/removed.tsx"]));
        manifest.lib.insert("gone".to_string(), unit(&[]));

        let report = Validator::new(&registry, &manifest, dir.path()).validate(Default::default());
        assert_eq!(report.of_kind(CheckKind::MissingLibFile).count(), 2);
    }
}
