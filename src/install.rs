//! Resolve → materialize → record
//!
//! The pipeline shared by `add`, `bootstrap` and the `copy_component` tool.
//! Resolution failures only drop the affected roots; materialization failures
//! only leave the affected owners unrecorded.

use crate::manifest::Manifest;
use crate::materialize::{MaterializeOptions, MaterializeReport, Materializer};
use crate::registry::{Registry, ResolveError, ResolvedInstallSet, Resolver};
use crate::rewrite::AliasTable;
use anyhow::Result;
use indexmap::IndexSet;
use std::path::Path;

#[derive(Debug)]
pub struct InstallOutcome {
    pub set: ResolvedInstallSet,
    pub errors: Vec<ResolveError>,
    pub report: MaterializeReport,
    /// The project had no manifest and one was created
    pub initialized: bool,
}

impl InstallOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && !self.report.has_failures()
    }
}

pub struct Installer<'a> {
    registry: &'a Registry,
    source_root: &'a Path,
    project_root: &'a Path,
    /// Alias table for projects that have no manifest yet
    default_aliases: &'a AliasTable,
}

impl<'a> Installer<'a> {
    pub fn new(
        registry: &'a Registry,
        source_root: &'a Path,
        project_root: &'a Path,
        default_aliases: &'a AliasTable,
    ) -> Self {
        Self {
            registry,
            source_root,
            project_root,
            default_aliases,
        }
    }

    /// Install the named components with everything they depend on
    pub fn install<S: AsRef<str>>(
        &self,
        names: &[S],
        options: MaterializeOptions,
    ) -> Result<InstallOutcome> {
        let resolution = Resolver::new(self.registry).resolve_partial(names);
        self.install_set(resolution.set, resolution.errors, options)
    }

    /// Install every lib module without any component.
    ///
    /// Each module is resolved on its own, so one broken module does not
    /// keep the others from being installed.
    pub fn install_lib(&self, options: MaterializeOptions) -> Result<InstallOutcome> {
        let resolver = Resolver::new(self.registry);
        let mut lib: IndexSet<String> = IndexSet::new();
        let mut errors = Vec::new();
        for module in self.registry.lib.keys() {
            match resolver.resolve_lib(&[module]) {
                Ok(found) => lib.extend(found),
                Err(err) => {
                    tracing::debug!("Failed to resolve lib module '{}': {}", module, err);
                    errors.push(err);
                }
            }
        }
        let packages: IndexSet<String> = lib
            .iter()
            .filter_map(|name| self.registry.lib_module(name))
            .flat_map(|module| module.dependencies.iter().cloned())
            .collect();

        let set = ResolvedInstallSet {
            components: Vec::new(),
            lib: lib.into_iter().collect(),
            packages: packages.into_iter().collect(),
        };
        self.install_set(set, errors, options)
    }

    fn install_set(
        &self,
        set: ResolvedInstallSet,
        errors: Vec<ResolveError>,
        options: MaterializeOptions,
    ) -> Result<InstallOutcome> {
        let (mut manifest, initialized) =
            Manifest::load_or_new(self.project_root, self.registry, self.default_aliases)?;

        let report = Materializer::new(
            self.registry,
            self.source_root,
            self.project_root,
            &manifest.aliases,
        )
        .materialize(&set, options);

        if !options.dry_run {
            manifest.record(self.registry, &report);
            manifest.save(self.project_root)?;
        }

        Ok(InstallOutcome {
            set,
            errors,
            report,
            initialized,
        })
    }
}
