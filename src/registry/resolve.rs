//! Dependency resolution
//!
//! Computes the transitive closure of a set of requested components over
//! `registryDependencies` (component → component) and `internalDependencies`
//! (component → lib module, lib module → lib module).
//!
//! Ordering is first-discovered-first-listed. Requested roots are sorted
//! before traversal so the output does not depend on the order in which
//! names were given; each root is then walked depth-first in declaration
//! order, discovering a component's lib modules before its component
//! dependencies. A root that another requested root depends on is walked
//! last, so it is normally discovered inside its dependent's walk and
//! listed after it.

use super::Registry;
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("component '{name}' not found in registry{}", suggestion_hint(.suggestion))]
    ComponentNotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("lib module '{name}' required by '{required_by}' not found in registry")]
    LibModuleNotFound { name: String, required_by: String },

    #[error("dependency cycle detected: {}", .path.join(" → "))]
    CyclicDependency { path: Vec<String> },
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{}'?)", name),
        None => String::new(),
    }
}

/// Output of a resolution: everything needed to materialize the request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedInstallSet {
    pub components: Vec<String>,
    pub lib: Vec<String>,
    pub packages: Vec<String>,
}

impl ResolvedInstallSet {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.lib.is_empty()
    }
}

/// Result of a batch resolution that tolerates per-root failures
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub set: ResolvedInstallSet,
    pub errors: Vec<ResolveError>,
}

pub struct Resolver<'r> {
    registry: &'r Registry,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Resolve `requested`, failing on the first unresolvable root
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Result<ResolvedInstallSet, ResolveError> {
        let resolution = self.resolve_partial(requested);
        match resolution.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(resolution.set),
        }
    }

    /// Resolve `requested`, keeping every root that resolves.
    ///
    /// A root that fails contributes nothing to the set, not even the part
    /// of its closure discovered before the failure.
    pub fn resolve_partial<S: AsRef<str>>(&self, requested: &[S]) -> Resolution {
        let requested: BTreeSet<&str> = requested.iter().map(AsRef::as_ref).collect();
        let (mut roots, covered): (Vec<&str>, Vec<&str>) = requested
            .iter()
            .copied()
            .partition(|root| !self.is_covered(root, &requested));
        roots.extend(covered);

        let mut components: IndexSet<String> = IndexSet::new();
        let mut lib: IndexSet<String> = IndexSet::new();
        let mut errors = Vec::new();

        for root in roots {
            let mut walk = Walk {
                registry: self.registry,
                known_components: &components,
                known_lib: &lib,
                components: IndexSet::new(),
                lib: IndexSet::new(),
                component_path: Vec::new(),
                lib_path: Vec::new(),
            };

            match walk.visit_component(root) {
                Ok(()) => {
                    let (found_components, found_lib) = (walk.components, walk.lib);
                    components.extend(found_components);
                    lib.extend(found_lib);
                }
                Err(err) => {
                    tracing::debug!("Failed to resolve '{}': {}", root, err);
                    errors.push(err);
                }
            }
        }

        let packages = self.collect_packages(&components, &lib);

        Resolution {
            set: ResolvedInstallSet {
                components: components.into_iter().collect(),
                lib: lib.into_iter().collect(),
                packages,
            },
            errors,
        }
    }

    /// Whether `root` is a dependency of another requested root that it does
    /// not itself depend on
    fn is_covered(&self, root: &str, requested: &BTreeSet<&str>) -> bool {
        requested.iter().any(|other| {
            *other != root
                && self.depends_on(other, root)
                && !self.depends_on(root, other)
        })
    }

    /// Whether `to` is reachable from `from` over registry dependencies.
    /// Unknown names are treated as leaves.
    fn depends_on(&self, from: &str, to: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![from];
        while let Some(name) = stack.pop() {
            let Some(entry) = self.registry.component(name) else {
                continue;
            };
            for dep in &entry.registry_dependencies {
                if dep == to {
                    return true;
                }
                if seen.insert(dep.as_str()) {
                    stack.push(dep.as_str());
                }
            }
        }
        false
    }

    /// Transitive lib closure of the given lib modules, in discovery order
    pub fn resolve_lib<S: AsRef<str>>(&self, modules: &[S]) -> Result<Vec<String>, ResolveError> {
        let empty_components = IndexSet::new();
        let empty_lib = IndexSet::new();
        let mut walk = Walk {
            registry: self.registry,
            known_components: &empty_components,
            known_lib: &empty_lib,
            components: IndexSet::new(),
            lib: IndexSet::new(),
            component_path: Vec::new(),
            lib_path: Vec::new(),
        };
        for module in modules {
            walk.visit_lib(module.as_ref(), "<request>")?;
        }
        Ok(walk.lib.into_iter().collect())
    }

    fn collect_packages(&self, components: &IndexSet<String>, lib: &IndexSet<String>) -> Vec<String> {
        let mut packages = IndexSet::new();
        for name in components {
            if let Some(entry) = self.registry.component(name) {
                packages.extend(entry.dependencies.iter().cloned());
            }
        }
        for name in lib {
            if let Some(module) = self.registry.lib_module(name) {
                packages.extend(module.dependencies.iter().cloned());
            }
        }
        packages.into_iter().collect()
    }
}

/// Depth-first traversal state for a single root
struct Walk<'r, 'a> {
    registry: &'r Registry,
    /// Already resolved by earlier roots
    known_components: &'a IndexSet<String>,
    known_lib: &'a IndexSet<String>,
    components: IndexSet<String>,
    lib: IndexSet<String>,
    /// Nodes on the active path, for cycle detection
    component_path: Vec<String>,
    lib_path: Vec<String>,
}

impl Walk<'_, '_> {
    fn visit_component(&mut self, name: &str) -> Result<(), ResolveError> {
        if let Some(start) = self.component_path.iter().position(|n| n == name) {
            let mut path = self.component_path[start..].to_vec();
            path.push(name.to_string());
            return Err(ResolveError::CyclicDependency { path });
        }
        if self.known_components.contains(name) || self.components.contains(name) {
            return Ok(());
        }

        let registry = self.registry;
        let entry = registry.find_component(name)?;
        self.components.insert(entry.name.clone());
        self.component_path.push(entry.name.clone());

        for module in &entry.internal_dependencies {
            self.visit_lib(module, &entry.name)?;
        }
        for dep in &entry.registry_dependencies {
            self.visit_component(dep)?;
        }

        self.component_path.pop();
        Ok(())
    }

    fn visit_lib(&mut self, name: &str, required_by: &str) -> Result<(), ResolveError> {
        if let Some(start) = self.lib_path.iter().position(|n| n == name) {
            let mut path = self.lib_path[start..].to_vec();
            path.push(name.to_string());
            return Err(ResolveError::CyclicDependency { path });
        }
        if self.known_lib.contains(name) || self.lib.contains(name) {
            return Ok(());
        }

        let registry = self.registry;
        let module = registry
            .lib_module(name)
            .ok_or_else(|| ResolveError::LibModuleNotFound {
                name: name.to_string(),
                required_by: required_by.to_string(),
            })?;
        self.lib.insert(module.name.clone());
        self.lib_path.push(module.name.clone());

        for dep in &module.internal_dependencies {
            self.visit_lib(dep, &module.name)?;
        }

        self.lib_path.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn vform_registry() -> Registry {
        registry(
            vec![
                component("vform", &["types", "hooks"], &["input", "textarea"]),
                component("input", &["types"], &[]),
                component("textarea", &["types"], &[]),
                component("toggle", &[], &[]),
            ],
            vec![lib("types", &[]), lib("hooks", &["types"])],
        )
    }

    #[test]
    fn test_vform_example() {
        let registry = vform_registry();
        let set = Resolver::new(&registry).resolve(&["vform"]).unwrap();
        assert_eq!(set.components, vec!["vform", "input", "textarea"]);
        assert_eq!(set.lib, vec!["types", "hooks"]);
        assert_eq!(set.packages, vec!["pkg-vform", "pkg-input", "pkg-textarea"]);
    }

    #[test]
    fn test_closure_excludes_unreachable_components() {
        let registry = vform_registry();
        let set = Resolver::new(&registry).resolve(&["input"]).unwrap();
        assert_eq!(set.components, vec!["input"]);
        assert_eq!(set.lib, vec!["types"]);
        assert!(!set.components.contains(&"toggle".to_string()));
    }

    #[test]
    fn test_transitive_lib_dependencies() {
        let registry = registry(
            vec![component("select-m2o", &["hooks"], &[])],
            vec![
                lib("types", &[]),
                lib("utils", &["types"]),
                lib("services", &["types", "utils"]),
                lib("hooks", &["services"]),
            ],
        );
        let set = Resolver::new(&registry).resolve(&["select-m2o"]).unwrap();
        assert_eq!(set.lib, vec!["hooks", "services", "types", "utils"]);
    }

    #[test]
    fn test_permutations_resolve_identically() {
        let registry = vform_registry();
        let resolver = Resolver::new(&registry);
        let a = resolver.resolve(&["toggle", "vform", "input"]).unwrap();
        let b = resolver.resolve(&["input", "toggle", "vform"]).unwrap();
        let c = resolver.resolve(&["vform", "input", "toggle", "input"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_unknown_component_has_suggestion() {
        let registry = vform_registry();
        let err = Resolver::new(&registry).resolve(&["textare"]).unwrap_err();
        assert_eq!(
            err,
            ResolveError::ComponentNotFound {
                name: "textare".to_string(),
                suggestion: Some("textarea".to_string()),
            }
        );
    }

    #[test]
    fn test_partial_resolution_keeps_valid_roots() {
        let registry = vform_registry();
        let resolution =
            Resolver::new(&registry).resolve_partial(&["input", "nope", "textarea", "toggle", "vform"]);
        assert_eq!(resolution.errors.len(), 1);
        assert!(matches!(
            &resolution.errors[0],
            ResolveError::ComponentNotFound { name, .. } if name == "nope"
        ));
        assert_eq!(
            resolution.set.components,
            vec!["toggle", "vform", "input", "textarea"]
        );
    }

    #[test]
    fn test_requested_dependency_is_listed_after_its_dependent() {
        let registry = vform_registry();
        let resolver = Resolver::new(&registry);
        let set = resolver.resolve(&["vform", "input"]).unwrap();
        assert_eq!(set.components, vec!["vform", "input", "textarea"]);
        assert_eq!(set, resolver.resolve(&["input", "vform"]).unwrap());
    }

    #[test]
    fn test_requested_dependency_survives_failed_dependent() {
        let registry = registry(
            vec![
                component("broken", &[], &["input", "missing"]),
                component("input", &[], &[]),
            ],
            vec![],
        );
        let resolution = Resolver::new(&registry).resolve_partial(&["broken", "input"]);
        assert_eq!(resolution.errors.len(), 1);
        assert_eq!(resolution.set.components, vec!["input"]);
    }

    #[test]
    fn test_failed_root_contributes_nothing() {
        let registry = registry(
            vec![
                component("broken", &["types"], &["ok", "missing"]),
                component("ok", &[], &[]),
            ],
            vec![lib("types", &[])],
        );
        let resolution = Resolver::new(&registry).resolve_partial(&["broken"]);
        assert_eq!(resolution.errors.len(), 1);
        assert!(resolution.set.is_empty());
    }

    #[test]
    fn test_component_cycle_is_detected() {
        let registry = registry(
            vec![
                component("a", &[], &["b"]),
                component("b", &[], &["c"]),
                component("c", &[], &["a"]),
            ],
            vec![],
        );
        let err = Resolver::new(&registry).resolve(&["a"]).unwrap_err();
        assert_eq!(
            err,
            ResolveError::CyclicDependency {
                path: vec!["a".into(), "b".into(), "c".into(), "a".into()]
            }
        );
    }

    #[test]
    fn test_lib_cycle_is_detected() {
        let registry = registry(
            vec![component("a", &["x"], &[])],
            vec![lib("x", &["y"]), lib("y", &["x"])],
        );
        let err = Resolver::new(&registry).resolve(&["a"]).unwrap_err();
        assert!(matches!(err, ResolveError::CyclicDependency { .. }));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let registry = registry(
            vec![
                component("top", &[], &["left", "right"]),
                component("left", &[], &["bottom"]),
                component("right", &[], &["bottom"]),
                component("bottom", &[], &[]),
            ],
            vec![],
        );
        let set = Resolver::new(&registry).resolve(&["top"]).unwrap();
        assert_eq!(set.components, vec!["top", "left", "bottom", "right"]);
    }

    #[test]
    fn test_missing_lib_module() {
        let registry = registry(vec![component("a", &["ghost"], &[])], vec![]);
        let err = Resolver::new(&registry).resolve(&["a"]).unwrap_err();
        assert_eq!(
            err,
            ResolveError::LibModuleNotFound {
                name: "ghost".to_string(),
                required_by: "a".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_lib_closure() {
        let registry = vform_registry();
        let lib = Resolver::new(&registry).resolve_lib(&["hooks"]).unwrap();
        assert_eq!(lib, vec!["hooks", "types"]);
    }
}
