//! Import specifier rewriting
//!
//! Registry sources import each other through a package-style scope
//! (`@compkit/types`, `@compkit/ui/input`). Once copied into a project those
//! imports must point at project-relative aliases instead
//! (`@/lib/compkit/types`, `@/components/ui/input`).
//!
//! Rewriting is a text-level substitution anchored on quoted specifiers in
//! `import`/`export … from`/`import()`/`require()` positions and CSS
//! `@import`. Strings that merely contain the scope are never touched.

use crate::registry::Registry;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

static SPECIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?P<lead>\bfrom\s*|\bimport\s*\(\s*|\bimport\s+|\brequire\s*\(\s*)(?P<open>['"])(?P<spec>[^'"\r\n]*)(?P<close>['"])"#,
    )
    .expect("specifier pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AliasError {
    #[error("alias key cannot be empty")]
    EmptyKey,

    #[error(
        "alias '{key}' → '{target}' would be rewritten again by '{matched_by}'; \
         replacements must not match any alias key"
    )]
    SelfReferential {
        key: String,
        target: String,
        matched_by: String,
    },
}

/// Mapping from package-style import prefix to its project-relative replacement.
///
/// A specifier matches a key when it equals the key or continues it with `/`.
/// Keys ending in `/` match as plain prefixes. The longest matching key wins.
/// Construction rejects tables whose replacements would themselves be
/// matched, so rewriting already-rewritten text is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct AliasTable {
    entries: BTreeMap<String, String>,
}

impl AliasTable {
    pub fn new(entries: BTreeMap<String, String>) -> Result<Self, AliasError> {
        for (key, target) in &entries {
            if key.is_empty() {
                return Err(AliasError::EmptyKey);
            }
            // A key ending in `/` appends an arbitrary remainder to its target
            let extended = if key.ends_with('/') {
                target.clone()
            } else {
                format!("{}/", target.trim_end_matches('/'))
            };
            if let Some(other) = entries
                .keys()
                .find(|other| prefix_matches(other, target) || other.starts_with(&extended))
            {
                return Err(AliasError::SelfReferential {
                    key: key.clone(),
                    target: target.clone(),
                    matched_by: other.clone(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Default table for a registry: one entry per lib module plus one for components
    pub fn for_registry(registry: &Registry) -> Result<Self, AliasError> {
        let meta = &registry.meta;
        let mut entries = BTreeMap::new();
        for name in registry.lib.keys() {
            entries.insert(
                format!("{}/{}", meta.scope, name),
                format!("{}/{}", meta.lib_alias, name),
            );
        }
        entries.insert(format!("{}/ui", meta.scope), meta.components_alias.clone());
        Self::new(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Longest key matching `specifier`
    pub fn lookup(&self, specifier: &str) -> Option<(&str, &str)> {
        self.entries
            .iter()
            .filter(|(key, _)| prefix_matches(key, specifier))
            .max_by_key(|(key, _)| key.len())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Rewritten form of `specifier`, or `None` when no key matches
    pub fn rewrite_specifier(&self, specifier: &str) -> Option<String> {
        self.lookup(specifier)
            .map(|(key, target)| format!("{}{}", target, &specifier[key.len()..]))
    }
}

impl TryFrom<BTreeMap<String, String>> for AliasTable {
    type Error = AliasError;

    fn try_from(entries: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<AliasTable> for BTreeMap<String, String> {
    fn from(table: AliasTable) -> Self {
        table.entries
    }
}

fn prefix_matches(key: &str, specifier: &str) -> bool {
    if key.ends_with('/') {
        return specifier.starts_with(key);
    }
    match specifier.strip_prefix(key) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// A quoted import specifier found in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier<'t> {
    pub value: &'t str,
    /// 1-based line number
    pub line: usize,
}

/// All import specifiers in `text`, in source order
pub fn specifiers(text: &str) -> Vec<Specifier<'_>> {
    SPECIFIER
        .captures_iter(text)
        .filter(|caps| caps["open"] == caps["close"])
        .filter_map(|caps| caps.name("spec"))
        .map(|spec| Specifier {
            value: spec.as_str(),
            line: text[..spec.start()].matches('\n').count() + 1,
        })
        .collect()
}

/// Result of rewriting a source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub replaced: usize,
}

/// Rewrite and count the specifiers that changed
pub fn rewrite_counted(source: &str, aliases: &AliasTable) -> Rewritten {
    let mut replaced = 0;
    let text = SPECIFIER
        .replace_all(source, |caps: &Captures| {
            let whole = caps[0].to_string();
            if caps["open"] != caps["close"] {
                return whole;
            }
            match aliases.rewrite_specifier(&caps["spec"]) {
                Some(new_spec) => {
                    replaced += 1;
                    format!(
                        "{}{}{}{}",
                        &caps["lead"], &caps["open"], new_spec, &caps["close"]
                    )
                }
                None => whole,
            }
        })
        .into_owned();

    Rewritten { text, replaced }
}

/// Rewrite every aliased import specifier in `source`
pub fn rewrite(source: &str, aliases: &AliasTable) -> String {
    rewrite_counted(source, aliases).text
}
