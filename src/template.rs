//! `{{key}}` interpolation for the embedded code templates
//!
//! Deliberately narrow: values come from a flat key → value map and are
//! substituted in a single pass. There are no expressions, filters or loops;
//! callers build repeated sections in Rust and pass them in as values.

use include_dir::{Dir, include_dir};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use thiserror::Error;

static TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template '{0}' not found")]
    NotFound(String),

    #[error("template '{0}' is not valid UTF-8")]
    NotUtf8(String),

    #[error("missing template values: {}", .0.iter().cloned().collect::<Vec<_>>().join(", "))]
    MissingKeys(BTreeSet<String>),
}

pub type Values = BTreeMap<String, String>;

/// Substitute every `{{key}}` in `template` from `values`
pub fn render(template: &str, values: &Values) -> Result<String, TemplateError> {
    let mut missing = BTreeSet::new();
    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        let key = &caps[1];
        match values.get(key) {
            Some(value) => value.clone(),
            None => {
                missing.insert(key.to_string());
                caps[0].to_string()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(TemplateError::MissingKeys(missing))
    }
}

/// Source of an embedded template, e.g. `form.tsx.tmpl`
pub fn embedded(name: &str) -> Result<&'static str, TemplateError> {
    TEMPLATES
        .get_file(name)
        .ok_or_else(|| TemplateError::NotFound(name.to_string()))?
        .contents_utf8()
        .ok_or_else(|| TemplateError::NotUtf8(name.to_string()))
}

/// Render an embedded template
pub fn render_embedded(name: &str, values: &Values) -> Result<String, TemplateError> {
    render(embedded(name)?, values)
}

/// Build a [`Values`] map from pairs
pub fn values<const N: usize>(pairs: [(&str, String); N]) -> Values {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes() {
        let out = render(
            "Hello {{name}}, {{ greeting }}!",
            &values([("name", "Ada".into()), ("greeting", "welcome".into())]),
        )
        .unwrap();
        assert_eq!(out, "Hello Ada, welcome!");
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let out = render("{{a}}", &values([("a", "{{b}}".into())])).unwrap();
        assert_eq!(out, "{{b}}");
    }

    #[test]
    fn test_missing_keys_are_reported() {
        let err = render("{{a}} {{b}} {{a}}", &values([("c", String::new())])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingKeys(BTreeSet::from(["a".to_string(), "b".to_string()]))
        );
        assert_eq!(err.to_string(), "missing template values: a, b");
    }

    #[test]
    fn test_non_identifiers_are_left_alone() {
        let text = "const style = {{ color: 'red' }};";
        assert_eq!(render(text, &Values::new()).unwrap(), text);
    }

    #[test]
    fn test_every_embedded_template_renders() {
        for name in [
            "form.tsx.tmpl",
            "interface.ts.tmpl",
            "usage.tsx.tmpl",
            "rbac.ts.tmpl",
            "copy-own.md",
        ] {
            let source = embedded(name).unwrap();
            let filled: Values = PLACEHOLDER
                .captures_iter(source)
                .map(|caps| (caps[1].to_string(), "x".to_string()))
                .collect();
            let out = render(source, &filled).unwrap();
            assert!(!out.contains("{{"), "{name} left a placeholder");
        }
    }

    #[test]
    fn test_embedded_templates_exist() {
        for name in [
            "form.tsx.tmpl",
            "interface.ts.tmpl",
            "usage.tsx.tmpl",
            "rbac.ts.tmpl",
            "copy-own.md",
        ] {
            assert!(embedded(name).is_ok(), "missing template {name}");
        }
        assert!(matches!(
            embedded("nope.tmpl"),
            Err(TemplateError::NotFound(_))
        ));
    }
}
