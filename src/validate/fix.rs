//! Applying deterministic remedies

use super::{Remedy, ValidateOptions, ValidationReport, Validator};
use crate::materialize::{
    FileOutcome, FileStatus, MaterializeOptions, Materializer, Owner, content_hash,
};
use crate::registry::FileMapping;
use crate::rewrite;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub struct RewrittenFile {
    /// Relative to the project root
    pub path: String,
    pub replaced: usize,
    pub hash: String,
}

#[derive(Debug, Default)]
pub struct FixReport {
    pub restored: Vec<FileOutcome>,
    pub rewritten: Vec<RewrittenFile>,
    /// Remedies that could not be applied
    pub errors: Vec<String>,
    /// Findings left after re-validating
    pub remaining: ValidationReport,
}

impl FixReport {
    pub fn applied(&self) -> usize {
        self.rewritten.len() + self.restored.iter().filter(|o| !o.is_failure()).count()
    }
}

impl Validator<'_> {
    /// Apply every remedy found by a validation pass, then validate again.
    ///
    /// Restored files go through `materializer`, so they are rewritten with
    /// the same alias table as a fresh install. Existing files are never
    /// overwritten.
    pub fn fix(&self, materializer: &Materializer<'_>, options: ValidateOptions) -> FixReport {
        let before = self.validate(options);

        let mut rewrites: BTreeSet<String> = BTreeSet::new();
        let mut restores: Vec<(Owner, FileMapping)> = Vec::new();
        for finding in before.findings {
            match finding.remedy {
                Some(Remedy::RewriteImports { path }) => {
                    rewrites.insert(path);
                }
                Some(Remedy::RestoreFile { owner, mapping }) => {
                    if !restores.iter().any(|(_, m)| m.target == mapping.target) {
                        restores.push((owner, mapping));
                    }
                }
                None => {}
            }
        }

        let mut report = FixReport::default();

        for path in rewrites {
            match self.rewrite_in_place(&path) {
                Ok(Some(file)) => report.rewritten.push(file),
                Ok(None) => {}
                Err(err) => report.errors.push(format!("{:#}", err)),
            }
        }

        for (owner, mapping) in restores {
            let outcome =
                materializer.materialize_file(owner, &mapping, MaterializeOptions::default());
            if let FileStatus::Failed(err) = &outcome.status {
                report.errors.push(format!("{}: {}", mapping.target, err));
            }
            report.restored.push(outcome);
        }

        tracing::info!(
            "Applied {} remedies ({} errors)",
            report.applied(),
            report.errors.len()
        );

        report.remaining = self.validate(options);
        report
    }

    fn rewrite_in_place(&self, relative: &str) -> Result<Option<RewrittenFile>> {
        let path = self.target_root.join(relative);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let result = rewrite::rewrite_counted(&text, &self.manifest.aliases);
        if result.replaced == 0 {
            return Ok(None);
        }
        write_back(&path, &result.text)?;
        Ok(Some(RewrittenFile {
            path: relative.to_string(),
            replaced: result.replaced,
            hash: content_hash(result.text.as_bytes()),
        }))
    }
}

fn write_back(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::super::CheckKind;
    use super::super::tests::{fixture, write};
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fix_applies_remedies_and_revalidates() {
        let (registry, manifest, dir) = fixture();
        write(
            dir.path(),
            "src/components/ui/editor.tsx",
            "import { a } from '@compkit/hooks';\nimport { b } from '@compkit/unknown';\n",
        );

        let source = TempDir::new().unwrap();
        write(source.path(), "lib/types/index.ts", "export type T = string;\n");
        write(
            source.path(),
            "lib/hooks/index.ts",
            "import type { T } from '@compkit/types';\n",
        );
        write(source.path(), "ui/editor-client.tsx", "export {};\n");

        let materializer =
            Materializer::new(&registry, source.path(), dir.path(), &manifest.aliases);
        let validator = Validator::new(&registry, &manifest, dir.path());
        let report = validator.fix(&materializer, ValidateOptions::default());

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(report.rewritten.len(), 1);
        assert_eq!(report.rewritten[0].replaced, 1);
        assert_eq!(report.restored.len(), 3);
        assert_eq!(report.applied(), 4);

        let editor = fs::read_to_string(dir.path().join("src/components/ui/editor.tsx")).unwrap();
        assert!(editor.contains("from '@/lib/compkit/hooks'"));
        let hooks = fs::read_to_string(dir.path().join("src/lib/compkit/hooks/index.ts")).unwrap();
        assert!(hooks.contains("from '@/lib/compkit/types'"));

        // Left for the user: unknown scope import, stylesheet, API route
        let remaining = &report.remaining;
        assert_eq!(remaining.of_kind(CheckKind::UntransformedImport).count(), 1);
        assert_eq!(remaining.of_kind(CheckKind::MissingCss).count(), 1);
        assert_eq!(remaining.of_kind(CheckKind::MissingApiRoute).count(), 1);
        assert_eq!(remaining.of_kind(CheckKind::MissingLibFile).count(), 0);
        assert_eq!(remaining.fixable(), 0);
    }

    #[test]
    fn test_failed_restore_is_reported() {
        let (registry, manifest, dir) = fixture();
        let source = TempDir::new().unwrap();

        let materializer =
            Materializer::new(&registry, source.path(), dir.path(), &manifest.aliases);
        let validator = Validator::new(&registry, &manifest, dir.path());
        let report = validator.fix(&materializer, ValidateOptions::default());

        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.applied(), 0);
        assert_eq!(report.remaining.of_kind(CheckKind::MissingLibFile).count(), 2);
    }
}
