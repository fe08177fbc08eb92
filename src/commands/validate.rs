use super::{Context, print_json};
use crate::manifest::Manifest;
use crate::materialize::Materializer;
use crate::validate::{ValidateOptions, Validator};
use anyhow::Result;
use std::process::ExitCode;

/// Report findings. Diagnostic only: the exit code does not depend on them.
pub fn run(ctx: &Context, options: ValidateOptions, json: bool) -> Result<ExitCode> {
    let manifest = Manifest::require(&ctx.project_root)?;
    let report = Validator::new(&ctx.registry, &manifest, &ctx.project_root).validate(options);

    if json {
        print_json(&report)?;
        return Ok(ExitCode::SUCCESS);
    }

    if report.is_clean() {
        println!("✅ No problems found ({} files scanned)", report.files_scanned);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", report);
    if report.fixable() > 0 {
        println!(
            "\n{} findings can be fixed with `{} fix`",
            report.fixable(),
            crate::BIN_NAME
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Apply deterministic remedies and record the new file hashes
pub fn fix(ctx: &Context, options: ValidateOptions) -> Result<ExitCode> {
    let mut manifest = Manifest::require(&ctx.project_root)?;

    let report = {
        let materializer = Materializer::new(
            &ctx.registry,
            ctx.source_root()?,
            &ctx.project_root,
            &manifest.aliases,
        );
        Validator::new(&ctx.registry, &manifest, &ctx.project_root).fix(&materializer, options)
    };

    for file in &report.rewritten {
        println!("  ✓ {} ({} imports rewritten)", file.path, file.replaced);
        manifest.refresh_hash(&file.path, &file.hash);
    }
    for outcome in report.restored.iter().filter(|o| !o.is_failure()) {
        println!("  ✓ {} (restored)", outcome.mapping.target);
        manifest.record_file(&ctx.registry, outcome);
    }
    for err in &report.errors {
        eprintln!("  ✗ {}", err);
    }
    if report.applied() > 0 {
        manifest.save(&ctx.project_root)?;
    }

    println!("Applied {} fixes", report.applied());
    if report.remaining.is_clean() {
        println!("✅ No problems remain");
    } else {
        println!("\nRemaining:\n{}", report.remaining);
    }

    Ok(if report.errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
