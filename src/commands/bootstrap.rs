use super::{Context, print_install_hint};
use crate::install::Installer;
use crate::materialize::MaterializeOptions;
use anyhow::Result;
use std::process::ExitCode;

/// Copy every lib module into the project, ahead of any component
pub fn run(ctx: &Context, overwrite: bool) -> Result<ExitCode> {
    let aliases = ctx.default_aliases()?;
    let installer = Installer::new(
        &ctx.registry,
        ctx.source_root()?,
        &ctx.project_root,
        &aliases,
    );

    let outcome = installer.install_lib(MaterializeOptions {
        overwrite,
        dry_run: false,
    })?;

    for err in &outcome.errors {
        eprintln!("✗ {}", err);
    }
    if outcome.initialized {
        println!("Initialized {}", crate::manifest::MANIFEST_FILE);
    }
    println!("Lib modules: {}", outcome.set.lib.join(", "));
    println!("{}", outcome.report);

    if !outcome.is_success() {
        return Ok(ExitCode::FAILURE);
    }

    println!("✅ Bootstrapped {} lib modules", outcome.set.lib.len());
    print_install_hint(ctx, &outcome.set.packages);
    Ok(ExitCode::SUCCESS)
}
