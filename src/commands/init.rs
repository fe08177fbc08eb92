use super::Context;
use crate::manifest::{MANIFEST_FILE, Manifest};
use anyhow::Result;
use std::process::ExitCode;

pub fn run(ctx: &Context, force: bool) -> Result<ExitCode> {
    let path = Manifest::path(&ctx.project_root);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists in {}, use --force to overwrite",
            MANIFEST_FILE,
            ctx.project_root.display()
        );
    }

    let manifest = Manifest::with_aliases(&ctx.registry, ctx.default_aliases()?);
    manifest.save(&ctx.project_root)?;

    println!("✅ Created {}", path.display());
    println!("\nImport aliases:");
    for (from, to) in manifest.aliases.iter() {
        println!("  {} → {}", from, to);
    }
    println!("\nNext steps:");
    println!("  {} bootstrap        # Copy the shared lib modules", crate::BIN_NAME);
    println!("  {} add <component>  # Copy a component", crate::BIN_NAME);

    Ok(ExitCode::SUCCESS)
}
