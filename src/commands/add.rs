use super::{Context, print_install_hint};
use crate::install::Installer;
use crate::materialize::MaterializeOptions;
use crate::types::Category;
use anyhow::Result;
use std::process::ExitCode;

/// Which components `add` was asked for
#[derive(Debug, Clone)]
pub enum Selection {
    Names(Vec<String>),
    Category(Category),
    All,
}

impl Selection {
    fn names(&self, ctx: &Context) -> Vec<String> {
        match self {
            Selection::Names(names) => names.clone(),
            Selection::Category(category) => ctx
                .registry
                .components_in(*category)
                .map(|c| c.name.clone())
                .collect(),
            Selection::All => ctx.registry.components.iter().map(|c| c.name.clone()).collect(),
        }
    }
}

pub fn run(ctx: &Context, selection: Selection, options: MaterializeOptions) -> Result<ExitCode> {
    let names = selection.names(ctx);
    if names.is_empty() {
        anyhow::bail!("no components selected");
    }

    let aliases = ctx.default_aliases()?;
    let installer = Installer::new(
        &ctx.registry,
        ctx.source_root()?,
        &ctx.project_root,
        &aliases,
    );
    let outcome = installer.install(&names, options)?;

    for err in &outcome.errors {
        eprintln!("✗ {}", err);
    }
    if outcome.initialized && !options.dry_run {
        println!("Initialized {}", crate::manifest::MANIFEST_FILE);
    }

    if !outcome.set.is_empty() {
        println!(
            "{} {} components and {} lib modules into {}",
            if options.dry_run { "Would copy" } else { "Copying" },
            outcome.set.components.len(),
            outcome.set.lib.len(),
            ctx.project_root.display()
        );
        println!("{}", outcome.report);
    }

    let completed = outcome.report.completed_owners();
    if !completed.is_empty() && !options.dry_run {
        let names: Vec<String> = completed.iter().map(ToString::to_string).collect();
        println!("✅ Added {}", names.join(", "));
    }
    print_install_hint(ctx, &outcome.set.packages);

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
