use super::{Context, print_json};
use crate::registry::{ComponentEntry, ResolvedInstallSet, Resolver};
use anyhow::Result;
use serde::Serialize;
use std::process::ExitCode;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ComponentInfo<'a> {
    #[serde(flatten)]
    entry: &'a ComponentEntry,
    resolved: ResolvedInstallSet,
}

pub fn run(ctx: &Context, name: &str, json: bool) -> Result<ExitCode> {
    let entry = ctx.registry.find_component(name)?;
    let resolved = Resolver::new(&ctx.registry).resolve(&[name])?;

    if json {
        print_json(&ComponentInfo { entry, resolved })?;
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} ({})", entry.title, entry.name);
    println!("Category: {}", entry.category);
    if !entry.description.is_empty() {
        println!("\n{}", entry.description);
    }

    println!("\nFiles:");
    for file in &entry.files {
        println!("  {} → {}", file.source, file.target);
    }

    print_list("Packages", &entry.dependencies);
    print_list("Lib modules", &entry.internal_dependencies);
    print_list("Components", &entry.registry_dependencies);
    print_list("Stylesheets", &entry.css);
    if let Some(wrapper) = &entry.ssr_wrapper {
        print_list("Client-only wrapper", std::slice::from_ref(wrapper));
    }
    print_list("API routes", &entry.api_routes);

    println!(
        "\nInstalling adds {} components, {} lib modules and {} packages.",
        resolved.components.len(),
        resolved.lib.len(),
        resolved.packages.len()
    );
    println!("  {} add {}", crate::BIN_NAME, entry.name);

    Ok(ExitCode::SUCCESS)
}

fn print_list(label: &str, items: &[String]) {
    if !items.is_empty() {
        println!("\n{}: {}", label, items.join(", "));
    }
}
