use super::{Context, print_json};
use crate::manifest::Manifest;
use crate::materialize::Owner;
use crate::types::Category;
use anyhow::Result;
use serde::Serialize;
use std::process::ExitCode;

#[derive(Serialize)]
struct ListedComponent<'a> {
    name: &'a str,
    title: &'a str,
    category: Category,
    description: &'a str,
    installed: bool,
}

pub fn run(ctx: &Context, category: Option<Category>, json: bool) -> Result<ExitCode> {
    let manifest = Manifest::load(&ctx.project_root)?;
    let installed = |name: &str| {
        manifest
            .as_ref()
            .is_some_and(|m| m.is_installed(&Owner::Component(name.to_string())))
    };

    let components: Vec<ListedComponent> = ctx
        .registry
        .components
        .iter()
        .filter(|c| category.is_none_or(|wanted| c.category == wanted))
        .map(|c| ListedComponent {
            name: &c.name,
            title: &c.title,
            category: c.category,
            description: &c.description,
            installed: installed(&c.name),
        })
        .collect();

    if json {
        print_json(&components)?;
        return Ok(ExitCode::SUCCESS);
    }

    if components.is_empty() {
        println!("No components found.");
        return Ok(ExitCode::SUCCESS);
    }

    let mut categories: Vec<Category> = components.iter().map(|c| c.category).collect();
    categories.sort();
    categories.dedup();

    let width = components.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for category in categories {
        let title = ctx
            .registry
            .category_entry(category)
            .map(|e| e.title.as_str())
            .unwrap_or(category.as_str());
        println!("{}:", title);
        for c in components.iter().filter(|c| c.category == category) {
            println!(
                "  {} {:<width$}  {}",
                if c.installed { "✓" } else { " " },
                c.name,
                c.description,
                width = width
            );
        }
        println!();
    }
    println!(
        "{} components in registry '{}' v{}",
        components.len(),
        ctx.registry.name,
        ctx.registry.version
    );

    Ok(ExitCode::SUCCESS)
}
