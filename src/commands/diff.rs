use super::Context;
use crate::diff;
use crate::manifest::Manifest;
use crate::materialize::Materializer;
use anyhow::{Context as _, Result};
use std::fs;
use std::io;
use std::process::ExitCode;

/// Compare a component's files in the project with what the registry would write
pub fn run(ctx: &Context, name: &str) -> Result<ExitCode> {
    let entry = ctx.registry.find_component(name)?;
    let aliases = match Manifest::load(&ctx.project_root)? {
        Some(manifest) => manifest.aliases,
        None => ctx.default_aliases()?,
    };
    let materializer =
        Materializer::new(&ctx.registry, ctx.source_root()?, &ctx.project_root, &aliases);

    let mut differing = 0;
    let mut skipped = 0;
    for mapping in &entry.files {
        let compared = materializer
            .render(mapping)
            .and_then(|rendered| Ok((rendered, materializer.target_path(mapping)?)));
        let (rendered, target) = match compared {
            Ok(compared) => compared,
            Err(err) => {
                eprintln!("✗ {}: {}", mapping.target, err);
                skipped += 1;
                continue;
            }
        };
        let installed = match fs::read(&target) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                println!("{}: not in project", mapping.target);
                differing += 1;
                continue;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", target.display()));
            }
        };
        if installed == rendered.bytes {
            continue;
        }

        differing += 1;
        match (
            std::str::from_utf8(&installed),
            std::str::from_utf8(&rendered.bytes),
        ) {
            (Ok(old), Ok(new)) => print!(
                "{}",
                diff::render(
                    &format!("project/{}", mapping.target),
                    &format!("registry/{}", mapping.target),
                    &diff::diff_lines(old, new),
                    3,
                )
            ),
            _ => println!("Binary files differ: {}", mapping.target),
        }
    }

    if differing == 0 && skipped == 0 {
        println!("✅ {} matches the registry", entry.name);
    } else {
        println!(
            "\n{} of {} files differ from the registry",
            differing,
            entry.files.len()
        );
    }
    if skipped > 0 {
        eprintln!("{} files could not be compared", skipped);
    }

    Ok(ExitCode::SUCCESS)
}
