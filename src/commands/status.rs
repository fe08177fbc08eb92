use super::{Context, print_json};
use crate::manifest::{Manifest, RegistryRef};
use crate::materialize::{Owner, content_hash};
use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Unchanged,
    Modified,
    Missing,
}

#[derive(Debug, Serialize)]
pub struct TrackedFile {
    pub owner: Owner,
    pub target: String,
    pub state: FileState,
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    registry: &'a RegistryRef,
    files: &'a [TrackedFile],
}

/// Compare every tracked file with the hash recorded when it was written
pub fn collect(manifest: &Manifest, project_root: &Path) -> Vec<TrackedFile> {
    manifest
        .files()
        .map(|(owner, file)| {
            let state = match fs::read(project_root.join(&file.target)) {
                Ok(bytes) if content_hash(&bytes) == file.hash => FileState::Unchanged,
                Ok(_) => FileState::Modified,
                Err(_) => FileState::Missing,
            };
            TrackedFile {
                owner,
                target: file.target.clone(),
                state,
            }
        })
        .collect()
}

pub fn run(ctx: &Context, json: bool) -> Result<ExitCode> {
    let manifest = Manifest::require(&ctx.project_root)?;
    let files = collect(&manifest, &ctx.project_root);

    if json {
        print_json(&StatusOutput {
            registry: &manifest.registry,
            files: &files,
        })?;
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "Registry: {} v{}",
        manifest.registry.name, manifest.registry.version
    );
    println!(
        "Installed: {} components, {} lib modules\n",
        manifest.components.len(),
        manifest.lib.len()
    );

    let mut current: Option<&Owner> = None;
    for file in &files {
        if current != Some(&file.owner) {
            println!("{}", file.owner);
            current = Some(&file.owner);
        }
        let mark = match file.state {
            FileState::Unchanged => "  ",
            FileState::Modified => "M ",
            FileState::Missing => "! ",
        };
        println!("  {}{}", mark, file.target);
    }

    let count = |state| files.iter().filter(|f| f.state == state).count();
    println!(
        "\n{} unchanged, {} modified, {} missing",
        count(FileState::Unchanged),
        count(FileState::Modified),
        count(FileState::Missing)
    );

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{InstalledFile, InstalledUnit};
    use crate::registry::Registry;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_collect_states() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("same.ts"), "a").unwrap();
        fs::write(dir.path().join("edited.ts"), "edited").unwrap();

        let registry = Registry::embedded().unwrap();
        let mut manifest = Manifest::new(&registry).unwrap();
        let file = |target: &str| InstalledFile {
            source: String::new(),
            target: target.to_string(),
            source_hash: String::new(),
            hash: content_hash(b"a"),
        };
        manifest.components.insert(
            "input".to_string(),
            InstalledUnit {
                version: registry.version.clone(),
                installed_at: Utc::now(),
                files: vec![file("same.ts"), file("edited.ts"), file("gone.ts")],
            },
        );

        let states: Vec<FileState> = collect(&manifest, dir.path())
            .into_iter()
            .map(|f| f.state)
            .collect();
        assert_eq!(
            states,
            vec![FileState::Unchanged, FileState::Modified, FileState::Missing]
        );
    }
}
