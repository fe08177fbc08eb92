//! Common test utilities and fixtures
//!
//! A small registry document written next to its source tree, and helpers
//! for running the binary against it with an isolated config directory.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REGISTRY: &str = r#"{
  "version": "1.2.0",
  "name": "fixture",
  "meta": {
    "scope": "@compkit",
    "libAlias": "@/lib/compkit",
    "componentsAlias": "@/components/ui"
  },
  "lib": {
    "types": {
      "name": "types",
      "files": [{ "source": "lib/types/index.ts", "target": "src/lib/compkit/types/index.ts" }],
      "internalDependencies": []
    },
    "hooks": {
      "name": "hooks",
      "files": [{ "source": "lib/hooks/index.ts", "target": "src/lib/compkit/hooks/index.ts" }],
      "dependencies": ["swr"],
      "internalDependencies": ["types"]
    }
  },
  "components": [
    {
      "name": "input",
      "title": "Input",
      "category": "input",
      "description": "Single line text input",
      "files": [{ "source": "ui/input.tsx", "target": "src/components/ui/input.tsx" }],
      "dependencies": ["clsx"],
      "internalDependencies": ["types"]
    },
    {
      "name": "textarea",
      "title": "Textarea",
      "category": "input",
      "files": [{ "source": "ui/textarea.tsx", "target": "src/components/ui/textarea.tsx" }],
      "internalDependencies": ["types"]
    },
    {
      "name": "toggle",
      "title": "Toggle",
      "category": "input",
      "files": [{ "source": "ui/toggle.tsx", "target": "src/components/ui/toggle.tsx" }]
    },
    {
      "name": "select-m2o",
      "title": "Many to One",
      "category": "relational",
      "files": [{ "source": "ui/select-m2o.tsx", "target": "src/components/ui/select-m2o.tsx" }],
      "internalDependencies": ["hooks"],
      "registryDependencies": ["input"]
    },
    {
      "name": "vform",
      "title": "Dynamic Form",
      "category": "form",
      "files": [{ "source": "ui/vform.tsx", "target": "src/components/ui/vform.tsx" }],
      "internalDependencies": ["types"],
      "registryDependencies": ["input", "textarea", "toggle"]
    }
  ],
  "categories": [
    { "name": "input", "title": "Inputs" },
    { "name": "relational", "title": "Relational" },
    { "name": "form", "title": "Forms" }
  ]
}
"#;

const SOURCES: &[(&str, &str)] = &[
    ("lib/types/index.ts", "export type Field = { field: string };\n"),
    (
        "lib/hooks/index.ts",
        "import type { Field } from '@compkit/types';\nexport const useFields = (): Field[] => [];\n",
    ),
    (
        "ui/input.tsx",
        "import type { Field } from '@compkit/types';\nexport function Input() { return null; }\n",
    ),
    (
        "ui/textarea.tsx",
        "import type { Field } from '@compkit/types';\nexport function Textarea() { return null; }\n",
    ),
    ("ui/toggle.tsx", "export function Toggle() { return null; }\n"),
    (
        "ui/select-m2o.tsx",
        "import { useFields } from '@compkit/hooks';\nimport { Input } from '@compkit/ui/input';\nexport function SelectM2o() { return null; }\n",
    ),
    (
        "ui/vform.tsx",
        "import { Input } from '@compkit/ui/input';\nimport { Toggle } from '@compkit/ui/toggle';\nexport function VForm() { return null; }\n",
    ),
];

/// Registry source tree, project directory and home directory for one test
pub struct Fixture {
    pub source: TempDir,
    pub project: TempDir,
    pub home: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let source = TempDir::new().expect("Failed to create temp directory");
        fs::write(source.path().join("registry.json"), REGISTRY).unwrap();
        for (rel, content) in SOURCES {
            write(source.path(), rel, content);
        }

        Self {
            source,
            project: TempDir::new().expect("Failed to create temp directory"),
            home: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn registry_path(&self) -> PathBuf {
        self.source.path().join("registry.json")
    }

    /// The binary pointed at this fixture's registry and project
    pub fn cmd(&self) -> Command {
        let mut cmd = bare_cmd(&self.home);
        cmd.arg("--registry")
            .arg(self.registry_path())
            .arg("--cwd")
            .arg(self.project.path());
        cmd
    }

    pub fn project_file(&self, rel: &str) -> PathBuf {
        self.project.path().join(rel)
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.project_file(rel)).unwrap()
    }
}

/// The binary with HOME (and so the user config) redirected to `home`
pub fn bare_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("compkit").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("XDG_DATA_HOME", home.path().join(".local/share"))
        .env_remove("COMPKIT_REGISTRY")
        .env_remove("COMPKIT_SOURCE_ROOT")
        .env_remove("RUST_LOG");
    cmd
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
