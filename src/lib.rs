pub mod commands;
pub mod config;
pub mod diff;
pub mod install;
pub mod logging;
pub mod manifest;
pub mod materialize;
pub mod mcp;
pub mod registry;
pub mod rewrite;
pub mod template;
pub mod types;
pub mod validate;

pub use manifest::Manifest;
pub use registry::{Registry, ResolveError, ResolvedInstallSet, Resolver};
pub use rewrite::AliasTable;
pub use types::{Category, PackageManager};

/// Name of the binary, used in generated install hints
pub const BIN_NAME: &str = "compkit";
