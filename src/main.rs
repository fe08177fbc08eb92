// Use modules from the library crate
use compkit::commands::{self, Context, GlobalArgs, add::Selection};
use compkit::materialize::MaterializeOptions;
use compkit::types::Category;
use compkit::validate::ValidateOptions;
use compkit::logging;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "compkit",
    about = "Copy form and table components into your project as source you own",
    version
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Create compkit.json with the default import aliases
    Init {
        /// Replace an existing compkit.json
        #[arg(long)]
        force: bool,
    },

    /// Copy every shared lib module (types, utils, services, hooks)
    Bootstrap {
        /// Replace files that already exist
        #[arg(long)]
        overwrite: bool,
    },

    /// Copy components and everything they depend on
    ///
    /// Imports of the registry scope are rewritten to the project's aliases.
    /// Existing files are skipped unless --overwrite is given. Unknown names
    /// are reported and the rest are still installed; the exit status is
    /// non-zero if anything failed.
    ///
    /// Examples:
    ///   compkit add input select-m2o
    ///   compkit add --category relational
    ///   compkit add vform --dry-run
    Add {
        /// Component names
        #[arg(required_unless_present_any = ["category", "all"])]
        names: Vec<String>,

        /// Add every component in a category
        #[arg(long, short = 'c', conflicts_with_all = ["all", "names"])]
        category: Option<Category>,

        /// Add every component in the registry
        #[arg(long, conflicts_with = "names")]
        all: bool,

        /// Replace files that already exist
        #[arg(long)]
        overwrite: bool,

        /// Report what would be written without touching the project
        #[arg(long)]
        dry_run: bool,
    },

    /// List registry components
    List {
        /// Only list components in this category
        #[arg(long, short = 'c')]
        category: Option<Category>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a component's files and dependencies
    Info {
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a component's dependency tree
    Tree { name: String },

    /// Compare an installed component with the registry version
    Diff { name: String },

    /// Show which installed files were modified or removed
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check installed components for broken imports and missing files
    Validate {
        /// Scan every source file in the project, not only installed ones
        #[arg(long)]
        deep: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Repair what validate reports, where the repair is unambiguous
    Fix {
        /// Scan every source file in the project, not only installed ones
        #[arg(long)]
        deep: bool,
    },

    /// List installed components whose registry source has changed
    Outdated {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Model Context Protocol (MCP) server commands
    Mcp {
        #[command(subcommand)]
        command: McpCommand,
    },
}

#[derive(Parser)]
enum McpCommand {
    /// Serve the registry tools over stdio
    ///
    /// Logs go to stderr and to a daily log file; stdout carries the protocol.
    Serve,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Mcp { .. } => logging::init_server()?,
        _ => logging::init_cli(cli.global.verbose)?,
    }

    let ctx = Context::load(&cli.global)?;

    match cli.command {
        Command::Init { force } => commands::init::run(&ctx, force),
        Command::Bootstrap { overwrite } => commands::bootstrap::run(&ctx, overwrite),
        Command::Add {
            names,
            category,
            all,
            overwrite,
            dry_run,
        } => {
            let selection = match (category, all) {
                (Some(category), _) => Selection::Category(category),
                (None, true) => Selection::All,
                (None, false) => Selection::Names(names),
            };
            commands::add::run(&ctx, selection, MaterializeOptions { overwrite, dry_run })
        }
        Command::List { category, json } => commands::list::run(&ctx, category, json),
        Command::Info { name, json } => commands::info::run(&ctx, &name, json),
        Command::Tree { name } => commands::tree::run(&ctx, &name),
        Command::Diff { name } => commands::diff::run(&ctx, &name),
        Command::Status { json } => commands::status::run(&ctx, json),
        Command::Validate { deep, json } => {
            commands::validate::run(&ctx, ValidateOptions { deep }, json)
        }
        Command::Fix { deep } => commands::validate::fix(&ctx, ValidateOptions { deep }),
        Command::Outdated { json } => commands::outdated::run(&ctx, json),
        Command::Mcp { command } => match command {
            McpCommand::Serve => commands::server::serve(ctx).await,
        },
    }
}
