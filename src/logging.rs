use crate::config::paths::get_log_dir;
use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for regular CLI commands
///
/// Logs go to stderr only, so `--json` output on stdout stays clean.
/// `RUST_LOG` overrides the default level.
pub fn init_cli(verbose: bool) -> Result<()> {
    let default = if verbose { "compkit=debug" } else { "compkit=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

/// Initialize logging for the MCP server
///
/// Stdout carries the protocol, so logs are written to stderr and to a
/// daily-rotated file (compkit.log.YYYY-MM-DD) under the platform data dir.
///
/// The log level can be controlled via the RUST_LOG environment variable:
/// - RUST_LOG=debug compkit mcp serve  (verbose logging)
/// - RUST_LOG=info compkit mcp serve   (default level)
pub fn init_server() -> Result<()> {
    let log_dir = get_log_dir()?;

    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "compkit.log");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("compkit=info,rmcp=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::info!("Logging initialized to {}", log_dir.display());

    Ok(())
}
