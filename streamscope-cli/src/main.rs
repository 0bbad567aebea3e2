//! Streamscope CLI - Command-line interface
//!
//! Runs the API server or answers one-off catalog queries as JSON.

mod commands;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use streamscope_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "streamscope")]
#[command(version, about = "Streaming catalog aggregation service")]
struct Cli {
    /// Console log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value_t = CliLogLevel::Info, global = true)]
    log_level: CliLogLevel,

    /// Directory for the per-run trace log
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    commands::handle_command(cli.command).await
}
