// src/main.rs

mod cli;
mod commands;

use anyhow::{Result, anyhow};
use clap::Parser;
use cli::{Cli, Commands};
use cooker::content::Platform;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let platform = Platform::from_str(&cli.platform).map_err(|_| anyhow!("Unknown platform: {}", cli.platform))?;
    let config = cli.config.as_deref();

    match &cli.command {
        Commands::Cook(args) => commands::cmd_cook(config, platform, args),
        Commands::Status { file_type } => commands::cmd_status(config, platform, file_type.as_deref()),
    }
}
