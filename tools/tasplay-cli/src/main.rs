//! tasplay - headless driver for TAS scripts
//!
//! # Commands
//!
//! - `tasplay check <script>` - Load a script and report diagnostics, length and checksum
//! - `tasplay play <script>` - Play a script, printing the inputs of every frame
//! - `tasplay watch <script>` - Play a script again every time it changes on disk
//! - `tasplay commands` - Print the command list an editor would receive
//! - `tasplay config` - Show or write the playback configuration
//!
//! # Usage
//!
//! ```bash
//! # Find bad lines before a run
//! tasplay check levels/1A.tas
//!
//! # Fast-forward through breakpoints, printing only where playback stops
//! tasplay play levels/1A.tas --fast --quiet
//! ```

mod check;
mod commands;
mod config;
mod host;
mod play;
mod watch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tasplay_core::PlaybackConfig;

/// tasplay - headless driver for TAS scripts
#[derive(Parser)]
#[command(name = "tasplay")]
#[command(about = "Load, check and play TAS scripts")]
#[command(version)]
struct Cli {
    /// Configuration file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a script and report diagnostics, length and checksum
    Check(check::CheckArgs),

    /// Play a script, printing the inputs of every frame
    Play(play::PlayArgs),

    /// Play a script again every time it changes on disk
    Watch(watch::WatchArgs),

    /// Print the command list an editor would receive
    Commands(commands::CommandsArgs),

    /// Show or write the playback configuration
    Config(config::ConfigArgs),
}

fn load_config(path: Option<&PathBuf>) -> Result<PlaybackConfig> {
    let config = match path {
        Some(path) => tasplay_core::config::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => tasplay_core::config::load(),
    };
    for warning in config.validate() {
        tracing::warn!("Config: {}", warning);
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Check(args) => check::execute(args, config),
        Commands::Play(args) => play::execute(args, config),
        Commands::Watch(args) => watch::execute(args, config),
        Commands::Commands(args) => commands::execute(args),
        Commands::Config(args) => config::execute(args, config, cli.config),
    }
}
