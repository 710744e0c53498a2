//! Config command - show or write the playback configuration

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use tasplay_core::PlaybackConfig;
use tasplay_core::config;

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Write the effective configuration back to disk
    #[arg(long)]
    pub write: bool,
}

/// Execute the config command
pub fn execute(args: ConfigArgs, config: PlaybackConfig, path: Option<PathBuf>) -> Result<()> {
    print!("{}", toml::to_string_pretty(&config)?);

    if args.write {
        match &path {
            Some(path) => config::save_to(&config, path)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => config::save(&config).context("Failed to write config")?,
        }
        let written = path.or_else(|| config::config_dir().map(|dir| dir.join("config.toml")));
        if let Some(written) = written {
            tracing::info!("Wrote {}", written.display());
        }
    }
    Ok(())
}
