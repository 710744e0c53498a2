//! Check command - load a script and report on it

use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;

use tasplay_core::{CommandRegistry, PlaybackConfig, ScriptParser, checksum};

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// Root script to load
    pub script: PathBuf,

    /// Fail if any line was skipped
    #[arg(long)]
    pub strict: bool,

    /// List every file the script reads
    #[arg(long)]
    pub files: bool,
}

/// Execute the check command
pub fn execute(args: CheckArgs, config: PlaybackConfig) -> Result<()> {
    let registry = CommandRegistry::with_builtins();
    let timeline = ScriptParser::new(&registry, &args.script)
        .with_default_speed(config.fast_forward_speed())
        .parse()
        .with_context(|| format!("Failed to load {}", args.script.display()))?;

    for diagnostic in timeline.diagnostics() {
        eprintln!("warning: {diagnostic}");
    }

    println!("Script:     {}", timeline.root().display());
    println!("Lines:      {}", timeline.inputs().len());
    println!("Frames:     {}", timeline.total_frames());
    println!("Commands:   {}", timeline.commands().count());
    println!("Markers:    {}", timeline.fast_forwards().len());
    println!("Checksum:   {:016x}", checksum::checksum(&timeline));
    if timeline.enforces_legal() {
        println!("Restricted: yes (EnforceLegal)");
    }

    if args.files {
        println!();
        for file in timeline.used_files() {
            println!("  {}", file.display());
        }
    }

    let skipped = timeline.diagnostics().len();
    if args.strict && skipped > 0 {
        bail!("{skipped} line(s) skipped");
    }
    Ok(())
}
