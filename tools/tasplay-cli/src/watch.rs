//! Watch command - replay a script whenever it changes
//!
//! Plays the script to its end, then waits for the file watcher to flag an
//! edit and plays it again from the start. `RecordCount` lines are bumped in
//! place when an edit changes playback.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tasplay_core::command::builtin::apply_line_updates;
use tasplay_core::{CommandRegistry, InputController, PlaybackConfig};

use crate::host::ConsoleHost;
use crate::play::{report_diagnostics, run_to_end};

/// How often to check for edits while idle
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Arguments for the watch command
#[derive(Args)]
pub struct WatchArgs {
    /// Root script to play
    pub script: PathBuf,

    /// Print every frame instead of only breakpoints
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip commands that aren't legal in restricted mode
    #[arg(long)]
    pub restricted: bool,
}

/// Execute the watch command
pub fn execute(args: WatchArgs, mut config: PlaybackConfig) -> Result<()> {
    config.watch_files = true;
    let restricted = args.restricted || config.restricted_mode;

    let mut controller = InputController::new(Arc::new(CommandRegistry::with_builtins()), config);
    controller.set_file_path(&args.script);
    let mut host = ConsoleHost::new(args.verbose, restricted);

    tracing::info!("Watching {} (Ctrl+C to exit)", args.script.display());

    let mut played_once = false;
    loop {
        match controller.start() {
            Ok(()) => {
                played_once = true;
                report_diagnostics(&controller);
                if let Err(e) = run_to_end(&mut controller, &mut host, true, None) {
                    tracing::error!("{}", e);
                }
                host.println(format_args!(
                    "== {} frames, checksum {:016x}",
                    controller.current_tick(),
                    controller.checksum()
                ));
            }
            // Nothing is watched until a load succeeds
            Err(e) if !played_once => return Err(e.into()),
            Err(e) => tracing::error!("{}", e),
        }

        let updates = controller.take_line_updates();
        if !updates.is_empty() {
            if let Err(e) = apply_line_updates(&updates) {
                tracing::warn!("Failed to update record count: {}", e);
            }
            // Our own write shouldn't trigger another run
            std::thread::sleep(controller.config().watch_debounce() * 2);
            controller.reload_flag().take();
        }

        while !controller.needs_reload() {
            std::thread::sleep(POLL_INTERVAL);
        }
        tracing::info!("Script changed, replaying");
    }
}
