//! Play command - run a script against the console host

use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use tasplay_core::{CommandRegistry, InputController, PlaybackConfig, TickResult};

use crate::host::ConsoleHost;

/// Arguments for the play command
#[derive(Args)]
pub struct PlayArgs {
    /// Root script to play
    pub script: PathBuf,

    /// Use fast-forward speeds instead of playing one frame per update
    #[arg(long)]
    pub fast: bool,

    /// Don't print every frame
    #[arg(short, long)]
    pub quiet: bool,

    /// Skip commands that aren't legal in restricted mode
    #[arg(long)]
    pub restricted: bool,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u32>,
}

/// Execute the play command
pub fn execute(args: PlayArgs, mut config: PlaybackConfig) -> Result<()> {
    // One-shot runs don't follow edits
    config.watch_files = false;
    let restricted = args.restricted || config.restricted_mode;

    let mut controller = InputController::new(Arc::new(CommandRegistry::with_builtins()), config);
    controller.set_file_path(&args.script);
    controller.start()?;
    report_diagnostics(&controller);

    let mut host = ConsoleHost::new(!args.quiet, restricted);
    run_to_end(&mut controller, &mut host, args.fast, args.frames)?;

    host.println(format_args!(
        "Played {} of {} frames, checksum {:016x}",
        controller.current_tick(),
        controller.timeline().total_frames(),
        controller.checksum()
    ));
    Ok(())
}

pub(crate) fn report_diagnostics(controller: &InputController) {
    for diagnostic in controller.timeline().diagnostics() {
        eprintln!("warning: {diagnostic}");
    }
}

/// Play until the script ends, the frame limit is hit, or the run aborts
pub(crate) fn run_to_end(
    controller: &mut InputController,
    host: &mut ConsoleHost,
    fast: bool,
    limit: Option<u32>,
) -> Result<()> {
    loop {
        if limit.is_some_and(|limit| controller.current_tick() >= limit) {
            return Ok(());
        }

        if fast {
            let outcome = controller.update(host);
            if let Some(breakpoint) = outcome.breakpoint {
                let kind = if breakpoint.save_state { "save state" } else { "breakpoint" };
                host.println(format_args!("-- {kind} at frame {}", breakpoint.frame));
            }
            if outcome.finished {
                return Ok(());
            }
            if outcome.frames > 0 || controller.is_running() {
                continue;
            }
        } else {
            match controller.advance_frame(host) {
                TickResult::Played(_) | TickResult::Waiting => continue,
                TickResult::Finished => return Ok(()),
                TickResult::Inactive => {}
            }
        }

        match controller.abort_reason() {
            Some(reason) => bail!("{reason}"),
            None => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_to_end() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("main.tas");
        std::fs::write(&script, "10,R\n***\nConsole, hi\n10,L\n").unwrap();

        let config = PlaybackConfig {
            watch_files: false,
            ..Default::default()
        };
        let mut controller = InputController::new(Arc::new(CommandRegistry::with_builtins()), config);
        controller.set_file_path(&script);
        controller.start().unwrap();

        let mut host = ConsoleHost::new(false, false);
        run_to_end(&mut controller, &mut host, false, Some(5)).unwrap();
        assert_eq!(controller.current_tick(), 5);

        run_to_end(&mut controller, &mut host, true, None).unwrap();
        assert_eq!(controller.current_tick(), 20);
        assert_eq!(host.applied, 20);
    }

    #[test]
    fn test_run_to_end_reports_abort() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("main.tas");
        std::fs::write(&script, "10,R\n").unwrap();

        let config = PlaybackConfig {
            watch_files: false,
            load_retries: 1,
            ..Default::default()
        };
        let mut controller = InputController::new(Arc::new(CommandRegistry::with_builtins()), config);
        controller.set_file_path(&script);
        controller.start().unwrap();

        std::fs::remove_file(&script).unwrap();
        controller.reload_flag().set();
        let mut host = ConsoleHost::new(false, false);
        let err = run_to_end(&mut controller, &mut host, false, None).unwrap_err();
        assert!(err.to_string().starts_with("run aborted"));
    }
}
