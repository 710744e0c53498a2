use super::*;
use crate::test_utils::{RecordingHost, write_script};
use tempfile::TempDir;

fn config() -> PlaybackConfig {
    PlaybackConfig {
        watch_files: false,
        load_retries: 1,
        load_retry_delay_ms: 1,
        ..Default::default()
    }
}

fn start(content: &str) -> (TempDir, PathBuf, InputController) {
    let dir = TempDir::new().unwrap();
    let root = write_script(dir.path(), "main.tas", content);
    let mut controller = InputController::new(Arc::new(CommandRegistry::with_builtins()), config());
    controller.set_file_path(&root);
    controller.start().unwrap();
    (dir, root, controller)
}

fn advance(controller: &mut InputController, host: &mut RecordingHost, ticks: u32) {
    for _ in 0..ticks {
        assert!(matches!(controller.advance_frame(host), TickResult::Played(_)));
    }
}

fn applied(host: &RecordingHost) -> Vec<&str> {
    host.applied.iter().map(|text| text.trim()).collect()
}

// =============================================================================
// Playback
// =============================================================================

#[test]
fn test_scenario_reaches_breakpoint() {
    let (_dir, _root, mut controller) = start("30,R\n15,J\n***\n10,R");
    let mut host = RecordingHost::new();
    assert_eq!(controller.timeline().total_frames(), 55);

    advance(&mut controller, &mut host, 45);
    assert_eq!(controller.current_tick(), 45);
    assert_eq!(controller.state(), PlaybackState::FastForwarding);
    assert!(controller.is_break());
    assert_eq!(host.applied.len(), 45);
    assert_eq!(applied(&host)[0], "30,R");
    assert_eq!(applied(&host)[30], "15,J");

    advance(&mut controller, &mut host, 10);
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert_eq!(applied(&host)[54], "10,R");

    assert_eq!(controller.advance_frame(&mut host), TickResult::Finished);
    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert_eq!(controller.advance_frame(&mut host), TickResult::Inactive);
}

#[test]
fn test_update_fast_forwards_without_overshoot() {
    let (_dir, _root, mut controller) = start("100,R\n***10\n10,L\n***\n5,J\n");
    let mut host = RecordingHost::new();

    let outcome = controller.update(&mut host);
    assert_eq!(outcome.frames, 10);
    assert!(outcome.breakpoint.is_none());

    let mut last = outcome;
    for _ in 0..9 {
        last = controller.update(&mut host);
    }
    assert_eq!(controller.current_tick(), 100);
    assert_eq!(last.breakpoint.map(|ff| ff.frame), Some(100));

    // Off the breakpoint one tick at a time, then on to the next one
    assert_eq!(controller.update(&mut host).frames, 1);
    let outcome = controller.update(&mut host);
    assert_eq!(outcome.frames, 9);
    assert_eq!(outcome.breakpoint.map(|ff| ff.frame), Some(110));

    let outcome = controller.update(&mut host);
    assert_eq!(outcome.frames, 1);
    assert_eq!(controller.state(), PlaybackState::Playing);
}

#[test]
fn test_slow_fast_forward() {
    let (_dir, _root, mut controller) = start("10,R\n***0.5\n");
    let mut host = RecordingHost::new();
    assert_eq!(controller.update(&mut host).frames, 0);
    assert_eq!(controller.update(&mut host).frames, 1);
    assert_eq!(controller.update(&mut host).frames, 0);
    assert_eq!(controller.current_tick(), 1);
}

#[test]
fn test_update_plays_single_ticks_without_markers() {
    let (_dir, _root, mut controller) = start("3,R\n");
    let mut host = RecordingHost::new();
    for _ in 0..3 {
        assert_eq!(controller.update(&mut host).frames, 1);
    }
    assert!(controller.update(&mut host).finished);
}

#[test]
fn test_host_loading_pauses() {
    let (_dir, _root, mut controller) = start("3,R\n");
    let mut host = RecordingHost::new();
    host.loading = true;
    assert_eq!(controller.advance_frame(&mut host), TickResult::Waiting);
    assert_eq!(controller.current_tick(), 0);
    assert!(host.applied.is_empty());

    host.loading = false;
    assert_eq!(controller.advance_frame(&mut host), TickResult::Played(0));
}

// =============================================================================
// Runtime commands
// =============================================================================

#[test]
fn test_runtime_commands_fire_at_their_frame() {
    let (_dir, _root, mut controller) = start("Console, a\n2,R\nConsole, b, c\n1,L\n");
    let mut host = RecordingHost::new();

    advance(&mut controller, &mut host, 1);
    assert_eq!(host.console_calls, vec![vec!["a".to_string()]]);

    advance(&mut controller, &mut host, 2);
    assert_eq!(host.console_calls.len(), 2);
    assert_eq!(host.console_calls[1], vec!["b".to_string(), "c".to_string()]);
}

#[test]
fn test_restricted_mode_skips_illegal_commands() {
    let (_dir, _root, mut controller) = start("Console, a\nSafe\nUnsafe\n1,R\n");
    let mut host = RecordingHost::restricted();
    advance(&mut controller, &mut host, 1);
    assert!(host.console_calls.is_empty());
    assert_eq!(host.safe_mode, Some(true));
}

#[test]
fn test_enforce_legal_restricts_run() {
    let (_dir, _root, mut controller) = start("EnforceLegal\nConsole, a\nUnsafe\n1,R\n");
    let mut host = RecordingHost::new();
    advance(&mut controller, &mut host, 1);
    assert!(host.console_calls.is_empty());
    assert_eq!(host.safe_mode, None);
}

#[test]
fn test_failing_command_does_not_stop_playback() {
    let (_dir, _root, mut controller) = start("Console, a\n2,R\n");
    let mut host = RecordingHost {
        console_fails: true,
        ..Default::default()
    };
    advance(&mut controller, &mut host, 2);
    assert_eq!(host.applied.len(), 2);
}

#[test]
fn test_commands_at_end_still_run() {
    let (_dir, _root, mut controller) = start("1,R\nConsole, done\n");
    let mut host = RecordingHost::new();
    advance(&mut controller, &mut host, 1);
    assert_eq!(controller.advance_frame(&mut host), TickResult::Finished);
    assert_eq!(host.console_calls, vec![vec!["done".to_string()]]);
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_start_without_script() {
    let mut controller = InputController::new(Arc::new(CommandRegistry::with_builtins()), config());
    assert!(matches!(controller.start(), Err(LoadError::NoScript)));
    assert_eq!(controller.state(), PlaybackState::Idle);
}

#[test]
fn test_missing_script_aborts_run() {
    let dir = TempDir::new().unwrap();
    let mut controller = InputController::new(
        Arc::new(CommandRegistry::with_builtins()),
        PlaybackConfig {
            load_retries: 3,
            ..config()
        },
    );
    controller.set_file_path(dir.path().join("missing.tas"));

    assert!(matches!(controller.start(), Err(LoadError::NotFound(_))));
    assert_eq!(controller.state(), PlaybackState::Idle);
    assert!(controller.abort_reason().unwrap().starts_with("run aborted"));
    assert_eq!(controller.advance_frame(&mut RecordingHost::new()), TickResult::Inactive);
}

#[test]
fn test_reload_keeps_position() {
    let (dir, _root, mut controller) = start("100,R\n");
    let mut host = RecordingHost::new();
    advance(&mut controller, &mut host, 50);

    write_script(dir.path(), "main.tas", "100,R\n5,L\n");
    controller.reload_flag().set();
    assert_eq!(controller.advance_frame(&mut host), TickResult::Played(50));
    assert_eq!(controller.timeline().total_frames(), 105);
    assert!(!controller.needs_reload());
}

#[test]
fn test_reload_clamps_to_shorter_script() {
    let (dir, _root, mut controller) = start("100,R\n");
    let mut host = RecordingHost::new();
    advance(&mut controller, &mut host, 50);

    write_script(dir.path(), "main.tas", "20,R\n");
    controller.reload_flag().set();
    assert_eq!(controller.advance_frame(&mut host), TickResult::Finished);
    assert_eq!(controller.current_tick(), 20);
}

#[test]
fn test_failed_reload_aborts() {
    let (dir, root, mut controller) = start("10,R\n");
    std::fs::remove_file(&root).unwrap();
    controller.reload_flag().set();
    assert_eq!(controller.advance_frame(&mut RecordingHost::new()), TickResult::Inactive);
    assert_eq!(controller.state(), PlaybackState::Idle);
    assert!(controller.abort_reason().is_some());
    drop(dir);
}

#[test]
fn test_record_count_bumped_on_change() {
    let (dir, root, mut controller) = start("RecordCount: 3\n10,R\n");
    assert!(controller.take_line_updates().is_empty());

    // Only a comment changed: same checksum, no bump
    write_script(dir.path(), "main.tas", "RecordCount: 3\n# note\n10,R\n");
    controller.refresh_inputs(true).unwrap();
    assert!(controller.take_line_updates().is_empty());

    write_script(dir.path(), "main.tas", "RecordCount: 3\n11,R\n");
    controller.refresh_inputs(true).unwrap();
    let updates = controller.take_line_updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].text, "RecordCount: 4");
    assert_eq!(updates[0].line, 0);
    assert_eq!(updates[0].file, std::path::absolute(&root).unwrap());
}

#[test]
fn test_restart_after_edit_bumps_record_count() {
    let (dir, _root, mut controller) = start("RecordCount: 1\n10,R\n");
    write_script(dir.path(), "main.tas", "RecordCount: 1\n12,R\n");
    controller.start().unwrap();
    assert_eq!(controller.take_line_updates()[0].text, "RecordCount: 2");
}

// =============================================================================
// Fast-forward to label
// =============================================================================

#[test]
fn test_fast_forward_to_next_label() {
    let (_dir, _root, mut controller) = start("#a\n10,R\n#b\n10,L\n");
    let mut host = RecordingHost::new();

    controller.fast_forward_to_next_label();
    assert_eq!(controller.current_fast_forward().map(|ff| ff.frame), Some(10));
    assert_eq!(controller.state(), PlaybackState::FastForwarding);

    let outcome = controller.update(&mut host);
    assert_eq!(outcome.frames, 10);
    assert_eq!(outcome.breakpoint.map(|ff| ff.frame), Some(10));

    advance(&mut controller, &mut host, 1);
    assert_eq!(controller.state(), PlaybackState::Playing);

    // The end of the script is the last label
    controller.fast_forward_to_next_label();
    assert_eq!(controller.current_fast_forward().map(|ff| ff.frame), Some(20));
}

#[test]
fn test_fast_forward_to_label_stops_at_marker() {
    let (_dir, _root, mut controller) = start("5,R\n***\n5,R\n#b\n5,L\n");
    controller.fast_forward_to_next_label();
    assert_eq!(controller.current_fast_forward().map(|ff| ff.frame), Some(5));
}

// =============================================================================
// Checksums and resume points
// =============================================================================

#[test]
fn test_checksum_matches_timeline() {
    let (_dir, _root, controller) = start("10,R\n5,J\n");
    assert_eq!(controller.checksum(), checksum::checksum(controller.timeline()));
    assert_eq!(
        controller.checksum_up_to(7),
        checksum::checksum_up_to(controller.timeline(), 7)
    );
    assert_eq!(controller.checksum_up_to(7), controller.checksum_up_to(7));
}

#[test]
fn test_resume_point() {
    let (dir, _root, mut controller) = start("10,R\n10,L\n");
    let mut host = RecordingHost::new();
    advance(&mut controller, &mut host, 5);
    let point = controller.capture_resume_point();
    advance(&mut controller, &mut host, 10);

    assert!(controller.resume(&point));
    assert_eq!(controller.current_tick(), 5);

    // Edits after the resume point don't matter
    write_script(dir.path(), "main.tas", "10,R\n20,L\n");
    controller.refresh_inputs(true).unwrap();
    assert!(controller.can_resume(&point));

    write_script(dir.path(), "main.tas", "4,R\n20,L\n");
    controller.refresh_inputs(true).unwrap();
    assert!(!controller.can_resume(&point));
    assert!(!controller.resume(&point));
}

// =============================================================================
// File watching
// =============================================================================

fn start_watching(content: &str) -> (TempDir, PathBuf, InputController) {
    let dir = TempDir::new().unwrap();
    let root = write_script(dir.path(), "main.tas", content);
    let config = PlaybackConfig {
        watch_files: true,
        watch_debounce_ms: 20,
        ..config()
    };
    let mut controller = InputController::new(Arc::new(CommandRegistry::with_builtins()), config);
    controller.set_file_path(&root);
    controller.start().unwrap();
    (dir, root, controller)
}

/// Poll until the watcher raises the reload flag
fn wait_for_reload(controller: &InputController) -> bool {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        if controller.needs_reload() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    false
}

#[test]
fn test_edit_on_disk_reloads() {
    let (_dir, root, mut controller) = start_watching("10,R\n");
    let mut host = RecordingHost::new();
    advance(&mut controller, &mut host, 3);

    std::fs::write(&root, "20,R\n").unwrap();
    assert!(wait_for_reload(&controller), "edit was not noticed");

    assert_eq!(controller.advance_frame(&mut host), TickResult::Played(3));
    assert_eq!(controller.timeline().total_frames(), 20);
    assert_eq!(applied(&host).len(), 4);
}

#[test]
fn test_replace_by_rename_reloads() {
    let (dir, root, mut controller) = start_watching("10,R\n");
    let mut host = RecordingHost::new();
    advance(&mut controller, &mut host, 2);

    let staged = dir.path().join("main.tmp");
    std::fs::write(&staged, "30,J\n").unwrap();
    std::fs::rename(&staged, &root).unwrap();
    assert!(wait_for_reload(&controller), "rename was not noticed");

    assert_eq!(controller.advance_frame(&mut host), TickResult::Played(2));
    assert_eq!(controller.timeline().total_frames(), 30);
    assert_eq!(applied(&host)[2], "30,J");

    // The new file is watched too
    std::fs::write(&root, "5,R\n").unwrap();
    assert!(wait_for_reload(&controller), "edit after rename was not noticed");
    controller.advance_frame(&mut host);
    assert_eq!(controller.timeline().total_frames(), 5);
}

// =============================================================================
// Editor
// =============================================================================

#[test]
fn test_studio_state() {
    let (_dir, _root, mut controller) = start("5,R\nRepeat, 2\n2,J\nEndRepeat\n***S\n");
    let mut host = RecordingHost::new();

    let state = controller.studio_state();
    assert_eq!(state.current_line, Some(0));
    assert_eq!(state.current_frame_in_input, 0);
    assert_eq!(state.total_frames, 9);
    assert_eq!(state.save_state_lines, vec![4]);
    assert!(state.playback_running);

    advance(&mut controller, &mut host, 6);
    let state = controller.studio_state();
    assert_eq!(state.current_frame, 6);
    assert_eq!(state.current_line, Some(2));
    assert_eq!(state.current_frame_in_input, 1);
    assert_eq!(state.current_line_suffix, "1 [1/2]");
}

#[test]
fn test_command_list() {
    let controller = InputController::new(Arc::new(CommandRegistry::with_builtins()), config());
    let names: Vec<String> = controller.command_list().into_iter().map(|info| info.name).collect();
    assert!(names.contains(&"Read".to_string()));
    assert!(names.contains(&"Repeat".to_string()));
}
