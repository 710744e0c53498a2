//! Playback cursor
//!
//! [`InputController`] owns the loaded [`ScriptTimeline`] and a tick index
//! into it. The host calls [`InputController::update`] once per game frame
//! (or [`InputController::advance_frame`] for a single tick). Before each
//! tick the controller reloads the script if the watcher flagged a change,
//! runs the runtime commands due at the tick, then hands the tick's inputs
//! to the host.
//!
//! # States
//!
//! ```text
//! Idle ──start──> Loading ──ok──> Playing <──> FastForwarding
//!                    │                 │
//!                    └─fail─> Idle     └──end / stop──> Stopped
//! ```
//!
//! The state is `FastForwarding` whenever a breakpoint lies at or ahead of
//! the cursor. Reaching it is reported by [`InputController::is_break`] and
//! the next tick moves on.

use std::cell::{Cell, OnceCell};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use smallvec::SmallVec;
use tasplay_shared::{CommandInfo, LineUpdate, StudioState};

use crate::checksum;
use crate::command::builtin::update_record_count;
use crate::command::{Command, CommandRegistry, ExecuteTiming, RuntimeContext};
use crate::config::PlaybackConfig;
use crate::error::LoadError;
use crate::host::Host;
use crate::input::{FastForward, ScriptTimeline};
use crate::loader::ScriptParser;
use crate::watcher::{ReloadFlag, ScriptWatcher};

/// Where playback is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    FastForwarding,
    Stopped,
}

/// What one call to [`InputController::advance_frame`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    /// Not running
    Inactive,
    /// The host is loading; the tick was not played
    Waiting,
    /// Inputs for this tick were applied
    Played(u32),
    /// The cursor reached the end of the script
    Finished,
}

/// What one call to [`InputController::update`] did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    /// Ticks played
    pub frames: u32,
    /// Breakpoint the cursor stopped on
    pub breakpoint: Option<FastForward>,
    pub finished: bool,
}

/// A position that can be returned to if the script before it is unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePoint {
    pub tick: u32,
    pub checksum: u64,
}

/// Drives playback of one script
pub struct InputController {
    registry: Arc<CommandRegistry>,
    config: PlaybackConfig,
    file_path: Option<PathBuf>,
    timeline: Arc<ScriptTimeline>,
    state: PlaybackState,
    current_tick: u32,
    reload: ReloadFlag,
    watcher: Option<ScriptWatcher>,
    /// Whole-script checksum of the current timeline
    checksum: OnceCell<u64>,
    /// Last prefix checksum computed, by tick
    checksum_prefix: Cell<Option<(u32, u64)>>,
    next_label_fast_forward: Option<FastForward>,
    /// Frames owed by a fast-forward slower than one per update
    speed_carry: f32,
    abort_reason: Option<String>,
    line_updates: Vec<LineUpdate>,
    loaded_once: bool,
}

impl InputController {
    pub fn new(registry: Arc<CommandRegistry>, config: PlaybackConfig) -> Self {
        Self {
            registry,
            config,
            file_path: None,
            timeline: Arc::new(ScriptTimeline::default()),
            state: PlaybackState::Idle,
            current_tick: 0,
            reload: ReloadFlag::new(),
            watcher: None,
            checksum: OnceCell::new(),
            checksum_prefix: Cell::new(None),
            next_label_fast_forward: None,
            speed_carry: 0.0,
            abort_reason: None,
            line_updates: Vec::new(),
            loaded_once: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::FastForwarding
        )
    }

    pub fn current_tick(&self) -> u32 {
        self.current_tick
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// The loaded timeline; a reload replaces it, never edits it
    pub fn timeline(&self) -> &Arc<ScriptTimeline> {
        &self.timeline
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Why the last run was aborted
    pub fn abort_reason(&self) -> Option<&str> {
        self.abort_reason.as_deref()
    }

    /// Flag raised by the file watcher, for hosts that watch files themselves
    pub fn reload_flag(&self) -> &ReloadFlag {
        &self.reload
    }

    pub fn needs_reload(&self) -> bool {
        self.reload.is_set()
    }

    /// Commands in registration order, for an editor
    pub fn command_list(&self) -> Vec<CommandInfo> {
        self.registry.list()
    }

    /// Line rewrites produced since the last call
    pub fn take_line_updates(&mut self) -> Vec<LineUpdate> {
        std::mem::take(&mut self.line_updates)
    }

    // =========================================================================
    // Run control
    // =========================================================================

    /// Select the script to play, clearing any current run
    pub fn set_file_path(&mut self, path: impl Into<PathBuf>) {
        self.clear();
        self.file_path = Some(path.into());
    }

    /// Load the script and start playing from the first tick
    ///
    /// Restarting a script that changed since its last run counts as a
    /// reload and bumps its `RecordCount`.
    pub fn start(&mut self) -> Result<(), LoadError> {
        self.current_tick = 0;
        self.abort_reason = None;
        self.next_label_fast_forward = None;
        self.state = PlaybackState::Loading;
        self.refresh_inputs(true)?;
        tracing::info!(
            "Playing {} ({} frames)",
            self.timeline.root().display(),
            self.timeline.total_frames()
        );
        Ok(())
    }

    /// Stop playing, keeping the timeline and the file watch
    pub fn stop(&mut self) {
        if self.state != PlaybackState::Idle {
            self.state = PlaybackState::Stopped;
        }
        self.next_label_fast_forward = None;
        self.speed_carry = 0.0;
    }

    /// Forget the loaded script
    pub fn clear(&mut self) {
        self.stop();
        self.state = PlaybackState::Idle;
        self.watcher = None;
        self.timeline = Arc::new(ScriptTimeline::default());
        self.current_tick = 0;
        self.loaded_once = false;
        self.reload.take();
        self.invalidate_checksums();
    }

    /// Reload the script if it changed on disk, or unconditionally with
    /// `force`. Returns whether a new timeline was swapped in.
    ///
    /// Loading is retried a few times since an editor may still be writing
    /// the file. If every attempt fails the run is aborted.
    pub fn refresh_inputs(&mut self, force: bool) -> Result<bool, LoadError> {
        let changed = self.reload.take();
        if !force && !changed {
            return Ok(false);
        }

        let timeline = match self.load_with_retries() {
            Ok(timeline) => timeline,
            Err(e) => {
                tracing::error!("Failed to load script: {}", e);
                self.abort_reason = Some(format!("run aborted: {e}"));
                // The old watch stays so a fixed file is noticed
                self.state = PlaybackState::Idle;
                return Err(e);
            }
        };

        let previous_checksum = self.loaded_once.then(|| self.checksum());

        self.timeline = Arc::new(timeline);
        self.invalidate_checksums();
        self.next_label_fast_forward = None;
        self.restart_watcher();

        if previous_checksum.is_some_and(|previous| previous != self.checksum()) {
            self.line_updates.extend(update_record_count(&self.timeline));
        }
        self.loaded_once = true;

        self.current_tick = self.current_tick.min(self.timeline.total_frames());
        if matches!(
            self.state,
            PlaybackState::Loading | PlaybackState::Playing | PlaybackState::FastForwarding
        ) {
            self.state = PlaybackState::Playing;
            self.update_state();
        }
        tracing::debug!(
            "Script loaded, resuming at tick {} of {}",
            self.current_tick,
            self.timeline.total_frames()
        );
        Ok(true)
    }

    fn load_with_retries(&self) -> Result<ScriptTimeline, LoadError> {
        let path = self.file_path.as_deref().ok_or(LoadError::NoScript)?;
        let attempts = self.config.load_retries.max(1);

        let mut attempt = 1;
        loop {
            let parser = ScriptParser::new(&self.registry, path)
                .with_default_speed(self.config.fast_forward_speed());
            match parser.parse() {
                Ok(timeline) => return Ok(timeline),
                Err(e) if attempt < attempts => {
                    tracing::warn!("Load attempt {}/{} failed: {}", attempt, attempts, e);
                    std::thread::sleep(self.config.load_retry_delay());
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn restart_watcher(&mut self) {
        self.watcher = None;
        if !self.config.watch_files {
            return;
        }
        match ScriptWatcher::start(
            self.timeline.used_files(),
            self.reload.clone(),
            self.config.watch_debounce(),
        ) {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => tracing::warn!("Script changes won't be picked up: {}", e),
        }
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Play a single tick
    pub fn advance_frame(&mut self, host: &mut dyn Host) -> TickResult {
        if !self.is_running() {
            return TickResult::Inactive;
        }

        if self.reload.is_set() && self.refresh_inputs(false).is_err() {
            return TickResult::Inactive;
        }

        if host.is_loading() {
            return TickResult::Waiting;
        }

        let tick = self.current_tick;
        self.run_commands(host, tick);

        let timeline = Arc::clone(&self.timeline);
        let Some(frame) = timeline.frame_at(tick) else {
            tracing::info!("Playback finished at tick {}", tick);
            self.stop();
            return TickResult::Finished;
        };

        host.apply_inputs(frame);
        self.current_tick = tick + 1;

        if self
            .next_label_fast_forward
            .as_ref()
            .is_some_and(|target| self.current_tick > target.frame)
        {
            self.next_label_fast_forward = None;
        }
        self.update_state();
        TickResult::Played(tick)
    }

    /// Play one host frame's worth of ticks
    ///
    /// Plays a single tick normally, or up to the breakpoint's speed while
    /// fast-forwarding, never past the breakpoint itself.
    pub fn update(&mut self, host: &mut dyn Host) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::default();
        let budget = self.frame_budget();

        while outcome.frames < budget {
            match self.advance_frame(host) {
                TickResult::Played(_) => outcome.frames += 1,
                TickResult::Finished => {
                    outcome.finished = true;
                    break;
                }
                TickResult::Waiting | TickResult::Inactive => break,
            }

            if self.is_break() {
                outcome.breakpoint = self.current_fast_forward().cloned();
                self.speed_carry = 0.0;
                break;
            }
        }
        outcome
    }

    /// Ticks to play this update
    fn frame_budget(&mut self) -> u32 {
        let tick = self.current_tick;
        let target = self
            .current_fast_forward()
            .filter(|ff| ff.frame > tick)
            .map(|ff| (ff.frame - tick, ff.speed));

        let Some((remaining, speed)) = target else {
            self.speed_carry = 0.0;
            return 1;
        };

        self.speed_carry += speed;
        let frames = self.speed_carry.floor();
        self.speed_carry -= frames;
        (frames as u32).min(remaining)
    }

    fn run_commands(&mut self, host: &mut dyn Host, tick: u32) {
        let timeline = Arc::clone(&self.timeline);
        let restricted = host.is_restricted_mode_enabled() || timeline.enforces_legal();

        let due: SmallVec<[&Command; 4]> = timeline
            .commands_at(tick)
            .iter()
            .filter(|command| command.timing().contains(ExecuteTiming::RUNTIME))
            .filter(|command| {
                let allowed = !restricted || command.spec.is_legal_in_restricted_mode();
                if !allowed {
                    tracing::debug!(
                        "Skipping {} at {}:{} in restricted mode",
                        command.name(),
                        command.file_path.display(),
                        command.file_line
                    );
                }
                allowed
            })
            .collect();

        for command in due {
            let mut ctx = RuntimeContext::new(host, tick, &mut self.line_updates);
            if let Err(e) = command.spec.handler().run(&mut ctx, command) {
                tracing::warn!(
                    "{}:{}: {} failed: {}",
                    command.file_path.display(),
                    command.file_line,
                    command.name(),
                    e
                );
            }
        }
    }

    fn update_state(&mut self) {
        if !self.is_running() {
            return;
        }
        let tick = self.current_tick;
        self.state = if self.current_fast_forward().is_some_and(|ff| ff.frame >= tick) {
            PlaybackState::FastForwarding
        } else {
            PlaybackState::Playing
        };
    }

    // =========================================================================
    // Fast-forward
    // =========================================================================

    /// Breakpoint playback is heading for
    ///
    /// A requested next-label target comes first. Otherwise the first marker
    /// at or after the cursor, falling back to the last marker.
    pub fn current_fast_forward(&self) -> Option<&FastForward> {
        let tick = self.current_tick;
        if let Some(target) = &self.next_label_fast_forward {
            return self
                .timeline
                .fast_forwards()
                .range(tick..)
                .map(|(_, ff)| ff)
                .take_while(|ff| ff.frame < target.frame)
                .find(|ff| ff.force_stop)
                .or(Some(target));
        }
        self.timeline
            .fast_forwards()
            .range(tick..)
            .next()
            .or_else(|| self.timeline.fast_forwards().iter().next_back())
            .map(|(_, ff)| ff)
    }

    /// Whether the cursor sits on a breakpoint
    pub fn is_break(&self) -> bool {
        let tick = self.current_tick;
        self.current_fast_forward().is_some_and(|ff| ff.frame == tick)
            || self
                .timeline
                .fast_forwards()
                .get(&tick)
                .is_some_and(|ff| ff.force_stop)
    }

    /// Fast-forward to the next label, or the end of the script
    ///
    /// A `***` breakpoint before the label is still stopped at.
    pub fn fast_forward_to_next_label(&mut self) {
        let tick = self.current_tick;
        let Some(label) = self.timeline.next_label(tick).cloned() else {
            return;
        };

        let marker = self
            .timeline
            .fast_forwards()
            .range(tick.saturating_add(1)..label.frame)
            .next()
            .map(|(_, ff)| ff.clone());
        self.next_label_fast_forward = Some(marker.unwrap_or(label));
        self.update_state();
    }

    // =========================================================================
    // Checksums
    // =========================================================================

    /// Whole-script checksum, computed once per load
    pub fn checksum(&self) -> u64 {
        *self.checksum.get_or_init(|| checksum::checksum(&self.timeline))
    }

    /// Checksum of everything before `tick`
    pub fn checksum_up_to(&self, tick: u32) -> u64 {
        if let Some((cached_tick, value)) = self.checksum_prefix.get()
            && cached_tick == tick
        {
            return value;
        }
        let value = checksum::checksum_up_to(&self.timeline, tick);
        self.checksum_prefix.set(Some((tick, value)));
        value
    }

    fn invalidate_checksums(&mut self) {
        self.checksum = OnceCell::new();
        self.checksum_prefix.set(None);
    }

    /// Remember the cursor, e.g. when a save state is taken
    pub fn capture_resume_point(&self) -> ResumePoint {
        ResumePoint {
            tick: self.current_tick,
            checksum: self.checksum_up_to(self.current_tick),
        }
    }

    /// Whether the script before `point` is still what it was
    pub fn can_resume(&self, point: &ResumePoint) -> bool {
        point.tick <= self.timeline.total_frames() && self.checksum_up_to(point.tick) == point.checksum
    }

    /// Jump back to `point`, refusing if the script changed before it
    pub fn resume(&mut self, point: &ResumePoint) -> bool {
        if !self.is_running() || !self.can_resume(point) {
            tracing::debug!("Not resuming at tick {}: script changed", point.tick);
            return false;
        }
        self.current_tick = point.tick;
        self.next_label_fast_forward = None;
        self.update_state();
        true
    }

    // =========================================================================
    // Editor
    // =========================================================================

    /// Ticks of the current action line already played, 0 before the first
    pub fn current_frame_in_input(&self) -> u32 {
        let Some(last) = self.current_tick.checked_sub(1) else {
            return 0;
        };
        self.timeline
            .input_index_at(last)
            .map_or(0, |index| self.current_tick - self.timeline.input_start(index))
    }

    pub fn studio_state(&self) -> StudioState {
        let last_played = self
            .current_tick
            .checked_sub(1)
            .and_then(|tick| self.timeline.frame_at(tick));
        let current = last_played.or_else(|| self.timeline.frame_at(self.current_tick));

        let frame_in_input = self.current_frame_in_input();
        let current_line_suffix = match last_played {
            Some(frame) if frame.repeat.is_repeat() => format!(
                "{frame_in_input} [{}/{}]",
                frame.repeat.index, frame.repeat.count
            ),
            Some(_) => frame_in_input.to_string(),
            None => String::new(),
        };

        StudioState {
            current_line: current.map(|frame| frame.studio_line),
            current_line_suffix,
            current_frame: self.current_tick,
            current_frame_in_input: frame_in_input,
            total_frames: self.timeline.total_frames(),
            save_state_lines: self.timeline.save_state_lines(),
            playback_running: self.is_running(),
            file_needs_reload: self.reload.is_set(),
        }
    }
}

impl std::fmt::Debug for InputController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputController")
            .field("file_path", &self.file_path)
            .field("state", &self.state)
            .field("current_tick", &self.current_tick)
            .field("total_frames", &self.timeline.total_frames())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
