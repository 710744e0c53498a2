//! Frame-indexed result of loading a script
//!
//! Each action line is stored once together with the exclusive end tick of
//! everything up to and including it, so the entry playing at a tick is a
//! binary search over `ends`.
//!
//! A timeline is never edited after loading. Reloads build a new one and
//! the controller swaps its `Arc`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;

use super::frame::{InputFrame, RepeatInfo};
use crate::command::Command;

/// A `***` breakpoint
#[derive(Debug, Clone, PartialEq)]
pub struct FastForward {
    /// Tick playback stops at
    pub frame: u32,
    /// Frames per update on the way there
    pub speed: f32,
    pub save_state: bool,
    /// Stops even while fast-forwarding to a label
    pub force_stop: bool,
    pub studio_line: usize,
}

/// A `#` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub frame: u32,
    pub file_path: Arc<Path>,
    pub file_line: usize,
    pub studio_line: usize,
    /// Text after the `#`, trimmed
    pub text: String,
}

/// A line that was skipped while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file_path: PathBuf,
    pub file_line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}",
            self.file_path.display(),
            self.file_line,
            self.message
        )
    }
}

/// Everything a loaded script plays back
#[derive(Debug, Default)]
pub struct ScriptTimeline {
    root: PathBuf,
    inputs: Vec<InputFrame>,
    /// `ends[i]` is the tick right after `inputs[i]` finishes
    ends: Vec<u32>,
    commands: BTreeMap<u32, Vec<Command>>,
    fast_forwards: BTreeMap<u32, FastForward>,
    label_fast_forwards: BTreeMap<u32, FastForward>,
    comments: HashMap<PathBuf, Vec<Comment>>,
    used_files: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
    enforce_legal: bool,
}

impl ScriptTimeline {
    /// Empty timeline for `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ticks in the whole script
    pub fn total_frames(&self) -> u32 {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn inputs(&self) -> &[InputFrame] {
        &self.inputs
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Index of the entry playing at `tick`
    pub fn input_index_at(&self, tick: u32) -> Option<usize> {
        if tick >= self.total_frames() {
            return None;
        }
        Some(self.ends.partition_point(|&end| end <= tick))
    }

    /// Entry playing at `tick`, `None` past the end
    pub fn frame_at(&self, tick: u32) -> Option<&InputFrame> {
        self.input_index_at(tick).map(|index| &self.inputs[index])
    }

    /// First tick of the entry at `index`
    pub fn input_start(&self, index: usize) -> u32 {
        match index {
            0 => 0,
            _ => self.ends.get(index - 1).copied().unwrap_or_else(|| self.total_frames()),
        }
    }

    /// Commands anchored at `tick`, in script order
    pub fn commands_at(&self, tick: u32) -> &[Command] {
        self.commands.get(&tick).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All commands, by frame then script order
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values().flatten()
    }

    pub fn fast_forwards(&self) -> &BTreeMap<u32, FastForward> {
        &self.fast_forwards
    }

    /// First `***` strictly after `tick`
    pub fn next_fast_forward(&self, tick: u32) -> Option<&FastForward> {
        self.fast_forwards.range(tick.saturating_add(1)..).next().map(|(_, ff)| ff)
    }

    /// First `***!` strictly after `tick` and before `limit`
    pub fn next_force_stop(&self, tick: u32, limit: u32) -> Option<&FastForward> {
        let start = tick.saturating_add(1);
        if start >= limit {
            return None;
        }
        self.fast_forwards
            .range(start..limit)
            .map(|(_, ff)| ff)
            .find(|ff| ff.force_stop)
    }

    /// Label targets, including the end of the root file
    pub fn label_fast_forwards(&self) -> &BTreeMap<u32, FastForward> {
        &self.label_fast_forwards
    }

    /// First label target strictly after `tick`
    pub fn next_label(&self, tick: u32) -> Option<&FastForward> {
        self.label_fast_forwards
            .range(tick.saturating_add(1)..)
            .next()
            .map(|(_, ff)| ff)
    }

    /// Comments read from `path`
    pub fn comments(&self, path: &Path) -> &[Comment] {
        self.comments.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Files read while loading, root first
    pub fn used_files(&self) -> &[PathBuf] {
        &self.used_files
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether the script contains `EnforceLegal`
    pub fn enforces_legal(&self) -> bool {
        self.enforce_legal
    }

    /// Editor rows of every save-state marker
    pub fn save_state_lines(&self) -> Vec<usize> {
        self.fast_forwards
            .values()
            .filter(|ff| ff.save_state)
            .map(|ff| ff.studio_line)
            .collect()
    }

    // =========================================================================
    // Building (loader only)
    // =========================================================================

    /// Append an entry, returning its first tick
    pub(crate) fn push_input(&mut self, frame: InputFrame) -> u32 {
        let start = self.total_frames();
        self.ends.push(start.saturating_add(frame.frames()));
        self.inputs.push(frame);
        start
    }

    /// Tag entries from `first` onwards as the first iteration of a repeat.
    /// Entries already tagged by an inner block keep their tag.
    pub(crate) fn mark_repeat(&mut self, first: usize, count: u32) {
        for frame in self.inputs.iter_mut().skip(first) {
            if !frame.repeat.is_repeat() {
                frame.repeat = RepeatInfo::new(1, count);
            }
        }
    }

    pub(crate) fn add_command(&mut self, command: Command) {
        self.commands.entry(command.frame).or_default().push(command);
    }

    /// Add a `***`; a save-state marker is never replaced by a plain one
    pub(crate) fn add_fast_forward(&mut self, ff: FastForward) {
        match self.fast_forwards.get(&ff.frame) {
            Some(existing) if existing.save_state && !ff.save_state => {}
            _ => {
                self.fast_forwards.insert(ff.frame, ff);
            }
        }
    }

    /// Add a label target; the first label at a frame is kept
    pub(crate) fn add_label_fast_forward(&mut self, ff: FastForward) {
        self.label_fast_forwards.entry(ff.frame).or_insert(ff);
    }

    pub(crate) fn add_comment(&mut self, comment: Comment) {
        self.comments
            .entry(comment.file_path.to_path_buf())
            .or_default()
            .push(comment);
    }

    pub(crate) fn add_used_file(&mut self, path: &Path) {
        if !self.used_files.iter().any(|used| used == path) {
            self.used_files.push(path.to_path_buf());
        }
    }

    pub(crate) fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn set_enforce_legal(&mut self) {
        self.enforce_legal = true;
    }
}
