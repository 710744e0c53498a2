//! Data handed to an external script editor
//!
//! These types carry no behavior. A communication layer is expected to
//! serialize them; they derive serde for that purpose.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Editor-facing description of a registered command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    /// Snippet inserted when the command is auto-completed
    pub insert: String,
    /// Whether the editor should open argument completion after inserting
    pub has_arguments: bool,
}

/// One suggestion for a command argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoCompleteEntry {
    pub name: String,
    /// Earlier parts of the same argument, prepended to `name`
    pub prefix: String,
    /// Extra text displayed next to the entry
    pub extra: String,
    /// Move on to the next argument after completing this one
    pub is_done: bool,
    /// Overrides whether further arguments follow
    pub has_next: Option<bool>,
}

impl AutoCompleteEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            extra: String::new(),
            is_done: true,
            has_next: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Mark the entry as a partial argument, e.g. a directory
    pub fn not_done(mut self) -> Self {
        self.is_done = false;
        self
    }

    pub fn full_name(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }
}

/// Replacement text for one line of a script file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineUpdate {
    pub file: PathBuf,
    /// 0-based row in the editor
    pub line: usize,
    pub text: String,
}

/// Playback position as shown in the editor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioState {
    /// 0-based editor row of the frame being played, if any
    pub current_line: Option<usize>,
    /// Extra progress text for the current row, e.g. `12` or `3 [2/5]`
    pub current_line_suffix: String,
    pub current_frame: u32,
    /// 1-based position within the current action line, 0 when stopped
    pub current_frame_in_input: u32,
    pub total_frames: u32,
    /// Editor rows of every save-state fast-forward marker
    pub save_state_lines: Vec<usize>,
    pub playback_running: bool,
    /// Files changed on disk but the timeline hasn't been rebuilt yet
    pub file_needs_reload: bool,
}
