//! Shared test utilities for unit tests

use std::path::{Path, PathBuf};

use crate::error::CommandError;
use crate::host::Host;
use crate::input::InputFrame;

// ============================================================================
// Recording Host
// ============================================================================

/// Host that records everything playback asks of it
#[derive(Debug, Default)]
pub struct RecordingHost {
    /// Canonical text of each applied frame, one entry per tick
    pub applied: Vec<String>,
    pub loading: bool,
    pub restricted: bool,
    pub console_calls: Vec<Vec<String>>,
    pub safe_mode: Option<bool>,
    /// Make `console` fail
    pub console_fails: bool,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restricted() -> Self {
        Self {
            restricted: true,
            ..Default::default()
        }
    }
}

impl Host for RecordingHost {
    fn is_loading(&self) -> bool {
        self.loading
    }

    fn apply_inputs(&mut self, frame: &InputFrame) {
        self.applied.push(frame.text().to_string());
    }

    fn is_restricted_mode_enabled(&self) -> bool {
        self.restricted
    }

    fn set_safe_mode(&mut self, safe: bool) {
        self.safe_mode = Some(safe);
    }

    fn console(&mut self, args: &[String]) -> Result<(), CommandError> {
        if self.console_fails {
            return Err(CommandError::Failed("console unavailable".to_string()));
        }
        self.console_calls.push(args.to_vec());
        Ok(())
    }
}

// ============================================================================
// Script Files
// ============================================================================

/// Write `content` to `dir/name`, creating parent directories
pub fn write_script(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}
