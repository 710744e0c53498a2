//! tasplay core - TAS script interpreter and playback engine
//!
//! Loads line-oriented input scripts into a frame-indexed timeline and plays
//! them back one tick at a time against a game [`Host`].
//!
//! # Architecture
//!
//! - [`CommandRegistry`] - named commands with timing and legality flags
//! - [`loader`] - builds a [`ScriptTimeline`] from a root script and its includes
//! - [`InputController`] - playback cursor, fast-forwarding and reloads
//! - [`checksum`] - content hashes used to validate resume points
//! - [`watcher`] - flags a reload when a script changes on disk

pub mod checksum;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod input;
pub mod loader;
#[cfg(test)]
pub mod test_utils;
pub mod watcher;

pub use command::{
    AutoComplete, Command, CommandRegistry, CommandSpec, ExecuteTiming, RuntimeContext, TasCommand,
};
pub use config::{DEFAULT_FAST_FORWARD_SPEED, PlaybackConfig};
pub use controller::{InputController, PlaybackState, ResumePoint, TickResult, UpdateOutcome};
pub use error::{CommandError, ConfigError, LoadError, WatchError};
pub use host::Host;
pub use input::{Comment, Diagnostic, FastForward, InputFrame, RepeatInfo, ScriptTimeline};
pub use loader::{ScriptParser, load};
pub use watcher::{ReloadFlag, ScriptWatcher};

// Re-export the shared formats for hosts that only depend on the core
pub use tasplay_shared as shared;
