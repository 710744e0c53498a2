//! Shared types for the tasplay script format.
//!
//! Everything here is pure text handling: the line codecs used by the
//! loader and the data shapes exchanged with an external editor. Nothing
//! in this crate touches the filesystem.

pub mod action_line;
pub mod actions;
pub mod command_line;
pub mod comment_line;
pub mod fast_forward_line;
pub mod studio;

pub use action_line::{ActionLine, MAX_FRAMES};
pub use actions::Actions;
pub use command_line::{CommandLine, CommandLineError};
pub use fast_forward_line::FastForwardLine;
pub use studio::{AutoCompleteEntry, CommandInfo, LineUpdate, StudioState};
