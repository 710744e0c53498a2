//! Script commands
//!
//! A command line names a registered [`CommandSpec`]. Depending on its
//! [`ExecuteTiming`], the command's handler runs while the script is loaded
//! (`Read`, `Repeat`, `Play`), when playback reaches the frame the command is
//! anchored at (`Console`, `Safe`), or both.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = CommandRegistry::with_builtins();
//! registry.register(
//!     CommandSpec::from_fn("Pause", |ctx, _command| {
//!         ctx.host.console(&["pause".to_string()])
//!     })
//!     .illegal_in_restricted_mode(),
//! );
//! ```

pub mod builtin;
mod registry;

pub use registry::{CommandRegistry, CommandSpec, FnCommand};

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tasplay_shared::{AutoCompleteEntry, CommandLine, LineUpdate};
use xxhash_rust::xxh3::Xxh3;

use crate::error::CommandError;
use crate::host::Host;
use crate::loader::ScriptParser;

bitflags::bitflags! {
    /// When a command's handler runs
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExecuteTiming: u8 {
        /// While the script is being loaded
        const PARSE = 1 << 0;
        /// When playback reaches the command's frame
        const RUNTIME = 1 << 1;
    }
}

/// A command line bound to its registered spec
#[derive(Clone)]
pub struct Command {
    pub line: CommandLine,
    pub spec: Arc<CommandSpec>,
    pub file_path: Arc<Path>,
    /// 1-based line in `file_path`
    pub file_line: usize,
    /// 0-based editor row
    pub studio_line: usize,
    /// Tick the command runs before
    pub frame: u32,
}

impl Command {
    /// Registered name, regardless of how the line spelled it
    pub fn name(&self) -> &str {
        self.spec.name()
    }

    pub fn args(&self) -> &[String] {
        &self.line.arguments
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.line.arguments.get(index).map(String::as_str)
    }

    /// Case-insensitive check against the registered name
    pub fn is(&self, name: &str) -> bool {
        self.spec.name().eq_ignore_ascii_case(name)
    }

    pub fn timing(&self) -> ExecuteTiming {
        self.spec.execute_timing()
    }

    /// Normalized text hashed into the checksum
    pub fn checksum_text(&self) -> String {
        let mut text = self.spec.name().to_string();
        for arg in self.args() {
            text.push_str(", ");
            text.push_str(arg);
        }
        text
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.spec.name())
            .field("args", &self.line.arguments)
            .field("file_path", &self.file_path)
            .field("file_line", &self.file_line)
            .field("frame", &self.frame)
            .finish()
    }
}

/// Handler for a command.
///
/// Both methods default to doing nothing, so a command only implements the
/// timing it is registered for.
pub trait TasCommand: Send + Sync {
    /// Called while loading, with the parser positioned at the command.
    fn parse(&self, _parser: &mut ScriptParser<'_>, _command: &Command) -> Result<(), CommandError> {
        Ok(())
    }

    /// Called when playback reaches `command.frame`.
    fn run(&self, _ctx: &mut RuntimeContext<'_>, _command: &Command) -> Result<(), CommandError> {
        Ok(())
    }
}

/// What a runtime handler may touch
pub struct RuntimeContext<'a> {
    pub host: &'a mut dyn Host,
    /// Tick about to be played
    pub frame: u32,
    line_updates: &'a mut Vec<LineUpdate>,
}

impl<'a> RuntimeContext<'a> {
    pub(crate) fn new(
        host: &'a mut dyn Host,
        frame: u32,
        line_updates: &'a mut Vec<LineUpdate>,
    ) -> Self {
        Self {
            host,
            frame,
            line_updates,
        }
    }

    /// Ask the editor to replace one line of a script file
    pub fn update_line(&mut self, update: LineUpdate) {
        self.line_updates.push(update);
    }
}

/// Lazily produced auto-complete suggestions
pub type AutoCompleteIter = Box<dyn Iterator<Item = AutoCompleteEntry> + Send>;

/// Argument suggestions for an editor.
///
/// `entries` may be dropped at any point; producers must not rely on being
/// exhausted.
pub trait AutoComplete: Send + Sync {
    /// Cache key for the suggestions of `args`. Identical input gives an
    /// identical hash.
    fn hash(&self, args: &[String], file_path: &Path, _file_line: usize) -> u64 {
        hash_leading_args(args, file_path)
    }

    /// Suggestions for the last entry of `args`
    fn entries(&self, args: &[String], file_path: &Path, file_line: usize) -> AutoCompleteIter;
}

/// Hash every argument but the one being typed, plus the file path
pub fn hash_leading_args(args: &[String], file_path: &Path) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.update(file_path.to_string_lossy().as_bytes());
    let leading = args.len().saturating_sub(1);
    for arg in &args[..leading] {
        hasher.update(&[0]);
        hasher.update(arg.as_bytes());
    }
    hasher.digest()
}
