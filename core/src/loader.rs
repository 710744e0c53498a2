//! Script loader
//!
//! Streams the root script line by line into a [`ScriptTimeline`]. Each
//! trimmed line is tried, in order, as:
//!
//! 1. a command (a letter first), dispatched at parse time if its timing
//!    asks for it
//! 2. a `***` fast-forward marker
//! 3. a `#` comment, which may also be a label
//! 4. an action line
//!
//! Anything else is skipped with a diagnostic. Every file is read from disk
//! at most once per load, so a script edited mid-load is never seen half
//! old and half new.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;
use tasplay_shared::fast_forward_line::FastForwardLine;
use tasplay_shared::{ActionLine, CommandLine, CommandLineError, comment_line};

use crate::command::{Command, CommandRegistry, ExecuteTiming};
use crate::config::DEFAULT_FAST_FORWARD_SPEED;
use crate::error::LoadError;
use crate::input::{Comment, Diagnostic, FastForward, InputFrame, RepeatInfo, ScriptTimeline};

/// Load `root` with the given command set
pub fn load(registry: &CommandRegistry, root: &Path) -> Result<ScriptTimeline, LoadError> {
    ScriptParser::new(registry, root).parse()
}

/// An open `Repeat` waiting for its `EndRepeat`
#[derive(Debug, Clone)]
pub(crate) struct PendingRepeat {
    pub file_path: Arc<Path>,
    pub file_line: usize,
    pub count: u32,
    /// First timeline entry inside the block
    pub first_input: usize,
}

/// State of one load pass
///
/// Parse-time command handlers receive the parser and call back into
/// [`ScriptParser::read_file`] / [`ScriptParser::read_lines`] to include
/// more lines at the cursor.
pub struct ScriptParser<'r> {
    registry: &'r CommandRegistry,
    root: Arc<Path>,
    default_speed: f32,
    timeline: ScriptTimeline,
    files: HashMap<PathBuf, Arc<[String]>>,
    /// Open `Repeat` blocks, innermost last
    pub(crate) repeats: Vec<PendingRepeat>,
    /// `Read` invocations currently being expanded, for cycle detection
    pub(crate) read_stack: Vec<String>,
}

impl<'r> ScriptParser<'r> {
    pub fn new(registry: &'r CommandRegistry, root: &Path) -> Self {
        let root: Arc<Path> = Arc::from(std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()));
        Self {
            registry,
            timeline: ScriptTimeline::new(root.to_path_buf()),
            root,
            default_speed: DEFAULT_FAST_FORWARD_SPEED,
            files: HashMap::new(),
            repeats: Vec::new(),
            read_stack: Vec::new(),
        }
    }

    /// Speed for `***` markers without one
    pub fn with_default_speed(mut self, speed: f32) -> Self {
        self.default_speed = speed;
        self
    }

    /// Load the root file
    ///
    /// Only a missing or unreadable root file fails; everything below it
    /// degrades to diagnostics.
    pub fn parse(mut self) -> Result<ScriptTimeline, LoadError> {
        let root = Arc::clone(&self.root);
        tracing::debug!("Loading {}", root.display());

        self.read_file(&root, 0, usize::MAX, 0, RepeatInfo::NONE)?;

        for repeat in std::mem::take(&mut self.repeats) {
            self.diagnostic(&repeat.file_path, repeat.file_line, "Repeat without EndRepeat");
        }

        tracing::debug!(
            "Loaded {} ({} entries, {} frames, {} diagnostics)",
            root.display(),
            self.timeline.inputs().len(),
            self.timeline.total_frames(),
            self.timeline.diagnostics().len()
        );
        Ok(self.timeline)
    }

    pub fn registry(&self) -> &'r CommandRegistry {
        self.registry
    }

    /// Absolute path of the root script
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_root(&self, path: &Path) -> bool {
        *self.root == *path
    }

    /// Tick the next action line starts at
    pub fn cursor_frame(&self) -> u32 {
        self.timeline.total_frames()
    }

    /// Entries added so far
    pub fn input_count(&self) -> usize {
        self.timeline.inputs().len()
    }

    /// Lines of `path`, read from disk on first use
    pub fn file_lines(&mut self, path: &Path) -> Result<Arc<[String]>, LoadError> {
        if let Some(lines) = self.files.get(path) {
            return Ok(Arc::clone(lines));
        }

        let content = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        let lines: Arc<[String]> = content.lines().map(str::to_string).collect();

        self.timeline.add_used_file(path);
        self.files.insert(path.to_path_buf(), Arc::clone(&lines));
        Ok(lines)
    }

    /// Read lines `start_line..=end_line` (1-based) of `path` at the cursor
    ///
    /// Returns false when a `Play` stopped reading.
    pub fn read_file(
        &mut self,
        path: &Path,
        start_line: usize,
        end_line: usize,
        studio_line: usize,
        repeat: RepeatInfo,
    ) -> Result<bool, LoadError> {
        let lines = self.file_lines(path)?;
        let path: Arc<Path> = if self.is_root(path) {
            Arc::clone(&self.root)
        } else {
            Arc::from(path)
        };
        Ok(self.read_lines(&path, &lines, start_line, end_line, studio_line, repeat))
    }

    /// Read already loaded lines of `path`
    ///
    /// `studio_line` only advances for the root file. Returns false when a
    /// `Play` stopped reading.
    pub fn read_lines(
        &mut self,
        path: &Arc<Path>,
        lines: &[String],
        start_line: usize,
        end_line: usize,
        mut studio_line: usize,
        repeat: RepeatInfo,
    ) -> bool {
        let is_root = self.is_root(path);

        for (index, line) in lines.iter().enumerate().take(end_line) {
            let file_line = index + 1;
            if file_line < start_line {
                continue;
            }

            if !self.read_line(line, path, file_line, studio_line, repeat) {
                return false;
            }

            if is_root {
                studio_line += 1;
            }
        }

        // Hidden label at the end of the root text, target of the last
        // next-label fast-forward
        if is_root {
            let frame = self.cursor_frame();
            self.timeline.add_label_fast_forward(FastForward {
                frame,
                speed: self.default_speed,
                save_state: false,
                force_stop: false,
                studio_line,
            });
        }
        true
    }

    /// Parse one line. Returns false when reading the file must stop.
    fn read_line(
        &mut self,
        line: &str,
        path: &Arc<Path>,
        file_line: usize,
        studio_line: usize,
        repeat: RepeatInfo,
    ) -> bool {
        let text = line.trim();
        if text.is_empty() {
            return true;
        }

        match CommandLine::parse(text) {
            Ok(command_line) => {
                return self.read_command(command_line, path, file_line, studio_line);
            }
            Err(CommandLineError::NotACommand) => {}
            Err(e) => {
                self.diagnostic(path, file_line, format!("Malformed command '{text}': {e}"));
                return true;
            }
        }

        if let Some(ff) = FastForwardLine::parse(text) {
            let frame = self.cursor_frame();
            self.timeline.add_fast_forward(FastForward {
                frame,
                speed: ff.speed.unwrap_or(self.default_speed),
                save_state: ff.save_state,
                force_stop: ff.force_stop,
                studio_line,
            });
            if !ff.speed_text.is_empty() && ff.speed.is_none() {
                self.diagnostic(
                    path,
                    file_line,
                    format!("Invalid fast-forward speed '{}'", ff.speed_text),
                );
            }
            return true;
        }

        if comment_line::is_comment(text) {
            let frame = self.cursor_frame();
            if comment_line::is_label(text) {
                self.timeline.add_label_fast_forward(FastForward {
                    frame,
                    speed: self.default_speed,
                    save_state: false,
                    force_stop: false,
                    studio_line,
                });
            }
            self.timeline.add_comment(Comment {
                frame,
                file_path: Arc::clone(path),
                file_line,
                studio_line,
                text: comment_line::comment_text(text).unwrap_or_default().to_string(),
            });
            return true;
        }

        if !self.add_frames(text, path, file_line, studio_line, repeat) {
            self.diagnostic(path, file_line, format!("Unrecognized line '{text}'"));
        }
        true
    }

    fn read_command(
        &mut self,
        line: CommandLine,
        path: &Arc<Path>,
        file_line: usize,
        studio_line: usize,
    ) -> bool {
        let registry = self.registry;
        let Some(spec) = registry.resolve(&line.command) else {
            self.diagnostic(path, file_line, format!("Unknown command '{}'", line.command));
            return true;
        };

        // Anchored before anything the handler adds
        let command = Command {
            line,
            spec: Arc::clone(spec),
            file_path: Arc::clone(path),
            file_line,
            studio_line,
            frame: self.cursor_frame(),
        };
        self.timeline.add_command(command.clone());

        let mut parsed = true;
        if spec.execute_timing().contains(ExecuteTiming::PARSE)
            && let Err(e) = spec.handler().parse(self, &command)
        {
            self.diagnostic(path, file_line, format!("{} failed: {e}", spec.name()));
            parsed = false;
        }

        // A successful Play already read the rest of the root file from its
        // label; continuing would read the skipped lines a second time
        !(parsed && command.is("Play"))
    }

    /// Parse `text` as an action line and append it. Returns false if it
    /// isn't one.
    pub fn add_frames(
        &mut self,
        text: &str,
        path: &Arc<Path>,
        file_line: usize,
        studio_line: usize,
        repeat: RepeatInfo,
    ) -> bool {
        match ActionLine::parse(text) {
            Some(line) => {
                self.timeline.push_input(InputFrame::new(
                    line,
                    Arc::clone(path),
                    file_line,
                    studio_line,
                    repeat,
                ));
                true
            }
            None => false,
        }
    }

    /// Record a skipped line
    pub fn diagnostic(&mut self, path: &Path, file_line: usize, message: impl Into<String>) {
        self.timeline.add_diagnostic(Diagnostic {
            file_path: path.to_path_buf(),
            file_line,
            message: message.into(),
        });
    }

    pub(crate) fn timeline_mut(&mut self) -> &mut ScriptTimeline {
        &mut self.timeline
    }
}
