//! `Play, label[, frames to wait]`
//!
//! Skips ahead in the root script: reading continues at `label`, after an
//! optional run of empty frames. Only labels below the command may be used.

use std::path::Path;

use tasplay_shared::{AutoCompleteEntry, comment_line};
use xxhash_rust::xxh3::Xxh3;

use super::read::resolve_line;
use crate::command::{AutoComplete, AutoCompleteIter, Command, CommandSpec, ExecuteTiming, TasCommand};
use crate::error::CommandError;
use crate::input::RepeatInfo;
use crate::loader::ScriptParser;

pub(super) fn spec() -> CommandSpec {
    CommandSpec::new("Play", PlayCommand)
        .timing(ExecuteTiming::PARSE)
        .insert("Play, start label, frames to wait")
        .auto_complete(PlayAutoComplete)
}

struct PlayCommand;

impl TasCommand for PlayCommand {
    fn parse(&self, parser: &mut ScriptParser<'_>, command: &Command) -> Result<(), CommandError> {
        let label = command.arg(0).ok_or(CommandError::MissingArgument("label"))?;
        if !parser.is_root(&command.file_path) {
            return Err(CommandError::Failed(
                "Play is only allowed in the main script".to_string(),
            ));
        }

        let wait = match command.arg(1) {
            Some(text) => text
                .trim()
                .parse::<u32>()
                .map_err(|_| CommandError::invalid(text, "not a frame count"))?,
            None => 0,
        };

        let root = parser.root().to_path_buf();
        let lines = parser.file_lines(&root)?;
        let start_line = resolve_line(label, &lines)
            .ok_or_else(|| CommandError::invalid(label, "label not found"))?;
        if start_line <= command.studio_line + 1 {
            return Err(CommandError::invalid(label, "label must come after the Play command"));
        }

        if wait > 0 {
            parser.add_frames(
                &wait.to_string(),
                &command.file_path,
                command.file_line,
                command.studio_line,
                RepeatInfo::NONE,
            );
        }

        parser.read_file(&root, start_line, usize::MAX, start_line - 1, RepeatInfo::NONE)?;
        Ok(())
    }
}

/// Labels below the command
struct PlayAutoComplete;

impl AutoComplete for PlayAutoComplete {
    fn hash(&self, args: &[String], file_path: &Path, file_line: usize) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(&crate::command::hash_leading_args(args, file_path).to_le_bytes());
        hasher.update(&file_line.to_le_bytes());
        if let Ok(content) = std::fs::read(file_path) {
            hasher.update(&content);
        }
        hasher.digest()
    }

    fn entries(&self, args: &[String], file_path: &Path, file_line: usize) -> AutoCompleteIter {
        if args.len() != 1 {
            return Box::new(std::iter::empty());
        }
        let content = std::fs::read_to_string(file_path).unwrap_or_default();
        let labels: Vec<AutoCompleteEntry> = content
            .lines()
            .enumerate()
            .skip(file_line)
            .filter(|(_, line)| comment_line::is_label(line))
            .filter_map(|(_, line)| comment_line::comment_text(line))
            .map(|label| {
                let mut entry = AutoCompleteEntry::new(label);
                entry.has_next = Some(true);
                entry
            })
            .collect();
        Box::new(labels.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_auto_complete_only_later_labels() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("main.tas");
        std::fs::write(&script, "#early\nPlay, \n1,R\n#late\n# spaced\n#last\n").unwrap();

        let names: Vec<String> = PlayAutoComplete
            .entries(&["".to_string()], &script, 2)
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["late", "last"]);
    }

    #[test]
    fn test_auto_complete_hash_tracks_line() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("main.tas");
        std::fs::write(&script, "#a\n").unwrap();
        let args = vec!["".to_string()];
        assert_eq!(PlayAutoComplete.hash(&args, &script, 1), PlayAutoComplete.hash(&args, &script, 1));
        assert_ne!(PlayAutoComplete.hash(&args, &script, 1), PlayAutoComplete.hash(&args, &script, 2));
    }
}
