//! `RecordCount: N`
//!
//! Bookkeeping only: the line is skipped at runtime and kept out of the
//! checksum. Whenever a reload changes the script, the controller bumps
//! every counter in the root file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tasplay_shared::LineUpdate;

use crate::command::{CommandSpec, TasCommand};
use crate::error::CommandError;
use crate::input::ScriptTimeline;

pub const RECORD_COUNT: &str = "RecordCount";

pub(super) fn spec() -> CommandSpec {
    CommandSpec::new(RECORD_COUNT, RecordCountCommand)
        .alias("RecordCount:")
        .alias("RecordCount：")
        .exclude_from_checksum()
        .insert("RecordCount: 1")
}

struct RecordCountCommand;

impl TasCommand for RecordCountCommand {}

/// Editor updates incrementing each `RecordCount` of the root file
pub fn update_record_count(timeline: &ScriptTimeline) -> Vec<LineUpdate> {
    let mut counters: BTreeMap<usize, u64> = BTreeMap::new();
    for command in timeline.commands() {
        if !command.is(RECORD_COUNT) || *command.file_path != *timeline.root() {
            continue;
        }
        if let Some(count) = command.arg(0).and_then(|arg| arg.trim().parse::<u64>().ok()) {
            counters.insert(command.file_line, count);
        }
    }

    counters
        .into_iter()
        .map(|(file_line, count)| LineUpdate {
            file: timeline.root().to_path_buf(),
            line: file_line - 1,
            text: format!("{RECORD_COUNT}: {}", count.saturating_add(1)),
        })
        .collect()
}

/// Write `updates` into their files, keeping each line's ending
pub fn apply_line_updates(updates: &[LineUpdate]) -> Result<(), CommandError> {
    let mut by_file: BTreeMap<&PathBuf, Vec<&LineUpdate>> = BTreeMap::new();
    for update in updates {
        by_file.entry(&update.file).or_default().push(update);
    }

    for (file, updates) in by_file {
        rewrite_lines(file, &updates)?;
    }
    Ok(())
}

fn rewrite_lines(file: &Path, updates: &[&LineUpdate]) -> Result<(), CommandError> {
    let content = std::fs::read_to_string(file)?;
    let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();

    for update in updates {
        let Some(line) = lines.get_mut(update.line) else {
            tracing::warn!(
                "Line {} of {} no longer exists, not updated",
                update.line + 1,
                file.display()
            );
            continue;
        };
        let ending = if line.ends_with("\r\n") {
            "\r\n"
        } else if line.ends_with('\n') {
            "\n"
        } else {
            ""
        };
        let bom = if update.line == 0 && line.starts_with('\u{feff}') {
            "\u{feff}"
        } else {
            ""
        };
        *line = format!("{bom}{}{ending}", update.text);
    }

    std::fs::write(file, lines.concat())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandRegistry;
    use tempfile::TempDir;

    #[test]
    fn test_update_record_count() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("main.tas");
        std::fs::write(&root, "RecordCount: 4\n1,R\nRecordCount: x\n").unwrap();

        let registry = CommandRegistry::with_builtins();
        let timeline = crate::loader::load(&registry, &root).unwrap();
        let updates = update_record_count(&timeline);

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].line, 0);
        assert_eq!(updates[0].text, "RecordCount: 5");
    }

    #[test]
    fn test_apply_keeps_line_endings() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("main.tas");
        std::fs::write(&root, "RecordCount: 1\r\n1,R\r\nRecordCount: 9").unwrap();

        let updates = vec![
            LineUpdate {
                file: root.clone(),
                line: 0,
                text: "RecordCount: 2".to_string(),
            },
            LineUpdate {
                file: root.clone(),
                line: 2,
                text: "RecordCount: 10".to_string(),
            },
            LineUpdate {
                file: root.clone(),
                line: 7,
                text: "ignored".to_string(),
            },
        ];
        apply_line_updates(&updates).unwrap();

        let content = std::fs::read_to_string(&root).unwrap();
        assert_eq!(content, "RecordCount: 2\r\n1,R\r\nRecordCount: 10");
    }
}
