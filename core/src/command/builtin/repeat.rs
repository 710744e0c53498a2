//! `Repeat, count` ... `EndRepeat`
//!
//! The lines between the two commands are read `count` times. Blocks nest;
//! an `EndRepeat` closes the innermost open `Repeat`.

use crate::command::{Command, CommandSpec, ExecuteTiming, TasCommand};
use crate::error::CommandError;
use crate::input::RepeatInfo;
use crate::loader::{PendingRepeat, ScriptParser};

pub(super) fn specs() -> [CommandSpec; 2] {
    [
        CommandSpec::new("Repeat", RepeatCommand)
            .timing(ExecuteTiming::PARSE)
            .insert("Repeat, 2\n\nEndRepeat"),
        CommandSpec::new("EndRepeat", EndRepeatCommand).timing(ExecuteTiming::PARSE),
    ]
}

struct RepeatCommand;

impl TasCommand for RepeatCommand {
    fn parse(&self, parser: &mut ScriptParser<'_>, command: &Command) -> Result<(), CommandError> {
        let text = command.arg(0).ok_or(CommandError::MissingArgument("count"))?;
        let count: u32 = text
            .trim()
            .parse()
            .map_err(|_| CommandError::invalid(text, "not a whole number"))?;
        if count < 1 {
            return Err(CommandError::invalid(text, "must be at least 1"));
        }

        parser.repeats.push(PendingRepeat {
            file_path: std::sync::Arc::clone(&command.file_path),
            file_line: command.file_line,
            count,
            first_input: parser.input_count(),
        });
        Ok(())
    }
}

struct EndRepeatCommand;

impl TasCommand for EndRepeatCommand {
    fn parse(&self, parser: &mut ScriptParser<'_>, command: &Command) -> Result<(), CommandError> {
        // A block must open and close in the same file
        if parser
            .repeats
            .last()
            .is_none_or(|open| open.file_path != command.file_path)
        {
            return Err(CommandError::Unmatched("EndRepeat"));
        }
        let Some(open) = parser.repeats.pop() else {
            return Err(CommandError::Unmatched("EndRepeat"));
        };

        let start_line = open.file_line + 1;
        let end_line = command.file_line.saturating_sub(1);
        if open.count < 2 || start_line > end_line {
            return Ok(());
        }

        let is_root = parser.is_root(&command.file_path);
        if is_root {
            parser.timeline_mut().mark_repeat(open.first_input, open.count);
        }

        let lines = parser.file_lines(&command.file_path)?;
        for index in 2..=open.count {
            let (studio_line, repeat) = if is_root {
                (start_line - 1, RepeatInfo::new(index, open.count))
            } else {
                (command.studio_line, RepeatInfo::NONE)
            };
            parser.read_lines(
                &command.file_path,
                &lines,
                start_line,
                end_line,
                studio_line,
                repeat,
            );
        }
        Ok(())
    }
}
