//! `EnforceLegal`, `Safe` and `Unsafe`

use crate::command::{Command, CommandSpec, ExecuteTiming, RuntimeContext, TasCommand};
use crate::error::CommandError;
use crate::loader::ScriptParser;

pub(super) fn specs() -> [CommandSpec; 3] {
    [
        CommandSpec::new("EnforceLegal", EnforceLegalCommand).timing(ExecuteTiming::PARSE),
        CommandSpec::new("Safe", SafeModeCommand(true)),
        CommandSpec::new("Unsafe", SafeModeCommand(false)).illegal_in_restricted_mode(),
    ]
}

/// Puts the whole run into restricted mode
struct EnforceLegalCommand;

impl TasCommand for EnforceLegalCommand {
    fn parse(&self, parser: &mut ScriptParser<'_>, _command: &Command) -> Result<(), CommandError> {
        parser.timeline_mut().set_enforce_legal();
        Ok(())
    }
}

struct SafeModeCommand(bool);

impl TasCommand for SafeModeCommand {
    fn run(&self, ctx: &mut RuntimeContext<'_>, _command: &Command) -> Result<(), CommandError> {
        ctx.host.set_safe_mode(self.0);
        Ok(())
    }
}
