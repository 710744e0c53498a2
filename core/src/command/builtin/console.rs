//! `Console, command[, args...]`

use crate::command::{Command, CommandSpec, RuntimeContext, TasCommand};
use crate::error::CommandError;

pub(super) fn spec() -> CommandSpec {
    CommandSpec::new("Console", ConsoleCommand)
        .illegal_in_restricted_mode()
        .insert("Console, command")
}

struct ConsoleCommand;

impl TasCommand for ConsoleCommand {
    fn run(&self, ctx: &mut RuntimeContext<'_>, command: &Command) -> Result<(), CommandError> {
        if command.args().is_empty() {
            return Err(CommandError::MissingArgument("command"));
        }
        ctx.host.console(command.args())
    }
}
