//! Commands command - print the registered script commands

use anyhow::Result;
use clap::Args;

use tasplay_core::CommandRegistry;
use tasplay_shared::CommandInfo;

/// Arguments for the commands command
#[derive(Args)]
pub struct CommandsArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Execute the commands command
pub fn execute(args: CommandsArgs) -> Result<()> {
    let registry = CommandRegistry::with_builtins();

    if args.json {
        println!("{}", commands_json(&registry)?);
        return Ok(());
    }

    for spec in registry.iter() {
        let mut flags = Vec::new();
        if !spec.is_legal_in_restricted_mode() {
            flags.push("illegal in restricted mode");
        }
        if !spec.calc_checksum() {
            flags.push("not checksummed");
        }
        let aliases = if spec.aliases().is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", spec.aliases().join(", "))
        };
        println!(
            "{:<14}{:?}{}{}",
            spec.name(),
            spec.execute_timing(),
            aliases,
            if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join(", "))
            }
        );
    }
    Ok(())
}

/// Command list in the shape an editor receives
fn commands_json(registry: &CommandRegistry) -> Result<String> {
    let commands: Vec<CommandInfo> = registry.list();
    Ok(serde_json::to_string_pretty(&commands)?)
}
