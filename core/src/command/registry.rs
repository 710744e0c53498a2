//! Command registry
//!
//! Built once at startup and shared by reference with the loader and the
//! controller. Lookups are case-insensitive and check primary names before
//! aliases.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use tasplay_shared::CommandInfo;

use super::{AutoComplete, Command, ExecuteTiming, RuntimeContext, TasCommand};
use crate::error::CommandError;

/// A registered command: name, behavior flags and handler
pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
    timing: ExecuteTiming,
    legal_in_restricted_mode: bool,
    calc_checksum: bool,
    insert: Option<String>,
    has_arguments: bool,
    handler: Box<dyn TasCommand>,
    auto_complete: Option<Box<dyn AutoComplete>>,
}

impl CommandSpec {
    /// New runtime command that is legal in restricted mode and hashed
    /// into the checksum
    pub fn new(name: impl Into<String>, handler: impl TasCommand + 'static) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            timing: ExecuteTiming::RUNTIME,
            legal_in_restricted_mode: true,
            calc_checksum: true,
            insert: None,
            has_arguments: false,
            handler: Box::new(handler),
            auto_complete: None,
        }
    }

    /// Runtime command backed by a closure
    pub fn from_fn<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut RuntimeContext<'_>, &Command) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Self::new(name, FnCommand(run))
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn timing(mut self, timing: ExecuteTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn illegal_in_restricted_mode(mut self) -> Self {
        self.legal_in_restricted_mode = false;
        self
    }

    pub fn exclude_from_checksum(mut self) -> Self {
        self.calc_checksum = false;
        self
    }

    /// Snippet for the editor, e.g. `Read, file, start, end`
    pub fn insert(mut self, insert: impl Into<String>) -> Self {
        self.insert = Some(insert.into());
        self.has_arguments = true;
        self
    }

    pub fn auto_complete(mut self, provider: impl AutoComplete + 'static) -> Self {
        self.auto_complete = Some(Box::new(provider));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn execute_timing(&self) -> ExecuteTiming {
        self.timing
    }

    pub fn is_legal_in_restricted_mode(&self) -> bool {
        self.legal_in_restricted_mode
    }

    pub fn calc_checksum(&self) -> bool {
        self.calc_checksum
    }

    pub fn handler(&self) -> &dyn TasCommand {
        self.handler.as_ref()
    }

    pub fn auto_completer(&self) -> Option<&dyn AutoComplete> {
        self.auto_complete.as_deref()
    }

    pub fn info(&self) -> CommandInfo {
        CommandInfo {
            name: self.name.clone(),
            insert: self.insert.clone().unwrap_or_else(|| self.name.clone()),
            has_arguments: self.has_arguments,
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("timing", &self.timing)
            .field("legal_in_restricted_mode", &self.legal_in_restricted_mode)
            .field("calc_checksum", &self.calc_checksum)
            .finish_non_exhaustive()
    }
}

/// Runtime handler from a closure
pub struct FnCommand<F>(pub F);

impl<F> TasCommand for FnCommand<F>
where
    F: Fn(&mut RuntimeContext<'_>, &Command) -> Result<(), CommandError> + Send + Sync,
{
    fn run(&self, ctx: &mut RuntimeContext<'_>, command: &Command) -> Result<(), CommandError> {
        (self.0)(ctx, command)
    }
}

/// Registry of commands
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<CommandSpec>>,
    /// Lowercased primary name -> index
    names: HashMap<String, usize>,
    /// Lowercased alias -> index
    aliases: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `Read`, `Play`, `Repeat` and the other built-in commands
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::builtin::register_builtins(&mut registry);
        registry
    }

    /// Register a command, replacing any command with the same name
    pub fn register(&mut self, spec: CommandSpec) {
        let key = spec.name.to_lowercase();
        let spec = Arc::new(spec);

        let index = match self.names.get(&key) {
            Some(&index) => {
                tracing::warn!("Command '{}' registered twice, replacing", spec.name);
                self.aliases.retain(|_, existing| *existing != index);
                self.commands[index] = Arc::clone(&spec);
                index
            }
            None => {
                self.commands.push(Arc::clone(&spec));
                self.names.insert(key, self.commands.len() - 1);
                self.commands.len() - 1
            }
        };

        for alias in &spec.aliases {
            let alias_key = alias.to_lowercase();
            if self.names.contains_key(&alias_key) {
                tracing::warn!(
                    "Alias '{}' of '{}' shadows a command name - ignored",
                    alias,
                    spec.name
                );
                continue;
            }
            if let Some(previous) = self.aliases.insert(alias_key, index)
                && previous != index
            {
                tracing::warn!(
                    "Alias '{}' moved from '{}' to '{}'",
                    alias,
                    self.commands[previous].name,
                    spec.name
                );
            }
        }
    }

    /// Find a command by name or alias, ignoring case
    pub fn resolve(&self, name: &str) -> Option<&Arc<CommandSpec>> {
        let key = name.to_lowercase();
        self.names
            .get(&key)
            .or_else(|| self.aliases.get(&key))
            .map(|&index| &self.commands[index])
    }

    /// Editor listing in registration order
    pub fn list(&self) -> Vec<CommandInfo> {
        self.commands.iter().map(|spec| spec.info()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandSpec>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.commands.iter().map(|spec| spec.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;
    impl TasCommand for Noop {}

    #[test]
    fn test_resolve_case_insensitive() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandSpec::new("Read", Noop).alias("Include"));

        let upper = registry.resolve("READ").unwrap();
        let lower = registry.resolve("read").unwrap();
        assert!(Arc::ptr_eq(upper, lower));

        let alias = registry.resolve("include").unwrap();
        assert!(Arc::ptr_eq(alias, lower));
        assert!(registry.resolve("Play").is_none());
    }

    #[test]
    fn test_names_win_over_aliases() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandSpec::new("Safe", Noop));
        registry.register(CommandSpec::new("Unsafe", Noop).alias("safe"));

        assert_eq!(registry.resolve("safe").unwrap().name(), "Safe");
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandSpec::new("Console", Noop).alias("Con"));
        registry.register(CommandSpec::new("console", Noop).exclude_from_checksum());

        assert_eq!(registry.len(), 1);
        assert!(!registry.resolve("Console").unwrap().calc_checksum());
        assert!(registry.resolve("Con").is_none());
    }

    #[test]
    fn test_list() {
        let mut registry = CommandRegistry::new();
        registry.register(CommandSpec::new("EndRepeat", Noop));
        registry.register(CommandSpec::new("Repeat", Noop).insert("Repeat 2"));

        let list = registry.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].insert, "EndRepeat");
        assert!(!list[0].has_arguments);
        assert_eq!(list[1].insert, "Repeat 2");
        assert!(list[1].has_arguments);
    }

    #[test]
    fn test_spec_defaults() {
        let spec = CommandSpec::from_fn("Console", |_, _| Ok(()));
        assert_eq!(spec.execute_timing(), ExecuteTiming::RUNTIME);
        assert!(spec.is_legal_in_restricted_mode());
        assert!(spec.calc_checksum());
        assert!(spec.auto_completer().is_none());
    }
}
