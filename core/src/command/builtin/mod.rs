//! Commands every registry starts with

pub mod console;
pub mod legality;
pub mod metadata;
pub mod play;
pub mod read;
pub mod repeat;

pub use metadata::{apply_line_updates, update_record_count};
pub use read::{ReadRange, find_target_file, resolve_line};

use super::CommandRegistry;

/// Register the built-in commands
pub fn register_builtins(registry: &mut CommandRegistry) {
    registry.register(read::spec());
    registry.register(play::spec());
    for spec in repeat::specs() {
        registry.register(spec);
    }
    registry.register(metadata::spec());
    for spec in legality::specs() {
        registry.register(spec);
    }
    registry.register(console::spec());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ExecuteTiming;

    #[test]
    fn test_builtins_registered() {
        let registry = CommandRegistry::with_builtins();
        for name in [
            "Read",
            "Play",
            "Repeat",
            "EndRepeat",
            "RecordCount",
            "EnforceLegal",
            "Safe",
            "Unsafe",
            "Console",
        ] {
            assert!(registry.resolve(name).is_some(), "{name} missing");
        }
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn test_builtin_metadata() {
        let registry = CommandRegistry::with_builtins();

        let read = registry.resolve("read").unwrap();
        assert_eq!(read.execute_timing(), ExecuteTiming::PARSE);
        assert!(read.auto_completer().is_some());

        let record = registry.resolve("RecordCount：").unwrap();
        assert_eq!(record.name(), "RecordCount");
        assert!(!record.calc_checksum());

        assert!(registry.resolve("Safe").unwrap().is_legal_in_restricted_mode());
        assert!(!registry.resolve("Unsafe").unwrap().is_legal_in_restricted_mode());
        assert!(!registry.resolve("Console").unwrap().is_legal_in_restricted_mode());
    }
}
