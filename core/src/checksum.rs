//! Script checksums
//!
//! xxHash3 over the root path, the canonical text of every action line up
//! to a tick, and the text of every checksummed command anchored at or
//! before it. Only content that changes playback is hashed: comments,
//! blank lines, formatting and `RecordCount` don't affect the result.

use xxhash_rust::xxh3::Xxh3;

use crate::input::ScriptTimeline;

/// Checksum of everything that plays before `tick`
///
/// An entry straddling `tick` contributes only its ticks before it, so
/// lengthening the line a resume point sits in is still seen as a change.
pub fn checksum_up_to(timeline: &ScriptTimeline, tick: u32) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.update(timeline.root().to_string_lossy().as_bytes());

    for (index, input) in timeline.inputs().iter().enumerate() {
        let start = timeline.input_start(index);
        if start >= tick {
            break;
        }
        let covered = input.frames().min(tick - start);
        hasher.update(&[0]);
        hasher.update(input.text().as_bytes());
        hasher.update(&covered.to_le_bytes());
    }

    for command in timeline.commands() {
        if command.frame > tick {
            break;
        }
        if !command.spec.calc_checksum() {
            continue;
        }
        hasher.update(&[1]);
        hasher.update(&command.frame.to_le_bytes());
        hasher.update(command.checksum_text().as_bytes());
    }

    hasher.digest()
}

/// Checksum of the whole script
pub fn checksum(timeline: &ScriptTimeline) -> u64 {
    checksum_up_to(timeline, timeline.total_frames())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandRegistry;
    use crate::loader::load;
    use crate::test_utils::write_script;
    use tempfile::TempDir;

    fn checksum_of(dir: &TempDir, content: &str) -> u64 {
        let root = write_script(dir.path(), "main.tas", content);
        checksum(&load(&CommandRegistry::with_builtins(), &root).unwrap())
    }

    #[test]
    fn test_stable_across_loads() {
        let dir = TempDir::new().unwrap();
        let a = checksum_of(&dir, "10,R\n5,J\n");
        let b = checksum_of(&dir, "10,R\n5,J\n");
        assert_eq!(a, b);
    }

    #[test]
    fn test_ignores_comments_and_formatting() {
        let dir = TempDir::new().unwrap();
        let a = checksum_of(&dir, "10,R\n5,J\nRecordCount: 1\n");
        let b = checksum_of(&dir, "# note\n  10,r\n\n5,J\nRecordCount: 7\n");
        assert_eq!(a, b);
    }

    #[test]
    fn test_duration_change_detected() {
        let dir = TempDir::new().unwrap();
        let a = checksum_of(&dir, "10,R\n5,J\n");
        let b = checksum_of(&dir, "11,R\n5,J\n");
        assert_ne!(a, b);
    }

    #[test]
    fn test_commands_are_hashed() {
        let dir = TempDir::new().unwrap();
        let a = checksum_of(&dir, "10,R\nConsole, a\n5,J\n");
        let b = checksum_of(&dir, "10,R\nConsole, b\n5,J\n");
        let c = checksum_of(&dir, "10,R\n5,J\n");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_prefix_ignores_later_edits() {
        let dir = TempDir::new().unwrap();
        let root = write_script(dir.path(), "main.tas", "10,R\n5,J\n");
        let registry = CommandRegistry::with_builtins();
        let before = checksum_up_to(&load(&registry, &root).unwrap(), 10);

        write_script(dir.path(), "main.tas", "10,R\n50,X\n");
        let after = load(&registry, &root).unwrap();
        assert_eq!(checksum_up_to(&after, 10), before);
        assert_ne!(checksum_up_to(&after, 11), before);

        write_script(dir.path(), "main.tas", "9,R\n5,J\n");
        assert_ne!(checksum_up_to(&load(&registry, &root).unwrap(), 10), before);
    }
}
