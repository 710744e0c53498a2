//! Script change detection
//!
//! Watches the directory of every file read by the last load and raises a
//! [`ReloadFlag`] from the notification thread. The controller polls the flag
//! before each tick; nothing else crosses threads.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use hashbrown::HashSet;
use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, DebouncedEventKind, Debouncer, new_debouncer};

use crate::error::WatchError;

/// Set when a watched script changed on disk
#[derive(Debug, Clone, Default)]
pub struct ReloadFlag(Arc<AtomicBool>);

impl ReloadFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Read and clear
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Which changed paths call for a reload
#[derive(Debug, Clone, Default)]
pub struct WatchTargets {
    files: HashSet<PathBuf>,
}

impl WatchTargets {
    pub fn new<'a>(files: impl IntoIterator<Item = &'a PathBuf>) -> Self {
        Self {
            files: files.into_iter().map(|path| normalize(path)).collect(),
        }
    }

    /// A file that was read, or any script next to one (a `Read` target may
    /// have been created since)
    pub fn is_relevant(&self, path: &Path) -> bool {
        let is_script = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(crate::command::builtin::read::EXTENSION));
        is_script || self.files.contains(&normalize(path))
    }

    /// Directories to watch, each once
    pub fn dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .files
            .iter()
            .filter_map(|file| file.parent().map(Path::to_path_buf))
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }
}

/// Canonical directory plus file name, so deleted files still compare equal
fn normalize(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|parent| parent.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// Live watch over the files of one load
///
/// Dropping it stops watching.
pub struct ScriptWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    dirs: Vec<PathBuf>,
}

impl ScriptWatcher {
    /// Start watching `files`, raising `flag` on changes
    ///
    /// Directories that can't be watched are logged and skipped.
    pub fn start(files: &[PathBuf], flag: ReloadFlag, debounce: Duration) -> Result<Self, WatchError> {
        let targets = WatchTargets::new(files);
        let dirs = targets.dirs();

        let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| match result {
            Ok(events) => {
                let changed = events.iter().any(|event| {
                    matches!(event.kind, DebouncedEventKind::Any) && targets.is_relevant(&event.path)
                });
                if changed {
                    tracing::trace!("Script change detected");
                    flag.set();
                }
            }
            Err(e) => tracing::warn!("File watch error: {}", e),
        })?;

        let watcher = debouncer.watcher();
        let mut watched = Vec::new();
        for dir in dirs {
            match watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => watched.push(dir),
                Err(e) => tracing::warn!("Not watching {}: {}", dir.display(), e),
            }
        }
        tracing::debug!("Watching {} directories", watched.len());

        Ok(Self {
            _debouncer: debouncer,
            dirs: watched,
        })
    }

    /// Directories actually being watched
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl std::fmt::Debug for ScriptWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptWatcher").field("dirs", &self.dirs).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reload_flag() {
        let flag = ReloadFlag::new();
        let shared = flag.clone();
        assert!(!flag.take());
        shared.set();
        assert!(flag.is_set());
        assert!(flag.take());
        assert!(!flag.is_set());
    }

    #[test]
    fn test_relevant_paths() {
        let dir = TempDir::new().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "").unwrap();
        let targets = WatchTargets::new(&[notes.clone()]);

        assert!(targets.is_relevant(&notes));
        assert!(targets.is_relevant(&dir.path().join("new.tas")));
        assert!(targets.is_relevant(&dir.path().join("UPPER.TAS")));
        assert!(!targets.is_relevant(&dir.path().join("other.txt")));

        // Still matches once the file is gone
        std::fs::remove_file(&notes).unwrap();
        assert!(targets.is_relevant(&notes));
    }

    #[test]
    fn test_dirs_deduplicated() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.tas");
        let b = dir.path().join("b.tas");
        let targets = WatchTargets::new(&[a, b]);
        assert_eq!(targets.dirs().len(), 1);
    }

    #[test]
    fn test_watcher_starts() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("main.tas");
        std::fs::write(&script, "1,R\n").unwrap();

        let watcher = ScriptWatcher::start(&[script], ReloadFlag::new(), Duration::from_millis(10)).unwrap();
        assert_eq!(watcher.dirs().len(), 1);
    }
}
