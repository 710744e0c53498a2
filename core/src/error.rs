//! Error types for loading, command execution and file watching

use std::path::PathBuf;

/// A script could not be loaded at all
///
/// Individual bad lines never produce this; they become diagnostics on the
/// timeline instead.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no script selected")]
    NoScript,
    #[error("script not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path.into())
        } else {
            LoadError::Io {
                path: path.into(),
                source,
            }
        }
    }
}

/// A command handler failed
///
/// Logged with the command's file and line, then ignored.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid argument '{value}': {reason}")]
    InvalidArgument { value: String, reason: String },
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("ambiguous file name '{name}', matches {candidates:?}")]
    AmbiguousFile {
        name: String,
        candidates: Vec<String>,
    },
    #[error("a file can't read itself")]
    SelfRead,
    #[error("read cycle: {0}")]
    ReadCycle(String),
    #[error("unmatched {0}")]
    Unmatched(&'static str),
    #[error("not supported by this host")]
    Unsupported,
    #[error("{0}")]
    Failed(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandError {
    pub fn invalid(value: impl Into<String>, reason: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// The file watcher could not be created
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to create file watcher: {0}")]
    Notify(#[from] notify::Error),
}

/// The configuration file could not be read or written
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_io_maps_to_not_found() {
        let err = LoadError::io(
            "a.tas",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, LoadError::NotFound(_)));
        assert_eq!(err.to_string(), "script not found: a.tas");

        let err = LoadError::io(
            "a.tas",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_command_error_messages() {
        assert_eq!(
            CommandError::invalid("abc", "expected a number").to_string(),
            "invalid argument 'abc': expected a number"
        );
        assert_eq!(
            CommandError::Unmatched("EndRepeat").to_string(),
            "unmatched EndRepeat"
        );
    }
}
