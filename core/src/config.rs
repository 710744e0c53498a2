//! Playback configuration (`<config dir>/config.toml`)
//!
//! Handles loading, saving, and providing defaults for playback settings.
//! Every field has a serde default, so a partial or empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Speed used by `***` markers that don't specify one
pub const DEFAULT_FAST_FORWARD_SPEED: f32 = 400.0;

/// Playback configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Frames per update for `***` markers without a speed (default: 400)
    #[serde(default = "default_fast_forward_speed")]
    pub default_fast_forward_speed: f32,
    /// Load attempts before a run is aborted (default: 5)
    #[serde(default = "default_load_retries")]
    pub load_retries: u32,
    /// Delay between load attempts in milliseconds (default: 50)
    #[serde(default = "default_load_retry_delay_ms")]
    pub load_retry_delay_ms: u64,
    /// Reload automatically when a script file changes (default: true)
    #[serde(default = "default_true")]
    pub watch_files: bool,
    /// Debounce window for file events in milliseconds (default: 100)
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
    /// Skip commands that aren't legal in restricted mode (default: false)
    #[serde(default)]
    pub restricted_mode: bool,
}

fn default_fast_forward_speed() -> f32 {
    DEFAULT_FAST_FORWARD_SPEED
}
fn default_load_retries() -> u32 {
    5
}
fn default_load_retry_delay_ms() -> u64 {
    50
}
fn default_watch_debounce_ms() -> u64 {
    100
}
fn default_true() -> bool {
    true
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_fast_forward_speed: default_fast_forward_speed(),
            load_retries: default_load_retries(),
            load_retry_delay_ms: default_load_retry_delay_ms(),
            watch_files: default_true(),
            watch_debounce_ms: default_watch_debounce_ms(),
            restricted_mode: false,
        }
    }
}

impl PlaybackConfig {
    /// Default marker speed, falling back to the built-in one when invalid
    pub fn fast_forward_speed(&self) -> f32 {
        let speed = self.default_fast_forward_speed;
        if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            DEFAULT_FAST_FORWARD_SPEED
        }
    }

    pub fn load_retry_delay(&self) -> Duration {
        Duration::from_millis(self.load_retry_delay_ms)
    }

    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.watch_debounce_ms)
    }

    /// Check for values that will be ignored or clamped.
    ///
    /// Returns a list of warning messages.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let speed = self.default_fast_forward_speed;
        if !(speed.is_finite() && speed > 0.0) {
            warnings.push(format!(
                "default_fast_forward_speed {speed} is not a positive number, using {DEFAULT_FAST_FORWARD_SPEED}"
            ));
        } else if speed < 1.0 {
            warnings.push(format!(
                "default_fast_forward_speed {speed} is below 1, markers without a speed play in slow motion"
            ));
        }
        if self.watch_files && self.watch_debounce_ms == 0 {
            warnings.push("watch_debounce_ms is 0, every file event triggers a reload".to_string());
        }
        warnings
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\tasplay\config`
/// On macOS: `~/Library/Application Support/io.tasplay.tasplay`
/// On Linux: `~/.config/tasplay`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.tasplay", "", "tasplay")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from the platform config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> PlaybackConfig {
    match config_dir().map(|dir| load_from(&dir.join("config.toml"))) {
        Some(Ok(config)) => config,
        Some(Err(ConfigError::Io { .. })) | None => PlaybackConfig::default(),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid config: {}", e);
            PlaybackConfig::default()
        }
    }
}

/// Loads the configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<PlaybackConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Saves the configuration to the platform config directory.
///
/// Creates the directory if it doesn't exist.
pub fn save(config: &PlaybackConfig) -> Result<(), ConfigError> {
    match config_dir() {
        Some(dir) => save_to(config, &dir.join("config.toml")),
        None => Ok(()),
    }
}

/// Saves the configuration to an explicit path.
pub fn save_to(config: &PlaybackConfig, path: &Path) -> Result<(), ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(io_error)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = PlaybackConfig::default();
        assert_eq!(config.default_fast_forward_speed, 400.0);
        assert_eq!(config.load_retries, 5);
        assert_eq!(config.load_retry_delay(), Duration::from_millis(50));
        assert!(config.watch_files);
        assert!(!config.restricted_mode);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PlaybackConfig = toml::from_str("load_retries = 2\n").unwrap();
        assert_eq!(config.load_retries, 2);
        assert_eq!(config.watch_debounce_ms, 100);

        let empty: PlaybackConfig = toml::from_str("").unwrap();
        assert_eq!(empty, PlaybackConfig::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = PlaybackConfig {
            restricted_mode: true,
            default_fast_forward_speed: 60.0,
            ..Default::default()
        };
        save_to(&config, &path).unwrap();

        assert_eq!(load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(load_from(&missing), Err(ConfigError::Io { .. })));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "load_retries = \"many\"").unwrap();
        assert!(matches!(load_from(&bad), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_warnings() {
        let config = PlaybackConfig {
            default_fast_forward_speed: 0.0,
            watch_debounce_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate().len(), 2);
        assert_eq!(config.fast_forward_speed(), DEFAULT_FAST_FORWARD_SPEED);

        let slow = PlaybackConfig {
            default_fast_forward_speed: 0.5,
            ..Default::default()
        };
        assert_eq!(slow.validate().len(), 1);
        assert_eq!(slow.fast_forward_speed(), 0.5);
    }
}
