//! Application configuration, read from `<data_dir>/config.json`.
//!
//! Every field has a default, so a missing file or a partial file both
//! work. A malformed file is reported to the caller, which falls back to
//! defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const APP_DIR: &str = "foldersess";
const CONFIG_FILE: &str = "config.json";

/// `WM_CLASS` values of common Linux file managers.
const DEFAULT_FILE_MANAGERS: &[&str] = &[
    "org.gnome.Nautilus",
    "Nautilus",
    "Nemo",
    "Thunar",
    "dolphin",
    "Caja",
    "Pcmanfm",
    "pcmanfm-qt",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Window classes treated as file-manager windows.
    pub file_manager_classes: Vec<String>,
    /// Command that opens a folder in the desktop shell.
    pub open_command: String,
    /// Pause after each folder opened during a restore.
    pub open_delay_ms: u64,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            file_manager_classes: DEFAULT_FILE_MANAGERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            open_command: "xdg-open".into(),
            open_delay_ms: 200,
            log_level: "warn".into(),
        }
    }
}

impl AppConfig {
    /// Load the config from `data_dir`. A missing file yields defaults.
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_path(data_dir);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&content)
            .map_err(|source| ConfigError::Parse { path, source })
    }

    /// Write this config to `data_dir`, creating the directory if needed.
    pub fn write(&self, data_dir: &Path) -> Result<PathBuf, ConfigError> {
        let path = config_path(data_dir);
        let io_err = |source| ConfigError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(data_dir).map_err(io_err)?;
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(io_err)?;
        Ok(path)
    }

    pub fn open_delay(&self) -> Duration {
        Duration::from_millis(self.open_delay_ms)
    }
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Platform data directory for session files, e.g.
/// `~/.local/share/foldersess`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.open_command, "xdg-open");
        assert_eq!(config.open_delay(), Duration::from_millis(200));
        assert!(config.file_manager_classes.iter().any(|c| c == "Nautilus"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            config_path(dir.path()),
            r#"{ "openDelayMs": 50, "fileManagerClasses": ["Thunar"] }"#,
        )
        .unwrap();

        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.open_delay_ms, 50);
        assert_eq!(config.file_manager_classes, vec!["Thunar".to_string()]);
        assert_eq!(config.open_command, "xdg-open");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(config_path(dir.path()), "{ nope").unwrap();
        assert!(matches!(AppConfig::load(dir.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("cfg");
        let config = AppConfig {
            open_command: "nemo".into(),
            ..AppConfig::default()
        };
        let path = config.write(&nested).unwrap();
        assert!(path.exists());
        assert_eq!(AppConfig::load(&nested).unwrap().open_command, "nemo");
    }
}
