//! Application configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::camera::{Flash, Lens, PictureOptions};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where captured artifacts are persisted.
    pub gallery: GalleryConfig,

    /// Default capture settings.
    pub capture: CaptureDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Gallery (camera roll) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// Root directory; photos and videos land in subdirectories.
    pub dir: PathBuf,

    /// Save every capture as soon as it is previewed.
    pub auto_save: bool,

    /// Remove the transient capture file after it has been saved.
    pub remove_source: bool,
}

/// Default capture parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureDefaults {
    /// Lens selected when a session opens.
    pub initial_lens: Lens,

    /// Flash mode selected when a session opens.
    pub initial_flash: Flash,

    /// Options for still captures.
    pub picture: PictureOptions,

    /// Upper bound for a single device call. `None` waits forever.
    pub operation_timeout_ms: Option<u64>,

    /// Upper bound for a recording to produce its file after stop.
    pub finalize_timeout_ms: Option<u64>,

    /// Directory the simulated device writes transient captures to.
    pub capture_dir: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "shutter_session=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            dir: dirs_default_gallery(),
            auto_save: false,
            remove_source: true,
        }
    }
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            initial_lens: Lens::Back,
            initial_flash: Flash::Off,
            picture: PictureOptions::default(),
            operation_timeout_ms: Some(10_000),
            finalize_timeout_ms: Some(30_000),
            capture_dir: std::env::temp_dir().join("shutter"),
        }
    }
}

impl CaptureDefaults {
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    pub fn finalize_timeout(&self) -> Option<Duration> {
        self.finalize_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("shutter").join("config.json")
}

/// Default gallery directory.
fn dirs_default_gallery() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("shutter").join("gallery")
}
