//! Configuration file support for emvis.
//!
//! Settings are stored as JSON, by default in the user's config directory.
//! Every section falls back to defaults for missing fields so older files
//! keep loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color_utils;
use crate::format::Strictness;
use crate::model::Label;
use crate::picker::{MicrographMatching, PickShape, RelionLayout, RunLabels};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Get all log levels in order from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User preferences
    #[serde(default)]
    pub preferences: PickerPreferences,

    /// File names of RELION run directories
    #[serde(default)]
    pub relion: RelionLayout,

    /// Run comparison settings
    #[serde(default)]
    pub compare: CompareConfig,
}

fn default_app_name() -> String {
    "emvis".to_string()
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerPreferences {
    /// Box size overriding the model default
    pub box_size: Option<u32>,

    /// Shape of synthetic picks
    pub shape: PickShape,

    /// Handling of malformed coordinate lines
    pub strictness: Strictness,

    /// Initial score threshold of single-run models
    pub score_threshold: f64,

    /// Seed of the synthetic demo run
    pub demo_seed: u64,

    /// Log verbosity level
    pub log_level: LogLevel,
}

impl Default for PickerPreferences {
    fn default() -> Self {
        Self {
            box_size: None,
            shape: PickShape::default(),
            strictness: Strictness::default(),
            score_threshold: 0.0,
            demo_seed: 42,
            log_level: LogLevel::default(),
        }
    }
}

/// Run comparison section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Color of the primary run's picks
    pub color_a: String,
    /// Color of the second run's picks
    pub color_b: String,
    /// How micrographs of the two runs are paired
    pub matching: MicrographMatching,
}

impl Default for CompareConfig {
    fn default() -> Self {
        let labels = RunLabels::default();
        Self {
            color_a: labels.a.color,
            color_b: labels.b.color,
            matching: MicrographMatching::default(),
        }
    }
}

impl CompareConfig {
    /// Run labels with the configured colors.
    ///
    /// Colors that are not `#RRGGBB`/`#AARRGGBB` fall back to the defaults.
    pub fn run_labels(&self) -> RunLabels {
        let defaults = RunLabels::default();
        RunLabels {
            a: Label::new(&defaults.a.name, checked_color(&self.color_a, &defaults.a.color)),
            b: Label::new(&defaults.b.name, checked_color(&self.color_b, &defaults.b.color)),
        }
    }
}

fn checked_color<'a>(color: &'a str, fallback: &'a str) -> &'a str {
    if color_utils::is_hex_color(color) {
        color
    } else {
        log::warn!("Ignoring invalid color {:?}, using {}", color, fallback);
        fallback
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: PickerPreferences::default(),
            relion: RelionLayout::default(),
            compare: CompareConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Read configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Write configuration to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "emvis-config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("emvis").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home| {
                home.join(".config")
                    .join("emvis")
                    .join(Self::default_filename())
            })
        }
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save(&path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Neither a config nor a home directory is known
    #[error("Could not determine config directory")]
    NoConfigDir,
}
