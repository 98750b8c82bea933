//! Configuration file support for boxmark.
//!
//! Settings are stored as pretty-printed JSON. Every field except `version`
//! has a default, so older or partial files keep loading.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ANNOTATIONS_DIR, DEFAULT_DATA_ROOT, DEFAULT_DEPTH, IMAGE_EXTENSIONS, IMAGES_DIR, ZOOM_FACTOR,
};
use crate::dataset::DataLayout;

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

    /// Directory containing the images and annotations directories
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Images directory name under the data root
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    /// Annotations directory name under the data root
    #[serde(default = "default_annotations_dir")]
    pub annotations_dir: String,

    /// Image extensions shown when listing a directory
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Zoom step per wheel notch
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: f64,

    /// Store drawn boxes with min/max corners instead of draw direction
    #[serde(default = "default_normalize_boxes")]
    pub normalize_boxes: bool,

    /// Depth written for images opened without an annotation file
    #[serde(default = "default_depth")]
    pub default_depth: u8,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_data_root() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_ROOT)
}

fn default_images_dir() -> String {
    IMAGES_DIR.to_string()
}

fn default_annotations_dir() -> String {
    ANNOTATIONS_DIR.to_string()
}

fn default_image_extensions() -> Vec<String> {
    IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_zoom_factor() -> f64 {
    ZOOM_FACTOR
}

fn default_normalize_boxes() -> bool {
    true
}

fn default_depth() -> u8 {
    DEFAULT_DEPTH
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            data_root: default_data_root(),
            images_dir: default_images_dir(),
            annotations_dir: default_annotations_dir(),
            image_extensions: default_image_extensions(),
            zoom_factor: default_zoom_factor(),
            normalize_boxes: default_normalize_boxes(),
            default_depth: default_depth(),
            log_level: LogLevel::default(),
        }
    }

    /// Directory layout under `data_root`.
    pub fn layout(&self) -> DataLayout {
        DataLayout::with_dirs(&self.data_root, &self.images_dir, &self.annotations_dir)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        if config.zoom_factor.is_nan() || config.zoom_factor <= 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "zoom_factor",
                message: format!("must be greater than 1, got {}", config.zoom_factor),
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "boxmark-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("boxmark").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("boxmark")
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

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(&path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(path)
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

    /// A field holds a value the editor can't use
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
