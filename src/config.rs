//! Editor configuration.
//!
//! Stored as JSON. The file is optional: a missing file means defaults.
//!
//! # Config file location
//!
//! Priority order:
//! 1. `$PHOTO_SESSION_CONFIG` environment variable
//! 2. `<config dir>/photo-session/config.json` (e.g. `~/.config` on Linux)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::effects::Effect;
use crate::raster::{Codec, DEFAULT_JPEG_QUALITY};

/// Longest idle timeout accepted (one year)
const MAX_IDLE_TIMEOUT_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Tunables for an [`Editor`](crate::Editor)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct EditorConfig {
    /// JPEG quality for rendered previews (1-100)
    pub jpeg_quality: u8,

    /// Maximum undo depth per session
    /// - `None` keeps every committed image (bounded only by memory)
    /// - `Some(n)` drops the oldest entries beyond `n`
    pub history_limit: Option<usize>,

    /// Sessions untouched for this long are forgotten
    pub idle_timeout_secs: u64,

    /// How often the background reaper looks for idle sessions
    pub sweep_interval_secs: u64,

    /// Brightness change per "+" / "-" press
    pub brightness_step: i32,

    /// Contrast change per "+" / "-" press
    pub contrast_step: i32,

    /// Pixel block size change per "+" / "-" press
    pub pixelate_step: i32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            history_limit: None,
            idle_timeout_secs: 60 * 60,
            sweep_interval_secs: 60,
            brightness_step: 10,
            contrast_step: 10,
            pixelate_step: 1,
        }
    }
}

impl EditorConfig {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if no config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        info!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Get the config file path based on environment and platform.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PHOTO_SESSION_CONFIG") {
            return PathBuf::from(path);
        }

        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("photo-session");
        path.push("config.json");
        path
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Validation(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }

        if self.idle_timeout_secs == 0 || self.idle_timeout_secs > MAX_IDLE_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "idle_timeout_secs must be between 1 and {}, got {}",
                MAX_IDLE_TIMEOUT_SECS, self.idle_timeout_secs
            )));
        }

        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "sweep_interval_secs must be greater than 0".to_string(),
            ));
        }

        for (name, step) in [
            ("brightness_step", self.brightness_step),
            ("contrast_step", self.contrast_step),
            ("pixelate_step", self.pixelate_step),
        ] {
            if step <= 0 {
                return Err(ConfigError::Validation(format!(
                    "{} must be greater than 0, got {}",
                    name, step
                )));
            }
        }

        Ok(())
    }

    /// Parameter change per button press for `effect`
    pub fn step(&self, effect: Effect) -> i32 {
        match effect {
            Effect::Brightness => self.brightness_step,
            Effect::Contrast => self.contrast_step,
            Effect::Pixelate => self.pixelate_step,
        }
    }

    pub fn idle_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.idle_timeout_secs.min(MAX_IDLE_TIMEOUT_SECS) as i64)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn codec(&self) -> Codec {
        Codec::new(self.jpeg_quality)
    }
}
