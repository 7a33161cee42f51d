//! Krishi configuration.
//!
//! Loaded from `~/.krishi/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::Coordinates;

pub const API_URL_ENV: &str = "KRISHI_API_URL";
pub const MARKET_KEY_ENV: &str = "KRISHI_MARKET_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("latitude and longitude must be set together in {}", path.display())]
    PartialLocation { path: PathBuf },
}

/// Krishi configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Base URL of the disease/crop/fertilizer backend.
    pub api_base_url: String,

    pub weather_base_url: String,

    /// data.gov.in resource endpoint for mandi prices.
    pub market_base_url: String,
    pub market_api_key: String,
    pub market_state: String,
    pub market_limit: u32,

    /// Applies to connect, read, and write.
    pub timeout_ms: u64,

    /// How long the simulated soil analysis takes.
    pub soil_analysis_ms: u64,

    /// External text-to-speech program. The text is passed as the last argument.
    pub speech_command: Option<String>,

    pub language: String,

    /// When false, the device is treated as having no speech recognizer.
    pub voice_enabled: bool,

    /// Fixed position for devices without a geolocation sensor.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://krishi-e.onrender.com".to_string(),
            weather_base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            market_base_url:
                "https://api.data.gov.in/resource/35985678-0d79-46b4-9ed6-6f13308a1d24"
                    .to_string(),
            market_api_key: String::new(),
            market_state: "Tamil Nadu".to_string(),
            market_limit: 5,
            timeout_ms: 15_000,
            soil_analysis_ms: 2_000,
            speech_command: None,
            language: "en-US".to_string(),
            voice_enabled: true,
            latitude: None,
            longitude: None,
        }
    }
}

impl Config {
    /// Load config from `~/.krishi/config.toml`, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().ok_or(ConfigError::NoHome)?;
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load config from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.latitude.is_some() != config.longitude.is_some() {
            return Err(ConfigError::PartialLocation {
                path: path.to_path_buf(),
            });
        }

        Ok(config)
    }

    /// Apply `KRISHI_*` overrides. Blank values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = set(API_URL_ENV) {
            self.api_base_url = url;
        }
        if let Some(key) = set(MARKET_KEY_ENV) {
            self.market_api_key = key;
        }
    }

    /// The configured fixed position, if both halves are set.
    pub fn fixed_position(&self) -> Option<Coordinates> {
        Some(Coordinates {
            latitude: self.latitude?,
            longitude: self.longitude?,
        })
    }

    /// The config file path: `~/.krishi/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".krishi").join("config.toml"))
    }
}
