//! Configuration for the quantiser.

use crate::core::index::EventIndex;
use crate::core::reducer::ReducerTable;
use crate::core::registry::SensorRegistry;
use crate::core::windowing::WindowDuration;
use crate::io::vectors::WriteOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration. Fields missing from a config file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length of each quantisation window
    pub window: WindowDuration,

    /// Output columns, in order. Empty means derive from the data.
    pub registry: SensorRegistry,

    /// Reduction rule per sensor category
    pub reduction: ReducerTable,

    /// Where and how feature vectors are written
    pub output: OutputConfig,

    /// Path for storing run statistics
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("adl-quantiser");

        Self {
            window: WindowDuration::from_secs(10),
            registry: SensorRegistry::default(),
            reduction: ReducerTable::default(),
            output: OutputConfig::default(),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("adl-quantiser")
            .join("config.json")
    }

    /// File holding accumulated run statistics.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("run_stats.json")
    }

    /// The configured registry, or one derived from `index` when none is set.
    pub fn registry_for(&self, index: &EventIndex) -> SensorRegistry {
        if self.registry.is_empty() {
            let derived = SensorRegistry::from_index(index);
            tracing::info!(sensors = derived.len(), "Derived sensor registry from data");
            derived
        } else {
            self.registry.clone()
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub include_headers: bool,
    pub append: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("quantised.csv"),
            include_headers: true,
            append: true,
        }
    }
}

impl OutputConfig {
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            include_headers: self.include_headers,
            append: self.append,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
