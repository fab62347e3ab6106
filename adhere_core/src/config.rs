//! Configuration file support for adhere.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/adhere/config.toml`.

use crate::engine::DEFAULT_GAP_TOLERANCE_DAYS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub adherence: AdherenceConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Refill and gap-detection parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdherenceConfig {
    #[serde(default = "default_gap_tolerance_days")]
    pub gap_tolerance_days: u32,

    #[serde(default = "default_supply_days")]
    pub default_supply_days: u32,

    /// Supply lengths the pharmacy usually dispenses. Other values are
    /// still accepted, with a warning.
    #[serde(default = "default_supply_options")]
    pub supply_options: Vec<u32>,
}

impl Default for AdherenceConfig {
    fn default() -> Self {
        Self {
            gap_tolerance_days: default_gap_tolerance_days(),
            default_supply_days: default_supply_days(),
            supply_options: default_supply_options(),
        }
    }
}

impl AdherenceConfig {
    pub fn is_usual_supply(&self, days: i64) -> bool {
        self.supply_options.iter().any(|&o| i64::from(o) == days)
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("adhere")
}

fn default_gap_tolerance_days() -> u32 {
    DEFAULT_GAP_TOLERANCE_DAYS
}

fn default_supply_days() -> u32 {
    30
}

fn default_supply_options() -> Vec<u32> {
    vec![30, 90]
}

fn home_dir() -> PathBuf {
    dirs::home_dir()
        .or_else(|| std::env::var_os("HOME").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("adhere").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.adherence.default_supply_days == 0 {
            return Err(Error::Config(
                "adherence.default_supply_days must be positive".into(),
            ));
        }
        if self.adherence.supply_options.contains(&0) {
            return Err(Error::Config(
                "adherence.supply_options must all be positive".into(),
            ));
        }
        Ok(())
    }
}
