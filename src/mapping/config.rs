//! Configuration loader and validator
//!
//! Loads application settings (and optional seed profiles) from TOML files
//! in the configs/ directory.

use crate::mapping::profile::ProfileSet;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// Profiles used when the profile file does not exist yet
    #[serde(default)]
    pub profiles: ProfileSet,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Milliseconds between frames (16 ≈ 60 Hz)
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,

    /// Profile store namespace
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// JSON profile file; `None` keeps profiles in memory only
    #[serde(default = "default_profile_file")]
    pub profile_file: Option<PathBuf>,

    /// Name stamped on every synthesized event as its origin
    #[serde(default = "default_context")]
    pub context: String,

    /// Log live controller state of the first pad
    #[serde(default)]
    pub panel: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
            namespace: default_namespace(),
            profile_file: default_profile_file(),
            context: default_context(),
            panel: false,
        }
    }
}

fn default_frame_interval() -> u64 { 16 }
fn default_namespace() -> String { "global".to_string() }
fn default_profile_file() -> Option<PathBuf> { Some(PathBuf::from("profiles.json")) }
fn default_context() -> String { "padmap".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        info!("Loading configuration from: {}", path_ref.display());

        let content = std::fs::read_to_string(path_ref)?;
        let config = Self::parse(&content)?;

        info!("✓ Config parsed successfully");
        debug!("  - Frame interval: {} ms", config.settings.frame_interval_ms);
        debug!("  - Namespace: '{}'", config.settings.namespace);
        debug!("  - Seed profiles: {}", config.profiles.len());

        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from configs/default.toml
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("configs/default.toml")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.frame_interval_ms == 0 || self.settings.frame_interval_ms > 1000 {
            return Err(ConfigError::Invalid(
                "frame_interval_ms must be between 1 and 1000".into()
            ));
        }

        if self.settings.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("namespace must not be empty".into()));
        }

        if self.settings.context.trim().is_empty() {
            return Err(ConfigError::Invalid("context must not be empty".into()));
        }

        self.profiles.validate()
    }

    /// Seed profiles, or the built-in wildcard profile when none are configured
    pub fn seed_profiles(&self) -> ProfileSet {
        if self.profiles.is_empty() {
            ProfileSet::builtin()
        } else {
            self.profiles.clone()
        }
    }
}
