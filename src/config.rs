use crate::defaults;
use crate::error::{Result, VoxpickError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub listener: ListenerConfig,
    pub debounce: DebounceConfig,
    pub interim: InterimConfig,
    pub mute: MuteConfig,
}

/// Listener transport configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    pub port: u16,
}

/// Debounce window configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebounceConfig {
    pub window_ms: u64,
}

/// Interim (live partial) eligibility configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InterimConfig {
    pub min_length: usize,
    pub strong_triggers: Vec<String>,
}

/// Mute grace configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MuteConfig {
    pub default_grace_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: defaults::LISTENER_PORT,
        }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window_ms: defaults::DEBOUNCE_WINDOW_MS,
        }
    }
}

impl Default for InterimConfig {
    fn default() -> Self {
        Self {
            min_length: defaults::MIN_INTERIM_LENGTH,
            strong_triggers: defaults::STRONG_TRIGGERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for MuteConfig {
    fn default() -> Self {
        Self {
            default_grace_ms: defaults::MUTE_GRACE_MS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing, contains invalid TOML, or
    /// fails validation. Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VoxpickError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                VoxpickError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(VoxpickError::ConfigFileNotFound { .. }) => Self::default(),
            // Re-panic on invalid TOML or other errors
            Err(e) => panic!("Failed to load config from {}: {}", path.display(), e),
        }
    }

    /// Validate configured values.
    ///
    /// Strong triggers must be single word tokens: matching is whole-token,
    /// so a trigger containing whitespace or punctuation could never match
    /// and would silently disable early interim acceptance.
    pub fn validate(&self) -> Result<()> {
        for trigger in &self.interim.strong_triggers {
            if trigger.is_empty() || !trigger.chars().all(|c| c.is_alphanumeric()) {
                return Err(VoxpickError::ConfigInvalidValue {
                    key: "interim.strong_triggers".to_string(),
                    message: format!("'{}' is not a single word token", trigger),
                });
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXPICK_PORT → listener.port
    /// - VOXPICK_DEBOUNCE_MS → debounce.window_ms
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("VOXPICK_PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            self.listener.port = port;
        }

        if let Ok(window) = std::env::var("VOXPICK_DEBOUNCE_MS")
            && let Ok(window) = window.parse::<u64>()
        {
            self.debounce.window_ms = window;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxpick/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("voxpick")
            .join("config.toml")
    }
}
