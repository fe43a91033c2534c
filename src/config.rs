//! LocalDB Interop Configuration
//!
//! Handles parsing and management of sqllocaldb.toml configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::ffi::{ApiPathResolver, Registry, StopOptions};

/// Name of the configuration file searched for by [`LocalDbConfig::find_and_load`].
pub const CONFIG_FILE_NAME: &str = "sqllocaldb.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching sqllocaldb.toml.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LocalDbConfig {
    /// Locating the native instance API
    #[serde(default)]
    pub native: NativeConfig,

    /// Defaults for instance operations
    #[serde(default)]
    pub instances: InstanceConfig,
}

impl LocalDbConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: LocalDbConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the current directory or parents.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
        Self::find_and_load(&cwd)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                // Reached root without finding config
                return Ok(Self::default());
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// A path resolver over `registry` honoring the `[native]` settings.
    pub fn resolver<R: Registry>(&self, registry: R) -> ApiPathResolver<R> {
        ApiPathResolver::new(registry)
            .with_override_version(self.native.override_version.clone())
            .with_library_path(self.native.library_path.clone())
    }
}

/// Native API location settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NativeConfig {
    /// Installed LocalDB version whose instance API to load instead of the latest
    #[serde(default)]
    pub override_version: Option<String>,

    /// Explicit path to SqlUserInstance.dll; the registry is not consulted
    #[serde(default)]
    pub library_path: Option<PathBuf>,
}

/// Defaults applied by the typed API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceConfig {
    /// LANGID for error messages; 0 follows the FormatMessage language order
    #[serde(default)]
    pub language_id: u32,

    /// Seconds to wait for an instance to stop; 0 returns immediately
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u32,

    /// How instances are shut down
    #[serde(default)]
    pub stop_options: StopOptions,
}

fn default_stop_timeout_secs() -> u32 {
    60
}

impl InstanceConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.stop_timeout_secs))
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            language_id: 0,
            stop_timeout_secs: default_stop_timeout_secs(),
            stop_options: StopOptions::default(),
        }
    }
}
