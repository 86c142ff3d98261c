//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::bridge::BridgeConfig;
use crate::file::ConfigFile;
use crate::{ConfigError, ConfigResult};
use husk_syntax::lang::UnknownVariant;
use std::env;
use std::path::PathBuf;

/// Path of the config file, overriding the default location
pub const ENV_CONFIG: &str = "HUSK_CONFIG";
pub const ENV_READ_CHUNK_SIZE: &str = "HUSK_READ_CHUNK_SIZE";
pub const ENV_VARIANT: &str = "HUSK_VARIANT";
pub const ENV_KEEP_COMMENTS: &str = "HUSK_KEEP_COMMENTS";
pub const ENV_LOG: &str = "HUSK_LOG";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Built-in defaults - lowest priority
/// 2. Config file - overrides defaults
/// 3. Environment variables (HUSK_*) - overrides the file
pub struct ConfigLoader {
    /// Explicit config file, taking the place of `$HUSK_CONFIG`
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Read the config file at `path` instead of looking one up
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load the effective configuration.
    ///
    /// A config file that was named explicitly must exist; the default one is
    /// optional.
    pub fn load(&self) -> ConfigResult<BridgeConfig> {
        let mut config = BridgeConfig::default();

        let explicit = self
            .config_path
            .clone()
            .or_else(|| env::var_os(ENV_CONFIG).map(PathBuf::from));
        match explicit {
            Some(path) => config.merge_file(&ConfigFile::load_from_file(&path)?),
            None => {
                if let Some(path) = Self::default_config_path().filter(|p| p.exists()) {
                    config.merge_file(&ConfigFile::load_from_file(&path)?);
                }
            }
        }

        self.apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Example: HUSK_READ_CHUNK_SIZE=1
    fn apply_env_overrides(&self, config: &mut BridgeConfig) -> ConfigResult<()> {
        if let Ok(size) = env::var(ENV_READ_CHUNK_SIZE) {
            config.read_chunk_size = size.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_READ_CHUNK_SIZE.to_string(),
                reason: format!("expected a positive integer, got '{size}'"),
            })?;
        }

        if let Ok(variant) = env::var(ENV_VARIANT) {
            config.default_variant = variant.trim().parse().map_err(|e: UnknownVariant| {
                ConfigError::InvalidValue {
                    field: ENV_VARIANT.to_string(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Ok(keep) = env::var(ENV_KEEP_COMMENTS) {
            config.keep_comments = matches!(keep.to_lowercase().as_str(), "true" | "1" | "yes");
        }

        if let Ok(filter) = env::var(ENV_LOG) {
            config.log_filter = filter;
        }

        Ok(())
    }

    /// The default config file location (`<config dir>/husk/config.toml`)
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("husk").join("config.toml"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
