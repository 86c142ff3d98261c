//! Husk Bridge Configuration
//!
//! Settings for the C bridge: how the foreign stream adapter reads, which
//! parser defaults apply when the host leaves a knob unset, and the log
//! filter.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Config file (`$HUSK_CONFIG`, or `husk/config.toml` in the user config directory)
//! 3. Environment variables (HUSK_*)
//!
//! # Example
//!
//! ```no_run
//! use husk_config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load().unwrap();
//! println!("reading {} bytes at a time", config.read_chunk_size);
//! ```

pub mod bridge;
pub mod file;
pub mod loader;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use bridge::BridgeConfig;
pub use file::ConfigFile;
pub use loader::ConfigLoader;
