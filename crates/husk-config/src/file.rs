//! Configuration file (config.toml)
//!
//! Every section and key is optional; missing values keep their defaults.
//!
//! ```toml
//! [parser]
//! variant = "bash"
//! keep_comments = false
//!
//! [stream]
//! read_chunk_size = 4096
//!
//! [log]
//! filter = "husk=debug"
//! ```

use crate::{ConfigError, ConfigResult};
use husk_syntax::LangVariant;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of a husk config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Parser defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<ParserSection>,

    /// Foreign stream settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamSection>,

    /// Logging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<LogSection>,
}

/// Defaults for parser knobs the host leaves unset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ParserSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<LangVariant>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_comments: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StreamSection {
    /// Largest buffer handed to the host read callback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_chunk_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    /// A `tracing` filter directive, such as `warn` or `husk=debug`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl ConfigFile {
    /// Load a config file from disk
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let file: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        file.validate()?;
        Ok(file)
    }

    /// Check the values that the TOML types alone don't constrain
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(size) = self.stream.as_ref().and_then(|s| s.read_chunk_size) {
            crate::bridge::validate_chunk_size("stream.read_chunk_size", size)?;
        }
        if let Some(filter) = self.log.as_ref().and_then(|l| l.filter.as_deref()) {
            if filter.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "log.filter".to_string(),
                    reason: "filter must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
