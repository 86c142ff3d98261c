//! Resolved bridge settings

use crate::file::ConfigFile;
use crate::{ConfigError, ConfigResult};
use husk_syntax::LangVariant;

/// Default size of one host read
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// Upper bound for `read_chunk_size`
pub const MAX_READ_CHUNK_SIZE: usize = 1 << 20;

/// Default `tracing` filter
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Effective bridge configuration, after all layers are merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Largest buffer handed to the host read callback; 1 reads byte by byte
    pub read_chunk_size: usize,
    /// Variant used when the host passes no variant to a new parser
    pub default_variant: LangVariant,
    /// Whether new parsers keep comments when the host doesn't say
    pub keep_comments: bool,
    /// `tracing` filter directive installed by `husk_init`
    pub log_filter: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            default_variant: LangVariant::default(),
            keep_comments: false,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Apply the values set in a config file
    pub fn merge_file(&mut self, file: &ConfigFile) {
        if let Some(parser) = &file.parser {
            if let Some(variant) = parser.variant {
                self.default_variant = variant;
            }
            if let Some(keep) = parser.keep_comments {
                self.keep_comments = keep;
            }
        }
        if let Some(size) = file.stream.as_ref().and_then(|s| s.read_chunk_size) {
            self.read_chunk_size = size;
        }
        if let Some(filter) = file.log.as_ref().and_then(|l| l.filter.clone()) {
            self.log_filter = filter;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        validate_chunk_size("read_chunk_size", self.read_chunk_size)?;
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_filter".to_string(),
                reason: "filter must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn validate_chunk_size(field: &str, size: usize) -> ConfigResult<()> {
    if size == 0 || size > MAX_READ_CHUNK_SIZE {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("must be between 1 and {MAX_READ_CHUNK_SIZE}, got {size}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{LogSection, ParserSection};

    #[test]
    fn test_defaults_are_valid() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_variant, LangVariant::Bash);
        assert!(!config.keep_comments);
    }

    #[test]
    fn test_merge_file_only_touches_set_values() {
        let mut config = BridgeConfig::default();
        config.merge_file(&ConfigFile {
            parser: Some(ParserSection {
                variant: Some(LangVariant::Posix),
                keep_comments: None,
            }),
            log: Some(LogSection {
                filter: Some("debug".to_string()),
            }),
            ..Default::default()
        });
        assert_eq!(config.default_variant, LangVariant::Posix);
        assert!(!config.keep_comments);
        assert_eq!(config.read_chunk_size, DEFAULT_READ_CHUNK_SIZE);
        assert_eq!(config.log_filter, "debug");
    }
}
