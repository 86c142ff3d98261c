//! husk: a C ABI for shell parsing, quoting and expansion
//!
//! The host drives the engine in `husk-syntax` through the `extern "C"`
//! functions in [`ffi`] (declared in `include/husk.h`). Syntax trees,
//! string arrays, positions, parser settings and errors stay on this side
//! and are named by opaque [`Handle`]s; the host releases each one exactly
//! once with `husk_release`.
//!
//! [`Bridge`] is the same surface for Rust callers: one registry plus the
//! configuration that supplies engine defaults.
//!
//! ```
//! use husk::Bridge;
//! use husk_config::BridgeConfig;
//! use std::collections::HashMap;
//!
//! let bridge = Bridge::new(BridgeConfig::default());
//! let env = HashMap::from([("X".to_string(), "a b".to_string())]);
//! let fields = bridge.fields("$X c", &env).unwrap();
//! let items = bridge.registry().with_strings(fields, |items| items.to_vec()).unwrap();
//! assert_eq!(items, ["a", "b", "c"]);
//! bridge.registry().release(fields).unwrap();
//! ```

pub mod error;
pub mod ffi;
pub mod marshal;
pub mod registry;
pub mod stream;

pub use error::{classify, BridgeError, ErrorKind, HuskError};
pub use marshal::MarshalError;
pub use registry::{Handle, Object, ObjectKind, Registry, RegistryError};
pub use stream::{ForeignReader, ForeignStreamError, HuskReadFn, HuskReadOutcome};

use husk_config::bridge::DEFAULT_LOG_FILTER;
use husk_config::{BridgeConfig, ConfigLoader, ConfigResult};
use husk_syntax::expand::{self, Environ};
use husk_syntax::{quote, LangVariant, Parser, Pos};
use std::io::Read;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static GLOBAL: OnceLock<Bridge> = OnceLock::new();

/// A handle registry together with the settings its operations use
pub struct Bridge {
    registry: Registry,
    config: BridgeConfig,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            registry: Registry::new(),
            config,
        }
    }

    /// The process-wide bridge behind the C functions.
    ///
    /// Created on first use from the default configuration layers unless
    /// [`Bridge::init`] got there first. A configuration that fails to load
    /// is logged and replaced by the built-in defaults.
    pub fn global() -> &'static Bridge {
        GLOBAL.get_or_init(|| {
            let config = ConfigLoader::new().load().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "falling back to default configuration");
                BridgeConfig::default()
            });
            Bridge::new(config)
        })
    }

    /// Load configuration, install logging and create the global bridge.
    ///
    /// Returns `Ok(false)` if the global bridge already existed; it is left
    /// as it was.
    pub fn init(config_path: Option<PathBuf>) -> ConfigResult<bool> {
        if GLOBAL.get().is_some() {
            return Ok(false);
        }
        let loader = match config_path {
            Some(path) => ConfigLoader::with_path(path),
            None => ConfigLoader::new(),
        };
        let config = loader.load()?;
        let filter = config.log_filter.clone();

        // A bridge created concurrently keeps the logging it came with
        let created = GLOBAL.set(Bridge::new(config)).is_ok();
        if created {
            init_logging(&filter);
        }
        tracing::debug!(created, "bridge initialized");
        Ok(created)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Classify an error and hand it to the host
    pub fn report(&self, err: impl Into<BridgeError>) -> HuskError {
        let err = err.into();
        let kind = classify(&err);
        tracing::debug!(?kind, error = %err, "reporting error");
        let detail = self.registry.register(Object::Error(err));
        HuskError {
            kind: kind.code(),
            detail: detail.raw(),
        }
    }

    // === Shell ===

    pub fn expand<E: Environ>(&self, text: &str, env: &E) -> Result<String, BridgeError> {
        Ok(expand::expand(text, env)?)
    }

    /// Expand `text` into fields, returned as a string array handle
    pub fn fields<E: Environ>(&self, text: &str, env: &E) -> Result<Handle, BridgeError> {
        let fields = expand::fields(text, env)?;
        Ok(self.registry.register(Object::Strings(fields)))
    }

    // === Syntax ===

    pub fn quote(&self, text: &str, variant: LangVariant) -> Result<String, BridgeError> {
        Ok(quote::quote(text, variant)?)
    }

    /// Register parser settings; `None` knobs take the configured defaults
    pub fn new_parser(
        &self,
        keep_comments: Option<bool>,
        stop_at: Option<String>,
        variant: Option<LangVariant>,
    ) -> Handle {
        let mut parser = Parser::new()
            .keep_comments(keep_comments.unwrap_or(self.config.keep_comments))
            .variant(variant.unwrap_or(self.config.default_variant));
        if let Some(word) = stop_at {
            parser = parser.stop_at(word);
        }
        self.registry.register(Object::Parser(parser))
    }

    /// Parse a program pulled from `reader` and register the syntax tree
    pub fn parse<R: Read>(&self, parser: &Parser, reader: R, name: &str) -> Result<Handle, BridgeError> {
        let file = parser.parse(reader, name)?;
        tracing::debug!(name, stmts = file.stmts.len(), "parsed");
        Ok(self.registry.register(Object::File(file)))
    }

    pub fn new_pos(&self, offset: u32, line: u32, col: u32) -> Handle {
        self.registry.register(Object::Pos(Pos::new(offset, line, col)))
    }
}

/// Install a stderr `tracing` subscriber unless the process already has one
fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
