//! Configuration loading tests
//!
//! Every test touching HUSK_* variables runs under `#[serial]` and clears them
//! first, so the process environment never leaks between cases.

use husk_config::bridge::{DEFAULT_READ_CHUNK_SIZE, MAX_READ_CHUNK_SIZE};
use husk_config::loader::{
    ENV_CONFIG, ENV_KEEP_COMMENTS, ENV_LOG, ENV_READ_CHUNK_SIZE, ENV_VARIANT,
};
use husk_config::{BridgeConfig, ConfigError, ConfigLoader};
use husk_syntax::LangVariant;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    for var in [
        ENV_CONFIG,
        ENV_READ_CHUNK_SIZE,
        ENV_VARIANT,
        ENV_KEEP_COMMENTS,
        ENV_LOG,
    ] {
        env::remove_var(var);
    }
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// File loading
// ============================================================================

#[test]
#[serial]
fn test_explicit_file_is_merged_over_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[parser]
variant = "posix"

[stream]
read_chunk_size = 1
"#,
    );

    let config = ConfigLoader::with_path(&path).load().unwrap();
    assert_eq!(
        config,
        BridgeConfig {
            read_chunk_size: 1,
            default_variant: LangVariant::Posix,
            ..BridgeConfig::default()
        }
    );
}

#[test]
#[serial]
fn test_husk_config_variable_names_the_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[parser]\nkeep_comments = true\n");
    env::set_var(ENV_CONFIG, &path);

    let config = ConfigLoader::new().load().unwrap();
    clear_env();
    assert!(config.keep_comments);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_not_found() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = ConfigLoader::with_path(&path).load().unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(p) if p == path));
}

#[test]
#[serial]
fn test_invalid_toml_names_the_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[parser\nvariant = ");

    let err = ConfigLoader::with_path(&path).load().unwrap_err();
    match err {
        ConfigError::TomlParseError { file, .. } => assert_eq!(file, path),
        other => panic!("expected a TOML error, got {other:?}"),
    }
}

#[rstest]
#[case("[stream]\nread_chunk_size = 0\n")]
#[case("[log]\nfilter = \"  \"\n")]
#[case("[parser]\nvariant = \"zsh\"\n")]
#[case("[parser]\nunknown = 1\n")]
#[serial]
fn test_rejected_files(#[case] content: &str) {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, content);
    assert!(ConfigLoader::with_path(&path).load().is_err());
}

// ============================================================================
// Environment overrides
// ============================================================================

#[test]
#[serial]
fn test_environment_overrides_the_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[parser]
variant = "mksh"
keep_comments = true

[log]
filter = "info"
"#,
    );
    env::set_var(ENV_VARIANT, "sh");
    env::set_var(ENV_KEEP_COMMENTS, "no");
    env::set_var(ENV_READ_CHUNK_SIZE, "512");
    env::set_var(ENV_LOG, "husk=trace");

    let config = ConfigLoader::with_path(&path).load().unwrap();
    clear_env();
    assert_eq!(
        config,
        BridgeConfig {
            read_chunk_size: 512,
            default_variant: LangVariant::Posix,
            keep_comments: false,
            log_filter: "husk=trace".to_string(),
        }
    );
}

#[rstest]
#[case("true", true)]
#[case("1", true)]
#[case("YES", true)]
#[case("false", false)]
#[case("0", false)]
#[serial]
fn test_keep_comments_override(#[case] value: &str, #[case] expected: bool) {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    env::set_var(ENV_KEEP_COMMENTS, value);

    let config = ConfigLoader::with_path(&path).load().unwrap();
    clear_env();
    assert_eq!(config.keep_comments, expected);
}

#[rstest]
#[case(ENV_READ_CHUNK_SIZE, "lots")]
#[case(ENV_READ_CHUNK_SIZE, "0")]
#[case(ENV_VARIANT, "fish")]
#[serial]
fn test_invalid_environment_values(#[case] var: &str, #[case] value: &str) {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    env::set_var(var, value);

    let err = ConfigLoader::with_path(&path).load().unwrap_err();
    clear_env();
    assert!(matches!(err, ConfigError::InvalidValue { .. }), "{err:?}");
}

#[test]
#[serial]
fn test_chunk_size_upper_bound() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    env::set_var(ENV_READ_CHUNK_SIZE, MAX_READ_CHUNK_SIZE.to_string());
    assert_eq!(
        ConfigLoader::with_path(&path).load().unwrap().read_chunk_size,
        MAX_READ_CHUNK_SIZE
    );

    env::set_var(ENV_READ_CHUNK_SIZE, (MAX_READ_CHUNK_SIZE + 1).to_string());
    let result = ConfigLoader::with_path(&path).load();
    clear_env();
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_empty_file_gives_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");

    let config = ConfigLoader::with_path(&path).load().unwrap();
    assert_eq!(config, BridgeConfig::default());
    assert_eq!(config.read_chunk_size, DEFAULT_READ_CHUNK_SIZE);
}
