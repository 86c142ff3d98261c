//! husk_init and husk_teardown
//!
//! Kept in its own test binary: teardown releases every handle in the
//! process, which would pull the rug out from under concurrent tests.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use husk::ffi::*;
use husk::Bridge;
use husk_syntax::LangVariant;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_init_reads_config_and_teardown_releases_everything() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[parser]
variant = "mksh"

[stream]
read_chunk_size = 3

[log]
filter = "husk=debug"
"#,
    )
    .unwrap();

    let path = cstr(path.to_str().unwrap());
    assert!(unsafe { husk_init(path.as_ptr()) });
    // Already running
    assert!(!unsafe { husk_init(path.as_ptr()) });

    let config = Bridge::global().config();
    assert_eq!(config.read_chunk_size, 3);
    assert_eq!(config.default_variant, LangVariant::Mksh);

    // Reads are capped at the configured chunk size
    let parser = new_parser(None, None, None);
    let mut stream = Stream::new("echo one two three\n");
    let file = parse_stream(parser, &mut stream, "").unwrap();
    assert_eq!(stream.largest_cap, 3);
    assert!(stream.calls >= 7);

    let pos = husk_syntax_new_pos(1, 1, 2);
    let err = fields("$(true)", &[]).unwrap_err();
    assert_eq!(husk_live_handles(), 4);

    husk_release(pos);
    assert_eq!(husk_live_handles(), 3);

    // parser, file and the error object
    assert_eq!(husk_teardown(), 3);
    assert_eq!(husk_live_handles(), 0);
    let _ = (file, err);
}
