//! Registry and classification through the Rust API
//!
//! Each test builds its own [`Bridge`], so handle counts are exact.

use husk::{classify, Bridge, BridgeError, ErrorKind, Handle, Object, RegistryError};
use husk_config::BridgeConfig;
use husk_syntax::expand::{ExitStatus, FnEnviron};
use husk_syntax::{LangVariant, Pos};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use std::collections::HashMap;
use std::io::{self, Read};

fn bridge() -> Bridge {
    Bridge::new(BridgeConfig::default())
}

fn no_vars() -> HashMap<String, String> {
    HashMap::new()
}

// ============================================================================
// Handle registry
// ============================================================================

#[test]
fn test_resolve_before_release_and_not_after() {
    let bridge = bridge();
    let registry = bridge.registry();
    let handle = bridge.new_pos(3, 1, 4);

    assert_eq!(registry.pos(handle).unwrap(), Pos::new(3, 1, 4));
    assert_eq!(registry.live(), 1);

    registry.release(handle).unwrap();
    assert_eq!(registry.live(), 0);
    assert_eq!(
        registry.resolve(handle).unwrap_err(),
        RegistryError::InvalidHandle(handle)
    );
}

#[test]
fn test_double_release_fails_fast() {
    let bridge = bridge();
    let handle = bridge.new_pos(0, 1, 1);
    bridge.registry().release(handle).unwrap();
    assert_eq!(
        bridge.registry().release(handle).unwrap_err(),
        RegistryError::InvalidHandle(handle)
    );
}

#[test]
fn test_never_issued_handles_are_invalid() {
    let bridge = bridge();
    assert!(bridge.registry().resolve(Handle::NULL).is_err());
    assert!(bridge.registry().resolve(Handle::from_raw(0x1_0000_0007)).is_err());
}

#[test]
fn test_live_objects_survive_other_releases() {
    let bridge = bridge();
    let array = bridge.fields("x y", &no_vars()).unwrap();
    let pos = bridge.new_pos(1, 1, 2);
    bridge.registry().release(pos).unwrap();

    let items = bridge
        .registry()
        .with_strings(array, |items| items.to_vec())
        .unwrap();
    assert_eq!(items, ["x", "y"]);
}

#[derive(Debug, Clone)]
enum Op {
    Register,
    Release(usize),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![Just(Op::Register), any::<usize>().prop_map(Op::Release)],
        0..64,
    )
}

proptest! {
    #[test]
    fn prop_live_handles_are_unique_and_resolvable(ops in ops()) {
        let bridge = bridge();
        let registry = bridge.registry();
        let mut live: Vec<Handle> = Vec::new();
        let mut dead: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                Op::Register => {
                    let handle = bridge.new_pos(live.len() as u32, 1, 1);
                    prop_assert!(!handle.is_null());
                    prop_assert!(!live.contains(&handle));
                    prop_assert!(!dead.contains(&handle));
                    live.push(handle);
                }
                Op::Release(i) if !live.is_empty() => {
                    let handle = live.swap_remove(i % live.len());
                    prop_assert!(registry.release(handle).is_ok());
                    dead.push(handle);
                }
                Op::Release(_) => {}
            }
        }

        prop_assert_eq!(registry.live(), live.len());
        for handle in &live {
            prop_assert!(registry.resolve(*handle).is_ok());
        }
        for handle in &dead {
            prop_assert!(registry.resolve(*handle).is_err());
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("gone"))
    }
}

fn domain_error(case: &str) -> BridgeError {
    let bridge = bridge();
    let parser = husk_syntax::Parser::new();
    match case {
        "io" => bridge.parse(&parser, FailingReader, "").unwrap_err(),
        "command" => bridge.fields("$(ls)", &no_vars()).unwrap_err(),
        "unset" => bridge.fields("${X:?}", &no_vars()).unwrap_err(),
        "status" => bridge
            .expand(
                "$X",
                &FnEnviron(|_: &str| -> Result<Option<String>, ExitStatus> { Err(ExitStatus(9)) }),
            )
            .unwrap_err(),
        "lang" => bridge.quote("x", LangVariant::Auto).unwrap_err(),
        "parse" => bridge.parse(&parser, "a &&& b".as_bytes(), "").unwrap_err(),
        "quote" => bridge.quote("a\0b", LangVariant::Bash).unwrap_err(),
        "arith" => bridge.fields("$((1 % 0))", &no_vars()).unwrap_err(),
        _ => unreachable!(),
    }
}

#[rstest]
#[case("io", ErrorKind::Io)]
#[case("command", ErrorKind::UnexpectedCommand)]
#[case("unset", ErrorKind::UnsetParameter)]
#[case("status", ErrorKind::ExitStatus)]
#[case("lang", ErrorKind::Lang)]
#[case("parse", ErrorKind::Parse)]
#[case("quote", ErrorKind::Quote)]
#[case("arith", ErrorKind::Unknown)]
fn test_classify(#[case] case: &str, #[case] kind: ErrorKind) {
    assert_eq!(classify(&domain_error(case)), kind);
}

#[test]
fn test_report_registers_the_error() {
    let bridge = bridge();
    let err = bridge.fields("${X?boom}", &no_vars()).unwrap_err();
    let reported = bridge.report(err);

    assert_eq!(reported.kind, ErrorKind::UnsetParameter.code());
    let handle = Handle::from_raw(reported.detail);
    let message = bridge
        .registry()
        .with_error(handle, |err| err.to_string())
        .unwrap();
    assert_eq!(message, "X: boom");

    match &*bridge.registry().release(handle).unwrap() {
        Object::Error(err) => assert_eq!(classify(err), ErrorKind::UnsetParameter),
        other => panic!("expected an error object, got {other:?}"),
    }
}

#[test]
fn test_exit_status_is_kept() {
    let err = domain_error("status");
    assert_eq!(err.exit_status(), Some(9));
}

// ============================================================================
// Parser settings
// ============================================================================

#[test]
fn test_null_knobs_take_configured_defaults() {
    let bridge = Bridge::new(BridgeConfig {
        default_variant: LangVariant::Mksh,
        keep_comments: true,
        ..BridgeConfig::default()
    });
    let handle = bridge.new_parser(None, None, None);
    let parser = bridge.registry().parser(handle).unwrap();
    assert_eq!(parser.lang(), LangVariant::Mksh);
    assert!(parser.keeps_comments());
    assert_eq!(parser.stop_word(), None);

    let handle = bridge.new_parser(Some(false), Some("exit".into()), Some(LangVariant::Posix));
    let parser = bridge.registry().parser(handle).unwrap();
    assert_eq!(parser.lang(), LangVariant::Posix);
    assert!(!parser.keeps_comments());
    assert_eq!(parser.stop_word(), Some("exit"));
}

#[test]
fn test_parse_registers_a_file() {
    let bridge = bridge();
    let parser = husk_syntax::Parser::new();
    let file = bridge.parse(&parser, "a | b && c".as_bytes(), "x.sh").unwrap();
    let (name, count) = bridge
        .registry()
        .with_file(file, |f| (f.name.clone(), f.stmts.len()))
        .unwrap();
    assert_eq!(name, "x.sh");
    assert_eq!(count, 1);
}
