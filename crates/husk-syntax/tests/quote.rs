//! Quoting, keyword and name tests

use husk_syntax::expand::fields;
use husk_syntax::quote::{is_keyword, quote, valid_name};
use husk_syntax::{Error, LangVariant};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use std::collections::HashMap;

#[rstest]
#[case("foo", "foo")]
#[case("a/b.c-d_e", "a/b.c-d_e")]
#[case("", "''")]
#[case("hello world", "'hello world'")]
#[case("$HOME", "'$HOME'")]
#[case("if", "'if'")]
#[case("a\x01b", r"$'a\x01b'")]
#[case("bell\x07'", r"$'bell\x07\''")]
fn test_quote_bash(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(quote(input, LangVariant::Bash).unwrap(), expected);
}

#[rstest]
#[case("it's")]
#[case("~")]
#[case("#not a comment")]
#[case("a\tb\nc")]
#[case("{a,b}")]
#[case("say \"hi\" to $USER `now`")]
#[case("back\\slash")]
fn test_quoted_reads_back(#[case] input: &str) {
    let quoted = quote(input, LangVariant::Bash).unwrap();
    let env = HashMap::from([("USER".to_string(), "nobody".to_string())]);
    assert_eq!(fields(&quoted, &env).unwrap(), vec![input]);
}

#[rstest]
#[case(LangVariant::Bash)]
#[case(LangVariant::Posix)]
#[case(LangVariant::Mksh)]
#[case(LangVariant::Bats)]
fn test_nul_is_unquotable(#[case] variant: LangVariant) {
    match quote("ab\0c", variant) {
        Err(Error::Quote(err)) => assert_eq!(err.byte_offset, 2),
        other => panic!("expected a quote error, got {other:?}"),
    }
}

#[test]
fn test_posix_rejects_control_characters() {
    match quote("é\x1b[0m", LangVariant::Posix) {
        Err(Error::Quote(err)) => {
            assert_eq!(err.byte_offset, 2);
            assert!(err.to_string().starts_with("cannot quote character at byte 2"));
        }
        other => panic!("expected a quote error, got {other:?}"),
    }
    let quoted = quote("a\nb", LangVariant::Posix).unwrap();
    assert_eq!(fields(&quoted, &HashMap::<String, String>::new()).unwrap(), vec!["a\nb"]);
}

#[test]
fn test_auto_cannot_quote() {
    match quote("x", LangVariant::Auto) {
        Err(Error::Lang(err)) => {
            assert_eq!(err.variant, LangVariant::Auto);
            assert_eq!(err.langs, LangVariant::CONCRETE.to_vec());
        }
        other => panic!("expected a language error, got {other:?}"),
    }
}

#[rstest]
#[case("if", true)]
#[case("[[", true)]
#[case("coproc", true)]
#[case("!", true)]
#[case("echo", false)]
#[case("IF", false)]
#[case("", false)]
fn test_is_keyword(#[case] word: &str, #[case] expected: bool) {
    assert_eq!(is_keyword(word), expected);
}

#[rstest]
#[case("PATH", true)]
#[case("_private", true)]
#[case("x9", true)]
#[case("9x", false)]
#[case("a.b", false)]
#[case("", false)]
fn test_valid_name(#[case] name: &str, #[case] expected: bool) {
    assert_eq!(valid_name(name), expected);
}

proptest! {
    #[test]
    fn prop_quoted_printable_ascii_is_one_field(s in "[ -~]*") {
        let quoted = quote(&s, LangVariant::Bash).unwrap();
        let env: HashMap<String, String> = HashMap::new();
        prop_assert_eq!(fields(&quoted, &env).unwrap(), vec![s]);
    }

    #[test]
    fn prop_quoted_controls_are_one_field(s in "[\\x01-\\x1f a-z']{0,16}") {
        let quoted = quote(&s, LangVariant::Mksh).unwrap();
        let env: HashMap<String, String> = HashMap::new();
        prop_assert_eq!(fields(&quoted, &env).unwrap(), vec![s]);
    }
}
