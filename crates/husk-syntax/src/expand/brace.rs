//! Brace expansion of `{a,b}` lists and `{1..5}` sequences
//!
//! The word is split into text and brace expressions by
//! `brush_parser::word::parse_brace_expansions`; this module produces every
//! combination of the alternatives.

use brush_parser::word::{self, BraceExpressionMember, BraceExpressionOrText};
use brush_parser::ParserOptions;
use itertools::Itertools;

/// Expand every brace expression in `word`, left to right.
///
/// A word without braces to expand, or one the grammar rejects, comes back
/// unchanged as the only result.
pub(super) fn expand(word: &str, options: &ParserOptions) -> Vec<String> {
    if !may_expand(word) {
        return vec![word.to_string()];
    }
    match word::parse_brace_expansions(word, options) {
        Ok(Some(pieces)) => combine(pieces).collect(),
        Ok(None) | Err(_) => vec![word.to_string()],
    }
}

fn combine(pieces: Vec<BraceExpressionOrText>) -> impl Iterator<Item = String> {
    pieces
        .into_iter()
        .map(|piece| piece_alternatives(piece).collect::<Vec<_>>())
        .multi_cartesian_product()
        .map(|parts| parts.concat())
}

fn piece_alternatives(piece: BraceExpressionOrText) -> Box<dyn Iterator<Item = String>> {
    match piece {
        BraceExpressionOrText::Expr(members) => {
            Box::new(members.into_iter().flat_map(member_alternatives))
        }
        BraceExpressionOrText::Text(text) => Box::new(std::iter::once(text)),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn member_alternatives(member: BraceExpressionMember) -> Box<dyn Iterator<Item = String>> {
    match member {
        BraceExpressionMember::NumberSequence {
            start,
            end,
            increment,
        } => {
            let step = (increment.unsigned_abs() as usize).max(1);
            if start <= end {
                Box::new((start..=end).step_by(step).map(|n| n.to_string()))
            } else {
                Box::new((end..=start).rev().step_by(step).map(|n| n.to_string()))
            }
        }
        BraceExpressionMember::CharSequence {
            start,
            end,
            increment,
        } => {
            let step = (increment.unsigned_abs() as usize).max(1);
            if start <= end {
                Box::new((start..=end).step_by(step).map(String::from))
            } else {
                Box::new((end..=start).rev().step_by(step).map(String::from))
            }
        }
        BraceExpressionMember::Child(pieces) => Box::new(combine(pieces)),
    }
}

/// Whether the word has an unquoted `{` followed later by an unquoted `}`,
/// with a comma or `..` somewhere to make a list or sequence
fn may_expand(word: &str) -> bool {
    if !word.contains(',') && !word.contains("..") {
        return false;
    }
    let mut quote = None;
    let mut escaped = false;
    let mut opened = false;
    for c in word.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => {}
            (_, '\\') => escaped = true,
            (Some(_), '"') => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '{') => opened = true,
            (None, '}') if opened => return true,
            (None, _) => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn braces(word: &str) -> Vec<String> {
        expand(word, &ParserOptions::default())
    }

    #[test]
    fn test_lists_and_sequences() {
        assert_eq!(braces("a{b,c}d"), vec!["abd", "acd"]);
        assert_eq!(braces("{1..3}"), vec!["1", "2", "3"]);
        assert_eq!(braces("{3..1}"), vec!["3", "2", "1"]);
        assert_eq!(braces("{1..10..4}"), vec!["1", "5", "9"]);
        assert_eq!(braces("{a..c}"), vec!["a", "b", "c"]);
        assert_eq!(braces("{a,b}{1,2}"), vec!["a1", "a2", "b1", "b2"]);
    }

    #[test]
    fn test_words_left_alone() {
        assert_eq!(braces("plain"), vec!["plain"]);
        assert_eq!(braces("{single}"), vec!["{single}"]);
        assert_eq!(braces("'{a,b}'"), vec!["'{a,b}'"]);
        assert_eq!(braces(r"\{a,b}"), vec![r"\{a,b}"]);
    }

    #[test]
    fn test_may_expand() {
        assert!(may_expand("x{a,b}"));
        assert!(!may_expand("\"{a,b}\""));
        assert!(!may_expand("}{,"));
        assert!(!may_expand("{a}"));
    }
}
