//! Quoting, keywords and names
//!
//! Plain strings are quoted by `shlex`; this module adds the shell-specific
//! rules on top: reserved words, control characters and variant checks.

use crate::error::{Error, LangError, QuoteError, Result};
use crate::lang::LangVariant;
use crate::pos::Pos;
use std::fmt::Write as _;

/// Reserved words across all supported variants
pub const KEYWORDS: &[&str] = &[
    "!", "{", "}", "[[", "]]", "case", "coproc", "do", "done", "elif", "else", "esac", "fi", "for",
    "function", "if", "in", "select", "then", "time", "until", "while",
];

/// Whether `word` is a shell reserved word in any variant
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Whether `name` can be used as a variable name
pub fn valid_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn needs_escape(c: char) -> bool {
    c.is_control() && c != '\n' && c != '\t'
}

/// Quote `s` so that the shell reads it back as a single word with the same
/// value.
///
/// Words that need no quoting come back unchanged. Control characters can
/// only be written with `$'...'`, which POSIX shell lacks, so quoting them
/// for [`LangVariant::Posix`] is an error. [`LangVariant::Auto`] doesn't name
/// a concrete shell and is always rejected.
pub fn quote(s: &str, variant: LangVariant) -> Result<String> {
    if variant == LangVariant::Auto {
        return Err(Error::Lang(LangError {
            filename: String::new(),
            pos: Pos::default(),
            feature: "quoting".to_string(),
            langs: LangVariant::CONCRETE.to_vec(),
            variant,
        }));
    }
    if let Some(byte_offset) = s.bytes().position(|b| b == 0) {
        return Err(Error::Quote(QuoteError {
            byte_offset,
            message: "NUL bytes cannot be represented in shell strings".to_string(),
        }));
    }
    if is_keyword(s) {
        return Ok(format!("'{s}'"));
    }

    if let Some((byte_offset, c)) = s.char_indices().find(|(_, c)| needs_escape(*c)) {
        if variant == LangVariant::Posix {
            return Err(Error::Quote(QuoteError {
                byte_offset,
                message: format!("{c:?} needs $'' strings, which posix lacks"),
            }));
        }
        return Ok(dollar_quote(s));
    }

    shlex::try_quote(s).map(|quoted| quoted.into_owned()).map_err(|err| {
        Error::Quote(QuoteError {
            byte_offset: s.bytes().position(|b| b == 0).unwrap_or_default(),
            message: err.to_string(),
        })
    })
}

fn dollar_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 3);
    out.push_str("$'");
    for c in s.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\'' => out.push_str(r"\'"),
            '\n' => out.push_str(r"\n"),
            '\t' => out.push_str(r"\t"),
            '\r' => out.push_str(r"\r"),
            c if needs_escape(c) && (c as u32) < 0x80 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if needs_escape(c) => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
