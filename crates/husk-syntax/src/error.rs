//! Errors produced by the parser and the quoting functions

use crate::lang::LangVariant;
use crate::pos::Pos;
use std::fmt;
use std::io;
use thiserror::Error;

/// A syntax error found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Name of the file being parsed, possibly empty
    pub filename: String,
    /// Where the error was found
    pub pos: Pos,
    /// Human readable description
    pub text: String,
    /// Whether more input could have made the source valid.
    ///
    /// Set when the error was raised at the end of the input, which lets
    /// interactive callers ask for another line instead of giving up.
    pub incomplete: bool,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.filename.is_empty() {
            write!(f, "{}:", self.filename)?;
        }
        write!(f, "{}: {}", self.pos, self.text)
    }
}

impl std::error::Error for ParseError {}

/// Syntax that is valid, but not in the variant being parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangError {
    /// Name of the file being parsed, possibly empty
    pub filename: String,
    /// Where the feature was used; invalid for errors outside the parser
    pub pos: Pos,
    /// The feature that isn't supported, such as "function"
    pub feature: String,
    /// Variants that do support the feature
    pub langs: Vec<LangVariant>,
    /// The variant that was in use
    pub variant: LangVariant,
}

impl fmt::Display for LangError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.filename.is_empty() {
            write!(f, "{}:", self.filename)?;
        }
        if self.pos.is_valid() {
            write!(f, "{}: ", self.pos)?;
        }
        write!(f, "{}: only supported in ", self.feature)?;
        for (i, lang) in self.langs.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{lang}")?;
        }
        write!(f, ", not {}", self.variant)
    }
}

impl std::error::Error for LangError {}

/// Input that cannot be quoted in the requested variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot quote character at byte {byte_offset}: {message}")]
pub struct QuoteError {
    /// Byte offset of the offending character within the input
    pub byte_offset: usize,
    pub message: String,
}

/// Any error the engine can return from parsing or quoting
#[derive(Debug, Error)]
pub enum Error {
    /// The source could not be read
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Lang(#[from] LangError),

    #[error(transparent)]
    Quote(#[from] QuoteError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;
