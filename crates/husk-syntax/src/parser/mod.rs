//! Parsing (bytes to AST)
//!
//! The grammar itself comes from `brush_parser`. This module feeds it lines
//! from a [`Source`], which applies the options the grammar doesn't know
//! about, and turns its output or its errors into our own types.

mod convert;

use crate::ast::File;
use crate::error::{Error, ParseError, Result};
use crate::lang::LangVariant;
use crate::pos::Pos;
use crate::source::{LineFilter, Source};
use brush_parser::{ParserOptions, SourceInfo};
use std::io::Read;

/// Parser configuration.
///
/// A parser holds no state between calls, so one value can be reused for any
/// number of inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parser {
    keep_comments: bool,
    stop_at: Option<String>,
    variant: LangVariant,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect comments into [`File::comments`]
    pub fn keep_comments(mut self, keep: bool) -> Self {
        self.keep_comments = keep;
        self
    }

    /// Stop parsing when `word` starts a line, as if the input ended there
    pub fn stop_at(mut self, word: impl Into<String>) -> Self {
        let word = word.into();
        self.stop_at = if word.is_empty() { None } else { Some(word) };
        self
    }

    /// The language variant to parse
    pub fn variant(mut self, variant: LangVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn keeps_comments(&self) -> bool {
        self.keep_comments
    }

    pub fn stop_word(&self) -> Option<&str> {
        self.stop_at.as_deref()
    }

    pub fn lang(&self) -> LangVariant {
        self.variant
    }

    /// Parse a whole program read from `reader`.
    ///
    /// `name` is only used in error messages and in [`File::name`].
    pub fn parse<R: Read>(&self, reader: R, name: &str) -> Result<File> {
        let mut source = Source::new(
            reader,
            LineFilter {
                variant: self.variant,
                stop_at: self.stop_at.as_deref(),
                keep_comments: self.keep_comments,
            },
        );
        let options = grammar_options(self.variant);
        let parsed = {
            let mut grammar =
                brush_parser::Parser::new(&mut source, &options, &SourceInfo::default());
            grammar.parse_program()
        };

        // A read error always wins over the syntax error it may have caused
        if let Some(err) = source.take_read_err() {
            return Err(Error::Io(err));
        }
        if let Some(mut err) = source.take_lang_err() {
            err.filename = name.to_string();
            return Err(Error::Lang(err));
        }
        let program = parsed.map_err(|err| syntax_error(err, name, source.end_pos()))?;

        let bats_tests = source.take_bats_tests();
        let stmts = convert::Convert::new(&bats_tests).program(program);
        tracing::trace!(name, stmts = stmts.len(), "converted program");
        Ok(File {
            name: name.to_string(),
            stmts,
            comments: source.take_comments(),
        })
    }
}

/// Grammar options for a variant; everything but POSIX parses as Bash
pub(crate) fn grammar_options(variant: LangVariant) -> ParserOptions {
    match variant {
        LangVariant::Posix => ParserOptions {
            posix_mode: true,
            sh_mode: true,
            ..ParserOptions::default()
        },
        _ => ParserOptions::default(),
    }
}

/// Turn a grammar error into a [`ParseError`].
///
/// Errors raised because the input ran out are incomplete: more input could
/// still make the program valid.
fn syntax_error(err: brush_parser::ParseError, name: &str, end: Pos) -> Error {
    let text = err.to_string();
    let (pos, incomplete) = match &err {
        brush_parser::ParseError::ParsingNearToken(token) => {
            let start = &token.location().start;
            let pos = Pos::new(start.index as u32, start.line as u32, start.column as u32);
            (pos, false)
        }
        brush_parser::ParseError::ParsingAtEndOfInput => (end, true),
        brush_parser::ParseError::Tokenizing { inner, .. } => (end, inner.is_incomplete()),
        #[allow(unreachable_patterns)]
        _ => (end, false),
    };
    Error::Parse(ParseError {
        filename: name.to_string(),
        pos,
        text,
        incomplete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_knobs() {
        let parser = Parser::new()
            .keep_comments(true)
            .stop_at("$$")
            .variant(LangVariant::Mksh);
        assert!(parser.keeps_comments());
        assert_eq!(parser.stop_word(), Some("$$"));
        assert_eq!(parser.lang(), LangVariant::Mksh);

        assert_eq!(Parser::new().stop_at("").stop_word(), None);
    }

    #[test]
    fn test_posix_grammar_options() {
        assert!(grammar_options(LangVariant::Posix).posix_mode);
        assert!(!grammar_options(LangVariant::Bash).posix_mode);
    }

    #[test]
    fn test_unclosed_quote_is_incomplete() {
        let err = Parser::new().parse("echo 'abc".as_bytes(), "").unwrap_err();
        match err {
            Error::Parse(err) => assert!(err.incomplete, "{err}"),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}
