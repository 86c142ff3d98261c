//! Word expansion
//!
//! [`expand`] and [`fields`] evaluate shell words against an [`Environ`]
//! without running anything. Words are taken apart by `brush_parser`; this
//! module does the evaluation. Command substitutions are rejected and no
//! pathname globbing is done.

mod arith;
mod brace;
mod pattern;

use crate::error::{Error, ParseError};
use crate::pos::Pos;
use brush_parser::word::{
    Parameter, ParameterExpr, ParameterTestType, SpecialParameter, WordPiece, WordPieceWithSource,
};
use brush_parser::{ParserOptions, Token};
use pattern::Trim;
use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use thiserror::Error;

/// Field separators used when `IFS` is unset
pub const DEFAULT_IFS: &str = " \t\n";

/// Exit status of a failed variable lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus(pub u8);

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exit status {}", self.0)
    }
}

/// A source of shell variables
pub trait Environ {
    /// Look up a variable; `Ok(None)` means it is unset
    fn lookup(&self, name: &str) -> Result<Option<String>, ExitStatus>;
}

impl<S: BuildHasher> Environ for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Result<Option<String>, ExitStatus> {
        Ok(self.get(name).cloned())
    }
}

impl<E: Environ + ?Sized> Environ for &E {
    fn lookup(&self, name: &str) -> Result<Option<String>, ExitStatus> {
        (**self).lookup(name)
    }
}

/// An [`Environ`] backed by a closure
pub struct FnEnviron<F>(pub F);

impl<F> Environ for FnEnviron<F>
where
    F: Fn(&str) -> Result<Option<String>, ExitStatus>,
{
    fn lookup(&self, name: &str) -> Result<Option<String>, ExitStatus> {
        (self.0)(name)
    }
}

#[derive(Debug, Error)]
pub enum ExpandError {
    /// The text isn't valid shell syntax
    #[error(transparent)]
    Syntax(#[from] crate::Error),

    #[error("command substitutions are not allowed here: {command}")]
    UnexpectedCommand { command: String },

    /// `${name?message}` on an unset parameter
    #[error("{name}: {message}")]
    UnsetParameter { name: String, message: String },

    /// The environment failed a lookup
    #[error("variable lookup failed with exit status {0}")]
    ExitStatus(u8),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// Valid syntax this expander doesn't evaluate, such as `${x/a/b}`
    #[error("unsupported expansion: {0}")]
    Unsupported(String),
}

impl From<ExitStatus> for ExpandError {
    fn from(status: ExitStatus) -> Self {
        ExpandError::ExitStatus(status.0)
    }
}

pub type ExpandResult<T> = Result<T, ExpandError>;

/// Expand `text` as a document, as the body of a here-document would be.
///
/// Quotes are kept as written, a backslash only escapes `$`, `` ` ``, `\`
/// and newlines, and no field splitting happens.
pub fn expand<E: Environ>(text: &str, env: &E) -> ExpandResult<String> {
    let expander = Expander::new(env);
    expander.document(text)
}

/// Expand `text` into fields, as the arguments of a command would be.
///
/// This does brace expansion, tilde expansion using `HOME`, parameter and
/// arithmetic expansion, field splitting on `IFS` and quote removal.
pub fn fields<E: Environ>(text: &str, env: &E) -> ExpandResult<Vec<String>> {
    let words = split_words(text)?;
    let expander = Expander::new(env);
    let ifs = expander.lookup("IFS")?.unwrap_or_else(|| DEFAULT_IFS.to_string());

    let mut out = Vec::new();
    for word in &words {
        for word in brace::expand(word, &expander.options) {
            let mut segments = Vec::new();
            let pieces = parse_word(&word, &expander.options)?;
            expander.pieces(&pieces, Quoting::Unquoted, true, &mut segments)?;
            split_fields(segments, &ifs, &mut out);
        }
    }
    Ok(out)
}

/// Split `text` into words separated by blanks and newlines.
///
/// Operators are an error; comments are skipped.
fn split_words(text: &str) -> ExpandResult<Vec<String>> {
    let tokens = brush_parser::tokenize_str(text).map_err(|err| {
        let incomplete = err.is_incomplete();
        syntax_error(end_of(text), err.to_string(), incomplete)
    })?;
    let mut words = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Word(word, _) => words.push(word),
            Token::Operator(op, _) if op == "\n" => {}
            Token::Operator(op, location) => {
                let start = &location.start;
                let pos = Pos::new(start.index as u32, start.line as u32, start.column as u32);
                return Err(syntax_error(pos, format!("{op} is not a valid word"), false));
            }
        }
    }
    Ok(words)
}

fn parse_word(word: &str, options: &ParserOptions) -> ExpandResult<Vec<WordPieceWithSource>> {
    brush_parser::word::parse(word, options)
        .map_err(|err| syntax_error(Pos::default(), err.to_string(), false))
}

fn syntax_error(pos: Pos, text: String, incomplete: bool) -> ExpandError {
    ExpandError::Syntax(Error::Parse(ParseError {
        filename: String::new(),
        pos,
        text,
        incomplete,
    }))
}

/// Position just past the end of `text`
fn end_of(text: &str) -> Pos {
    let line = 1 + text.matches('\n').count();
    let last = text.rfind('\n').map_or(text, |i| &text[i + 1..]);
    Pos::new(text.len() as u32, line as u32, 1 + last.chars().count() as u32)
}

/// Wrap `text` in double quotes so it parses as one quoted word whose
/// backslashes escape just what a here-document's do
fn as_document(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => match chars.next() {
                Some('"') => out.push_str("\\\\\\\""),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push_str("\\\\"),
            },
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quoting {
    Unquoted,
    Double,
}

/// A piece of an expanded word
struct Segment {
    text: String,
    /// Subject to field splitting
    split: bool,
    /// Came from quotes, so it forms a field even when empty
    quoted: bool,
}

impl Segment {
    fn literal(text: String) -> Self {
        Self {
            text,
            split: false,
            quoted: false,
        }
    }

    fn quoted(text: String) -> Self {
        Self {
            text,
            split: false,
            quoted: true,
        }
    }

    fn expanded(text: String, quoting: Quoting) -> Self {
        Self {
            text,
            split: quoting == Quoting::Unquoted,
            quoted: quoting == Quoting::Double,
        }
    }
}

struct Expander<'a> {
    env: &'a dyn Environ,
    options: ParserOptions,
}

impl<'a> Expander<'a> {
    fn new(env: &'a dyn Environ) -> Self {
        Self {
            env,
            options: ParserOptions::default(),
        }
    }

    fn lookup(&self, name: &str) -> ExpandResult<Option<String>> {
        Ok(self.env.lookup(name)?)
    }

    /// Expand text with here-document rules into a single string
    fn document(&self, text: &str) -> ExpandResult<String> {
        let pieces = parse_word(&as_document(text), &self.options)?;
        let mut segments = Vec::new();
        self.pieces(&pieces, Quoting::Unquoted, false, &mut segments)?;
        Ok(segments.into_iter().map(|s| s.text).collect())
    }

    fn pieces(
        &self,
        pieces: &[WordPieceWithSource],
        quoting: Quoting,
        word_start: bool,
        out: &mut Vec<Segment>,
    ) -> ExpandResult<()> {
        for (i, piece) in pieces.iter().enumerate() {
            self.piece(&piece.piece, quoting, word_start && i == 0, out)?;
        }
        Ok(())
    }

    fn piece(
        &self,
        piece: &WordPiece,
        quoting: Quoting,
        word_start: bool,
        out: &mut Vec<Segment>,
    ) -> ExpandResult<()> {
        match piece {
            WordPiece::Text(text) => out.push(Segment::literal(text.clone())),
            WordPiece::SingleQuotedText(text) => out.push(Segment::quoted(text.clone())),
            WordPiece::AnsiCQuotedText(text) => out.push(Segment::quoted(decode_ansi(text))),
            WordPiece::DoubleQuotedSequence(inner)
            | WordPiece::GettextDoubleQuotedSequence(inner) => {
                // "$@" with no positional parameters is no field at all
                if let [only] = inner.as_slice() {
                    if is_all_positional(&only.piece) {
                        return Ok(());
                    }
                }
                out.push(Segment::quoted(String::new()));
                self.pieces(inner, Quoting::Double, false, out)?;
            }
            WordPiece::TildePrefix(user) => {
                let home = match user.as_str() {
                    "" if word_start => self.lookup("HOME")?,
                    _ => None,
                };
                match home {
                    Some(home) => out.push(Segment::quoted(home)),
                    None => out.push(Segment::literal(format!("~{user}"))),
                }
            }
            WordPiece::EscapeSequence(escape) => {
                out.push(Segment::literal(unescape(escape, quoting)));
            }
            WordPiece::ParameterExpansion(expr) => self.parameter(expr, quoting, out)?,
            WordPiece::CommandSubstitution(command)
            | WordPiece::BackquotedCommandSubstitution(command) => {
                return Err(ExpandError::UnexpectedCommand {
                    command: command.clone(),
                });
            }
            WordPiece::ArithmeticExpression(expr) => {
                let text = self.document(&expr.value)?;
                let value = arith::eval(&text, self.env)?;
                out.push(Segment::expanded(value.to_string(), quoting));
            }
        }
        Ok(())
    }

    /// The value of a parameter; `None` when unset
    fn value(&self, parameter: &Parameter) -> ExpandResult<Option<String>> {
        match parameter {
            Parameter::Positional(n) => self.lookup(&n.to_string()),
            Parameter::Named(name) => self.lookup(name),
            Parameter::NamedWithIndex { name, index } => match index.trim() {
                "0" => self.lookup(name),
                _ => Ok(None),
            },
            Parameter::NamedWithAllIndices { name, .. } => self.lookup(name),
            Parameter::Special(SpecialParameter::PositionalParameterCount) => {
                Ok(Some("0".to_string()))
            }
            Parameter::Special(_) => Ok(None),
        }
    }

    /// Expand an operand such as the `word` of `${x:-word}`
    fn operand(&self, text: Option<&str>, quoting: Quoting, out: &mut Vec<Segment>) -> ExpandResult<()> {
        let Some(text) = text else {
            return Ok(());
        };
        let pieces = parse_word(text, &self.options)?;
        self.pieces(&pieces, quoting, false, out)
    }

    fn operand_text(&self, text: Option<&str>) -> ExpandResult<String> {
        let mut segments = Vec::new();
        self.operand(text, Quoting::Double, &mut segments)?;
        Ok(segments.into_iter().map(|s| s.text).collect())
    }

    fn parameter(&self, expr: &ParameterExpr, quoting: Quoting, out: &mut Vec<Segment>) -> ExpandResult<()> {
        match expr {
            ParameterExpr::Parameter { parameter, .. } => {
                let value = self.value(parameter)?.unwrap_or_default();
                out.push(Segment::expanded(value, quoting));
            }
            ParameterExpr::UseDefaultValues {
                parameter,
                test_type,
                default_value,
                ..
            }
            | ParameterExpr::AssignDefaultValues {
                parameter,
                test_type,
                default_value,
                ..
            } => match set_value(self.value(parameter)?, test_type) {
                Some(value) => out.push(Segment::expanded(value, quoting)),
                None => self.operand(default_value.as_deref(), quoting, out)?,
            },
            ParameterExpr::UseAlternativeValue {
                parameter,
                test_type,
                alternative_value,
                ..
            } => {
                if set_value(self.value(parameter)?, test_type).is_some() {
                    self.operand(alternative_value.as_deref(), quoting, out)?;
                }
            }
            ParameterExpr::IndicateErrorIfNullOrUnset {
                parameter,
                test_type,
                error_message,
                ..
            } => match set_value(self.value(parameter)?, test_type) {
                Some(value) => out.push(Segment::expanded(value, quoting)),
                None => {
                    let mut message = self.operand_text(error_message.as_deref())?;
                    if message.is_empty() {
                        message = match test_type {
                            ParameterTestType::UnsetOrNull => "parameter null or not set",
                            ParameterTestType::Unset => "parameter not set",
                        }
                        .to_string();
                    }
                    return Err(ExpandError::UnsetParameter {
                        name: parameter_name(parameter),
                        message,
                    });
                }
            },
            ParameterExpr::ParameterLength { parameter, .. } => {
                let len = self.value(parameter)?.map_or(0, |v| v.chars().count());
                out.push(Segment::expanded(len.to_string(), quoting));
            }
            ParameterExpr::RemoveSmallestSuffixPattern { parameter, pattern, .. } => {
                self.trim(parameter, pattern.as_deref(), Trim::SmallestSuffix, quoting, out)?;
            }
            ParameterExpr::RemoveLargestSuffixPattern { parameter, pattern, .. } => {
                self.trim(parameter, pattern.as_deref(), Trim::LargestSuffix, quoting, out)?;
            }
            ParameterExpr::RemoveSmallestPrefixPattern { parameter, pattern, .. } => {
                self.trim(parameter, pattern.as_deref(), Trim::SmallestPrefix, quoting, out)?;
            }
            ParameterExpr::RemoveLargestPrefixPattern { parameter, pattern, .. } => {
                self.trim(parameter, pattern.as_deref(), Trim::LargestPrefix, quoting, out)?;
            }
            ParameterExpr::Substring {
                parameter,
                offset,
                length,
                ..
            } => {
                let value = self.value(parameter)?.unwrap_or_default();
                let offset = arith::eval(&self.document(&offset.value)?, self.env)?;
                let length = match length {
                    Some(length) => Some(arith::eval(&self.document(&length.value)?, self.env)?),
                    None => None,
                };
                out.push(Segment::expanded(substring(&value, offset, length)?, quoting));
            }
            other => return Err(ExpandError::Unsupported(format!("{other:?}"))),
        }
        Ok(())
    }

    fn trim(
        &self,
        parameter: &Parameter,
        pattern: Option<&str>,
        trim: Trim,
        quoting: Quoting,
        out: &mut Vec<Segment>,
    ) -> ExpandResult<()> {
        let value = self.value(parameter)?.unwrap_or_default();
        let pattern = self.operand_text(pattern)?;
        out.push(Segment::expanded(pattern::remove(&value, &pattern, trim), quoting));
        Ok(())
    }
}

/// The value if it counts as set for `test_type`
fn set_value(value: Option<String>, test_type: &ParameterTestType) -> Option<String> {
    match (value, test_type) {
        (Some(v), ParameterTestType::UnsetOrNull) if v.is_empty() => None,
        (value, _) => value,
    }
}

fn is_all_positional(piece: &WordPiece) -> bool {
    matches!(
        piece,
        WordPiece::ParameterExpansion(ParameterExpr::Parameter {
            parameter: Parameter::Special(SpecialParameter::AllPositionalParameters {
                concatenate: false
            }),
            ..
        })
    )
}

fn parameter_name(parameter: &Parameter) -> String {
    match parameter {
        Parameter::Positional(n) => n.to_string(),
        Parameter::Named(name)
        | Parameter::NamedWithIndex { name, .. }
        | Parameter::NamedWithAllIndices { name, .. } => name.clone(),
        Parameter::Special(special) => match special {
            SpecialParameter::AllPositionalParameters { concatenate: true } => "*",
            SpecialParameter::AllPositionalParameters { concatenate: false } => "@",
            SpecialParameter::PositionalParameterCount => "#",
            _ => "?",
        }
        .to_string(),
    }
}

/// `${x:offset:length}` on characters; negative values count from the end
fn substring(value: &str, offset: i64, length: Option<i64>) -> ExpandResult<String> {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len() as i64;
    let start = if offset < 0 { (len + offset).max(0) } else { offset.min(len) };
    let end = match length {
        None => len,
        Some(n) if n < 0 => {
            let end = len + n;
            if end < start {
                return Err(ExpandError::Arithmetic(format!("{n}: substring expression < 0")));
            }
            end
        }
        Some(n) => start.saturating_add(n).min(len),
    };
    Ok(chars[start as usize..end as usize].iter().collect())
}

/// The character a backslash escape stands for in `quoting`
fn unescape(escape: &str, quoting: Quoting) -> String {
    let mut chars = escape.chars();
    if chars.next() != Some('\\') {
        return escape.to_string();
    }
    let rest = chars.as_str();
    let escapes = match quoting {
        Quoting::Unquoted => true,
        Quoting::Double => matches!(rest, "$" | "`" | "\"" | "\\" | "\n"),
    };
    match (escapes, rest) {
        (true, "\n") => String::new(),
        (true, _) => rest.to_string(),
        (false, _) => escape.to_string(),
    }
}

/// Decode the escape sequences of a `$'...'` string
fn decode_ansi(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        let decoded = match esc {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\x07',
            'b' => '\x08',
            'e' | 'E' => '\x1b',
            'f' => '\x0c',
            'v' => '\x0b',
            '\\' | '\'' | '"' | '?' => esc,
            'x' | 'u' | 'U' => {
                let max = match esc {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                match take_digits(&mut chars, 16, max, 0) {
                    Some(code) => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
                    None => {
                        out.push('\\');
                        esc
                    }
                }
            }
            '0'..='7' => {
                let first = esc.to_digit(8).unwrap_or(0);
                let code = take_digits(&mut chars, 8, 2, first).unwrap_or(first);
                char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
            }
            other => {
                out.push('\\');
                other
            }
        };
        out.push(decoded);
    }
    out
}

/// Read up to `max` digits in `radix`, appending to `acc`; `None` if there
/// were none
fn take_digits(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    radix: u32,
    max: usize,
    acc: u32,
) -> Option<u32> {
    let mut value = acc;
    let mut seen = 0;
    while seen < max {
        let Some(digit) = chars.peek().and_then(|c| c.to_digit(radix)) else {
            break;
        };
        value = value.saturating_mul(radix).saturating_add(digit);
        chars.next();
        seen += 1;
    }
    (seen > 0).then_some(value)
}

/// Split the segments of one word into fields.
///
/// Only text from unquoted expansions is split. Runs of blank separators
/// count as one; every other `IFS` character ends a field, even an empty one.
fn split_fields(segments: Vec<Segment>, ifs: &str, out: &mut Vec<String>) {
    let mut current = String::new();
    let mut started = false;
    // a field was just ended by blanks, which absorb one following separator
    let mut blank_ended = false;
    for seg in segments {
        if !seg.split {
            if seg.quoted || !seg.text.is_empty() {
                started = true;
                blank_ended = false;
            }
            current.push_str(&seg.text);
            continue;
        }
        for c in seg.text.chars() {
            if !ifs.contains(c) {
                current.push(c);
                started = true;
                blank_ended = false;
            } else if c.is_ascii_whitespace() {
                if started {
                    out.push(std::mem::take(&mut current));
                    started = false;
                    blank_ended = true;
                }
            } else if blank_ended {
                blank_ended = false;
            } else {
                out.push(std::mem::take(&mut current));
                started = false;
            }
        }
    }
    if started {
        out.push(current);
    }
}
