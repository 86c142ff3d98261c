//! Line-buffered byte source for the parser
//!
//! Input is pulled from the reader in bounded chunks and handed to the
//! grammar one line at a time. Each line goes through a filter first, which
//! applies the parser options the grammar has no notion of: the stop word,
//! bats `@test` headers and comment collection.

use crate::ast::Comment;
use crate::error::LangError;
use crate::lang::LangVariant;
use crate::pos::Pos;
use std::io::{self, BufRead, Read};

const CHUNK_SIZE: usize = 4096;

/// Name prefix of the function that stands in for a bats `@test` block
pub(crate) const BATS_TEST_PREFIX: &str = "__husk_bats_test_";

pub(crate) struct LineFilter<'a> {
    pub(crate) variant: LangVariant,
    pub(crate) stop_at: Option<&'a str>,
    pub(crate) keep_comments: bool,
}

/// Quoting still open at the end of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Open {
    Nothing,
    Single,
    Ansi,
    Double,
}

pub(crate) struct Source<'a, R> {
    reader: R,
    filter: LineFilter<'a>,
    raw: Vec<u8>,
    raw_head: usize,
    reader_done: bool,
    line: Vec<u8>,
    line_head: usize,
    stopped: bool,
    open: Open,
    read_err: Option<io::Error>,
    lang_err: Option<LangError>,
    // position right after the last line handed out
    offset: u32,
    line_no: u32,
    col: u32,
    comments: Vec<Comment>,
    bats_tests: Vec<String>,
}

impl<'a, R: Read> Source<'a, R> {
    pub(crate) fn new(reader: R, filter: LineFilter<'a>) -> Self {
        Self {
            reader,
            filter,
            raw: Vec::new(),
            raw_head: 0,
            reader_done: false,
            line: Vec::new(),
            line_head: 0,
            stopped: false,
            open: Open::Nothing,
            read_err: None,
            lang_err: None,
            offset: 0,
            line_no: 1,
            col: 1,
            comments: Vec::new(),
            bats_tests: Vec::new(),
        }
    }

    /// Read one more chunk.
    ///
    /// A read error ends the input; it is kept so the parser can report it
    /// in place of whatever syntax error the truncated input produced.
    fn pull(&mut self) {
        if self.raw_head > 0 {
            self.raw.drain(..self.raw_head);
            self.raw_head = 0;
        }
        let start = self.raw.len();
        self.raw.resize(start + CHUNK_SIZE, 0);
        match self.reader.read(&mut self.raw[start..]) {
            Ok(0) => {
                self.raw.truncate(start);
                self.reader_done = true;
            }
            Ok(n) => self.raw.truncate(start + n.min(CHUNK_SIZE)),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => self.raw.truncate(start),
            Err(e) => {
                self.raw.truncate(start);
                self.read_err = Some(e);
                self.reader_done = true;
            }
        }
    }

    /// The next line, newline included, or `None` at the end of the input
    fn next_raw_line(&mut self) -> Option<Vec<u8>> {
        loop {
            let pending = &self.raw[self.raw_head..];
            if let Some(i) = pending.iter().position(|&b| b == b'\n') {
                let line = pending[..=i].to_vec();
                self.raw_head += i + 1;
                return Some(line);
            }
            if self.reader_done {
                if pending.is_empty() {
                    return None;
                }
                let line = pending.to_vec();
                self.raw_head = self.raw.len();
                return Some(line);
            }
            self.pull();
        }
    }

    fn next_line(&mut self) {
        self.line.clear();
        self.line_head = 0;
        match self.next_raw_line() {
            Some(raw) => self.filter_line(raw),
            None => self.stopped = true,
        }
    }

    fn filter_line(&mut self, raw: Vec<u8>) {
        let indent = raw.iter().take_while(|b| matches!(b, b' ' | b'\t')).count();
        let body = &raw[indent..];

        if self.open == Open::Nothing {
            if let Some(word) = self.filter.stop_at {
                if starts_with_word(body, word.as_bytes()) {
                    self.stopped = true;
                    return;
                }
            }
            if starts_with_word(body, b"@test") {
                if !matches!(self.filter.variant, LangVariant::Bats | LangVariant::Auto) {
                    self.lang_err = Some(LangError {
                        filename: String::new(),
                        pos: self.pos_at(indent),
                        feature: "@test".to_string(),
                        langs: vec![LangVariant::Bats],
                        variant: self.filter.variant,
                    });
                    self.stopped = true;
                    return;
                }
                if let Some(header) = self.bats_header(&raw, indent) {
                    self.advance(&raw);
                    self.line = header;
                    return;
                }
            }
        }

        if let Some(at) = self.scan_quotes(&raw) {
            if self.filter.keep_comments {
                let text = String::from_utf8_lossy(&raw[at + 1..]);
                self.comments.push(Comment {
                    pos: self.pos_at(at),
                    text: text.trim_end_matches(['\n', '\r']).to_string(),
                });
            }
        }
        self.advance(&raw);
        self.line = raw;
    }

    /// Rewrite `@test "description" {` into the header of a function the
    /// grammar understands, remembering the description
    fn bats_header(&mut self, raw: &[u8], indent: usize) -> Option<Vec<u8>> {
        let body = raw[indent..].trim_ascii_end();
        let inner = body.strip_prefix(b"@test")?.strip_suffix(b"{")?;
        let inner = inner.trim_ascii();
        let inner = match inner {
            [q @ (b'"' | b'\''), rest @ .., last] if q == last => rest,
            _ => inner,
        };
        let description = String::from_utf8_lossy(inner).into_owned();

        let mut header = raw[..indent].to_vec();
        header.extend_from_slice(
            format!("{BATS_TEST_PREFIX}{}() {{\n", self.bats_tests.len()).as_bytes(),
        );
        self.bats_tests.push(description);
        Some(header)
    }

    /// Track quotes across the line, returning the index of the `#` that
    /// starts a comment, if any
    fn scan_quotes(&mut self, raw: &[u8]) -> Option<usize> {
        let mut prev: Option<u8> = None;
        let mut i = 0;
        while i < raw.len() {
            let b = raw[i];
            match (self.open, b) {
                (Open::Single, b'\'') => self.open = Open::Nothing,
                (Open::Single, _) => {}
                (Open::Ansi | Open::Double, b'\\') => i += 1,
                (Open::Ansi, b'\'') | (Open::Double, b'"') => self.open = Open::Nothing,
                (Open::Ansi | Open::Double, _) => {}
                (Open::Nothing, b'\\') => i += 1,
                (Open::Nothing, b'\'') if prev == Some(b'$') => self.open = Open::Ansi,
                (Open::Nothing, b'\'') => self.open = Open::Single,
                (Open::Nothing, b'"') => self.open = Open::Double,
                (Open::Nothing, b'#') if prev.is_none_or(starts_word) => return Some(i),
                (Open::Nothing, _) => {}
            }
            prev = Some(b);
            i += 1;
        }
        None
    }

    fn pos_at(&self, index: usize) -> Pos {
        Pos::new(
            self.offset.wrapping_add(index as u32),
            self.line_no,
            self.col.saturating_add(index as u32),
        )
    }

    fn advance(&mut self, raw: &[u8]) {
        self.offset = self.offset.wrapping_add(raw.len() as u32);
        if raw.ends_with(b"\n") {
            self.line_no = self.line_no.saturating_add(1);
            self.col = 1;
        } else {
            self.col = self.col.saturating_add(raw.len() as u32);
        }
    }

    /// Position just past the input handed to the grammar so far
    pub(crate) fn end_pos(&self) -> Pos {
        Pos::new(self.offset, self.line_no, self.col)
    }

    pub(crate) fn take_read_err(&mut self) -> Option<io::Error> {
        self.read_err.take()
    }

    pub(crate) fn take_lang_err(&mut self) -> Option<LangError> {
        self.lang_err.take()
    }

    pub(crate) fn take_comments(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.comments)
    }

    pub(crate) fn take_bats_tests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.bats_tests)
    }
}

/// Whether `b` can come right before the first byte of a word
fn starts_word(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b';' | b'&' | b'|' | b'(' | b')')
}

fn starts_with_word(body: &[u8], word: &[u8]) -> bool {
    match body.strip_prefix(word) {
        Some(rest) => rest.first().is_none_or(|&b| b.is_ascii_whitespace() || starts_word(b)),
        None => false,
    }
}

impl<R: Read> Read for Source<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: Read> BufRead for Source<'_, R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while self.line_head >= self.line.len() && !self.stopped {
            self.next_line();
        }
        Ok(&self.line[self.line_head..])
    }

    fn consume(&mut self, amt: usize) {
        self.line_head = (self.line_head + amt).min(self.line.len());
    }
}
