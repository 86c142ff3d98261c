//! Source positions
//!
//! A [`Pos`] packs a byte offset together with a line and a column number.
//! Lines and columns share one `u32`, so both have a bounded range; values
//! that don't fit are stored as 0 instead of wrapping into each other.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

const LINE_BITS: u32 = 18;
const COL_BITS: u32 = 14;

/// Largest line number a [`Pos`] can hold
pub const MAX_LINE: u32 = (1 << LINE_BITS) - 1;
/// Largest column number a [`Pos`] can hold
pub const MAX_COL: u32 = (1 << COL_BITS) - 1;

/// A position within a shell source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pos {
    offset: u32,
    line_col: u32,
}

impl Pos {
    /// Create a position from a byte offset, a line and a column.
    ///
    /// A `line` above [`MAX_LINE`] or a `col` above [`MAX_COL`] is replaced
    /// with 0.
    pub fn new(offset: u32, line: u32, col: u32) -> Self {
        let line = if line > MAX_LINE { 0 } else { line };
        let col = if col > MAX_COL { 0 } else { col };
        Self {
            offset,
            line_col: (line << COL_BITS) | col,
        }
    }

    /// Byte offset in the original source, starting at 0.
    ///
    /// Inputs larger than 4GiB wrap around.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Line number, starting at 1
    pub fn line(&self) -> u32 {
        self.line_col >> COL_BITS
    }

    /// Column number in bytes, starting at 1
    pub fn col(&self) -> u32 {
        self.line_col & MAX_COL
    }

    /// Whether the position carries any information at all.
    ///
    /// Only the zero position is invalid; the parser uses it for tokens that
    /// were never seen, such as the terminator of a statement without `;`.
    pub fn is_valid(&self) -> bool {
        *self != Pos::default()
    }

    /// Whether `self` comes after `other` in the source
    pub fn after(&self, other: Pos) -> bool {
        self.offset > other.offset
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line(), self.col())
    }
}

impl Serialize for Pos {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Pos", 3)?;
        state.serialize_field("offset", &self.offset())?;
        state.serialize_field("line", &self.line())?;
        state.serialize_field("col", &self.col())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_roundtrips_fields() {
        let pos = Pos::new(42, 3, 7);
        assert_eq!(pos.offset(), 42);
        assert_eq!(pos.line(), 3);
        assert_eq!(pos.col(), 7);
        assert!(pos.is_valid());
    }

    #[test]
    fn test_pos_overflow_is_zeroed() {
        let pos = Pos::new(1, MAX_LINE + 1, MAX_COL + 1);
        assert_eq!(pos.line(), 0);
        assert_eq!(pos.col(), 0);
        assert_eq!(pos.offset(), 1);

        let pos = Pos::new(1, MAX_LINE, MAX_COL);
        assert_eq!(pos.line(), MAX_LINE);
        assert_eq!(pos.col(), MAX_COL);
    }

    #[test]
    fn test_zero_pos_is_invalid() {
        assert!(!Pos::default().is_valid());
        assert!(!Pos::new(0, 0, 0).is_valid());
        assert!(Pos::new(0, 1, 1).is_valid());
    }

    #[test]
    fn test_pos_after() {
        let a = Pos::new(1, 1, 2);
        let b = Pos::new(5, 1, 6);
        assert!(b.after(a));
        assert!(!a.after(b));
        assert!(!a.after(a));
    }

    #[test]
    fn test_pos_display() {
        assert_eq!(Pos::new(10, 2, 4).to_string(), "2:4");
    }
}
