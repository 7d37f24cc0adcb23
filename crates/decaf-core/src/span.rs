//! Source location tracking for diagnostics.
//!
//! A [`Span`] records the first and last line/column a construct covers.
//! Spans order by their starting line, then starting column, which is the
//! order redeclaration checks use to decide which declaration came first.

use std::fmt;

/// A range of source text.
///
/// Lines and columns are 1-indexed. The derived ordering compares `line`
/// first and `col` second, so `a < b` means `a` starts lexically before `b`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Span {
    /// First line covered.
    pub line: u32,
    /// Column of the first character on `line`.
    pub col: u32,
    /// Last line covered.
    pub end_line: u32,
    /// Column just past the last character on `end_line`.
    pub end_col: u32,
}

impl Span {
    /// Create a span covering `line:col` through `end_line:end_col`.
    #[inline]
    pub fn new(line: u32, col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            line,
            col,
            end_line,
            end_col,
        }
    }

    /// Create a zero-width span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// Create a span for a token of `len` columns on one line.
    #[inline]
    pub fn on_line(line: u32, col: u32, len: u32) -> Self {
        Self::new(line, col, line, col + len)
    }

    /// Whether the span covers no text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.line == self.end_line && self.col == self.end_col
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        let (first, _) = if self <= other {
            (self, other)
        } else {
            (other, self)
        };
        let (end_line, end_col) =
            (self.end_line, self.end_col).max((other.end_line, other.end_col));
        Span::new(first.line, first.col, end_line, end_col)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.line, self.col, self.end_line, self.end_col
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
