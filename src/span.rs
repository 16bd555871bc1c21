//! Source location tracking for diagnostics.

use std::fmt;

/// A region of source text.
///
/// `start`/`end` are byte offsets into the source; `line` and `column` are
/// 1-based and point at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// A one-byte span at `offset`.
    pub fn single(offset: usize, line: usize, column: usize) -> Self {
        Self::new(offset, offset + 1, line, column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {} (offset {})",
            self.line, self.column, self.start
        )
    }
}
