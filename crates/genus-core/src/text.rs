//! Text model primitives: byte spans and line/column conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

pub use text_size::{TextRange, TextSize};

/// A byte-span into a source string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span used for compiler-generated types (capture variables, LUB results).
    pub const fn synthetic() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

impl From<TextRange> for Span {
    fn from(range: TextRange) -> Self {
        Span::new(
            u32::from(range.start()) as usize,
            u32::from(range.end()) as usize,
        )
    }
}

/// Zero-based line and UTF-8 column.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Rendered one-based, the way editors and compilers print positions.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// Start offsets of every line of a source text. `\n`, `\r\n` and a lone `\r` all end a line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineIndex {
    starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![TextSize::from(0)];
        let mut bytes = text.bytes().enumerate().peekable();
        while let Some((at, byte)) = bytes.next() {
            let next_line = match byte {
                b'\r' if bytes.peek().is_some_and(|&(_, b)| b == b'\n') => {
                    bytes.next();
                    at + 2
                }
                b'\r' | b'\n' => at + 1,
                _ => continue,
            };
            starts.push(TextSize::from(next_line as u32));
        }
        Self {
            starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    pub fn line_count(&self) -> u32 {
        self.starts.len() as u32
    }

    /// Position of byte `offset`; offsets past the end map to the end of the text.
    pub fn line_col(&self, offset: usize) -> LineCol {
        let offset = TextSize::from(offset.min(u32::MAX as usize) as u32).min(self.len);
        let line = self.starts.partition_point(|start| *start <= offset) - 1;
        LineCol {
            line: line as u32,
            col: u32::from(offset - self.starts[line]),
        }
    }
}
