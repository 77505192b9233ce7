//! Source location tracking

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A location in source text.
///
/// `line` and `column` are 1-indexed, `column` counts characters rather than
/// bytes. Positions coming from an editor may carry a zero `byte_offset`, so
/// ordering between positions only looks at line and column.
///
/// `==` and `Hash` still include `byte_offset`. Two positions on the same
/// character compare equal under [`cmp_loc`](Position::cmp_loc) but not
/// under `==` unless their offsets agree, so compare cursors with `cmp_loc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub byte_offset: u32,
}

impl Position {
    pub fn new(line: u32, column: u32, byte_offset: u32) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }

    /// A position known only by line and column (editor cursors).
    pub fn at(line: u32, column: u32) -> Self {
        Self::new(line, column, 0)
    }

    /// The first character of a document
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }

    /// Compare by line, then column
    pub fn cmp_loc(&self, other: &Position) -> Ordering {
        (self.line, self.column).cmp(&(other.line, other.column))
    }

    pub fn is_before(&self, other: &Position) -> bool {
        self.cmp_loc(other) == Ordering::Less
    }

    pub fn is_after(&self, other: &Position) -> bool {
        self.cmp_loc(other) == Ordering::Greater
    }

    /// The position reached after reading `text` starting here
    pub fn advance(&self, text: &str) -> Position {
        let mut next = *self;
        for ch in text.chars() {
            if ch == '\n' {
                next.line += 1;
                next.column = 1;
            } else {
                next.column += 1;
            }
        }
        next.byte_offset += text.len() as u32;
        next
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span representing a range in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Position of the first character
    pub start: Position,
    /// Position just past the last character
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width span at `pos`
    pub fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn dummy() -> Self {
        Self::point(Position::start())
    }

    /// Merge two spans into one that covers both
    pub fn merge(self, other: Span) -> Span {
        let start = if other.start.is_before(&self.start) {
            other.start
        } else {
            self.start
        };
        let end = if other.end.is_after(&self.end) {
            other.end
        } else {
            self.end
        };
        Span { start, end }
    }

    /// Whether `pos` lies within the span, both bounds inclusive
    pub fn contains(&self, pos: Position) -> bool {
        !pos.is_before(&self.start) && !pos.is_after(&self.end)
    }

    /// Whether `other` lies within this span, boundaries included
    pub fn encloses(&self, other: &Span) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    pub fn is_empty(&self) -> bool {
        self.start.cmp_loc(&self.end) == Ordering::Equal
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tracks_lines_and_bytes() {
        let pos = Position::start().advance("ab\ncd");
        assert_eq!(pos, Position::new(2, 3, 5));
    }

    #[test]
    fn test_advance_counts_characters() {
        let pos = Position::start().advance("é");
        assert_eq!(pos.column, 2);
        assert_eq!(pos.byte_offset, 2);
    }

    #[test]
    fn test_ordering_ignores_offset() {
        let cursor = Position::at(3, 4);
        let token = Position::new(3, 4, 40);
        assert_eq!(cursor.cmp_loc(&token), Ordering::Equal);
        assert_ne!(cursor, token);
        assert!(Position::at(2, 90).is_before(&token));
    }

    #[test]
    fn test_merge_and_contains() {
        let a = Span::new(Position::at(1, 1), Position::at(1, 5));
        let b = Span::new(Position::at(2, 1), Position::at(2, 3));
        let merged = a.merge(b);
        assert_eq!(merged.start, a.start);
        assert_eq!(merged.end, b.end);
        assert!(merged.contains(Position::at(1, 9)));
        assert!(merged.encloses(&a));
        assert!(!a.contains(Position::at(2, 1)));
    }
}
