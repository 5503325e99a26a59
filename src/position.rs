use crate::{Position, Range};
use std::fmt::{Display, Formatter};

impl Position {
    /// Create a new zero-based `Position`.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("")
            .field("line", &self.line)
            .field("column", &self.column)
            .field("offset", &self.offset)
            .finish()
    }
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start.offset <= end.offset);
        Self { start, end }
    }

    /// A zero-width range at `position`.
    pub fn point(position: Position) -> Self {
        Self::new(position, position)
    }

    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// `true` iff this range and `other` overlap, i.e. share at least one
    /// offset. Two ranges that merely touch at an endpoint do not overlap,
    /// since `end` is exclusive.
    pub fn intersects(&self, other: &Range) -> bool {
        self.start.offset < other.end.offset && self.end.offset > other.start.offset
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
