//! Conversion between byte offsets and zero-based (line, column) pairs.
//!
//! [`LineIndex`] precomputes the byte offset of every line start so that
//! [`LineIndex::position_at`] and [`LineIndex::offset_at`] run in
//! `O(log n)` instead of re-scanning the document on every call.

use crate::Position;
use once_cell::unsync::OnceCell;

/// Precomputed line-start table for a document.
///
/// The table is built lazily and cached: constructing a `LineIndex` is
/// free, the scan only happens the first time a position is requested.
pub struct LineIndex<'t> {
    text: &'t str,
    line_starts: OnceCell<Vec<usize>>,
}

impl<'t> LineIndex<'t> {
    pub fn new(text: &'t str) -> Self {
        Self {
            text,
            line_starts: OnceCell::new(),
        }
    }

    fn line_starts(&self) -> &Vec<usize> {
        self.line_starts.get_or_init(|| {
            let mut starts = vec![0];
            let bytes = self.text.as_bytes();
            let mut i = 0;
            while i < bytes.len() {
                match bytes[i] {
                    b'\r' => {
                        if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                            starts.push(i + 2);
                            i += 2;
                            continue;
                        }
                        starts.push(i + 1);
                    }
                    b'\n' => starts.push(i + 1),
                    _ => {}
                }
                i += 1;
            }
            starts
        })
    }

    /// Convert a byte offset into a zero-based `Position`.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line_starts = self.line_starts();
        let line = match line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = line_starts[line];
        let column = self.text[line_start..offset].chars().count();
        Position::new(line, column, offset)
    }

    /// Convert a zero-based (line, column) pair into a byte offset, clamping
    /// `column` to the line's length when it overruns.
    pub fn offset_at(&self, line: usize, column: usize) -> usize {
        let line_starts = self.line_starts();
        let Some(&line_start) = line_starts.get(line) else {
            return self.text.len();
        };
        let line_end = line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());
        let mut offset = line_start;
        for (chars_seen, (byte_idx, _)) in self.text[line_start..line_end].char_indices().enumerate()
        {
            if chars_seen == column {
                return line_start + byte_idx;
            }
            offset = line_start + byte_idx;
        }
        // column overruns the line: clamp to end-of-line, trimming any
        // trailing line terminator.
        let mut end = line_end;
        while end > line_start && matches!(self.text.as_bytes()[end - 1], b'\n' | b'\r') {
            end -= 1;
        }
        end.max(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_at_start_of_each_line() {
        let text = "ab\ncd\r\nef";
        let index = LineIndex::new(text);
        assert_eq!(index.position_at(0), Position::new(0, 0, 0));
        assert_eq!(index.position_at(3), Position::new(1, 0, 3));
        assert_eq!(index.position_at(7), Position::new(2, 0, 7));
    }

    #[test]
    fn offset_at_round_trips() {
        let text = "ab\ncd\r\nef";
        let index = LineIndex::new(text);
        for offset in 0..text.len() {
            let pos = index.position_at(offset);
            assert_eq!(index.offset_at(pos.line, pos.column), offset);
        }
    }

    #[test]
    fn lone_cr_counts_as_one_break() {
        let text = "a\rb";
        let index = LineIndex::new(text);
        assert_eq!(index.position_at(2), Position::new(1, 0, 2));
    }
}
