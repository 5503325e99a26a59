//! Text-scanning helpers for edit synthesis.
//!
//! Deliberately independent of the tokenizer: a [`Cursor`](super::Cursor)
//! already has the ranges the path map computed, and only needs a little
//! of its own string scanning — tolerant of nested containers and string
//! literals — to find where a minimal edit should land.

use crate::{LineIndex, Position, Range, TextEdit};

pub(crate) fn position_at(text: &str, offset: usize) -> Position {
    LineIndex::new(text).position_at(offset)
}

/// Find the offset of the closer matching the opener at `open`
/// (`text.as_bytes()[open]` must be `{` or `[`). Tolerant of string
/// literals: braces/brackets inside a string, and an escaped quote within
/// one, don't affect the depth count.
pub(crate) fn find_matching_closer(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let closer = match bytes.get(open)? {
        b'{' => b'}',
        b'[' => b']',
        _ => return None,
    };
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut i = open;
    while i < bytes.len() {
        let c = bytes[i];
        if in_string {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match c {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 && c == closer {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// The offset of the first character at or after `from` that is not
/// whitespace and not inside a `//`/`/* */` comment.
pub(crate) fn skip_ws_and_comments_forward(text: &str, from: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = from.min(bytes.len());
    loop {
        while i < bytes.len() && matches!(bytes[i], b' ' | b'\t' | b'\n' | b'\r') {
            i += 1;
        }
        if i + 1 < bytes.len() && bytes[i] == b'/' && bytes[i + 1] == b'/' {
            i += 2;
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if i + 1 < bytes.len() && bytes[i] == b'/' && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
            continue;
        }
        break;
    }
    i
}

/// Trim trailing ASCII whitespace backward from `to`, returning the offset
/// right after the last non-whitespace byte.
pub(crate) fn rtrim_ws_backward(text: &str, to: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = to.min(bytes.len());
    while i > 0 && matches!(bytes[i - 1], b' ' | b'\t' | b'\n' | b'\r') {
        i -= 1;
    }
    i
}

/// The byte offset of the start of the line containing `offset`.
pub(crate) fn line_start_offset(text: &str, offset: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = offset.min(bytes.len());
    while i > 0 && bytes[i - 1] != b'\n' {
        i -= 1;
    }
    i
}

/// The leading run of spaces/tabs on the line starting at `line_start`.
pub(crate) fn indentation_of_line(text: &str, line_start: usize) -> String {
    text[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Split `text[start..end)` (the interior of an object or array) into its
/// top-level comma-separated items, each trimmed of surrounding
/// whitespace/comments. Depth tracking skips over nested containers and
/// string literals so a comma inside either doesn't split an item.
pub(crate) fn top_level_items(text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut items = Vec::new();
    let mut i = skip_ws_and_comments_forward(text, start);
    if i >= end {
        return items;
    }
    loop {
        let item_start = i;
        let mut depth: i32 = 0;
        let mut in_string = false;
        while i < end {
            let c = bytes[i];
            if in_string {
                if c == b'\\' {
                    i += 2;
                    continue;
                }
                if c == b'"' {
                    in_string = false;
                }
                i += 1;
                continue;
            }
            match c {
                b'"' => in_string = true,
                b'{' | b'[' => depth += 1,
                b'}' | b']' => depth -= 1,
                b',' if depth == 0 => break,
                _ => {}
            }
            i += 1;
        }
        let item_end = rtrim_ws_backward(text, i.min(end));
        items.push((item_start, item_end));
        if i >= end {
            break;
        }
        i = skip_ws_and_comments_forward(text, i + 1);
        if i >= end {
            break;
        }
    }
    items
}

/// Build the [`TextEdit`] that removes `text[content_start..content_end)`
/// along with exactly one adjoining comma: the one following it if present,
/// otherwise the one preceding it (the last-item case), otherwise none (the
/// only-item case).
pub(crate) fn remove_span_with_adjoining_comma(
    text: &str,
    content_start: usize,
    content_end: usize,
) -> TextEdit {
    let after = skip_ws_and_comments_forward(text, content_end);
    if text.as_bytes().get(after) == Some(&b',') {
        return TextEdit {
            range: Range::new(position_at(text, content_start), position_at(text, after + 1)),
            new_text: String::new(),
        };
    }

    let before = rtrim_ws_backward(text, content_start);
    if before > 0 && text.as_bytes()[before - 1] == b',' {
        return TextEdit {
            range: Range::new(position_at(text, before - 1), position_at(text, content_end)),
            new_text: String::new(),
        };
    }

    TextEdit {
        range: Range::new(position_at(text, content_start), position_at(text, content_end)),
        new_text: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_closer_skipping_nested_strings_and_braces() {
        let text = r#"{"a": "}", "b": {"c": 1}}"#;
        let close = find_matching_closer(text, 0).unwrap();
        assert_eq!(close, text.len() - 1);
    }

    #[test]
    fn splits_top_level_items_ignoring_nested_commas() {
        let text = r#"[1, {"a": 1, "b": 2}, [3, 4], "x,y"]"#;
        let items = top_level_items(text, 1, text.len() - 1);
        assert_eq!(items.len(), 4);
        assert_eq!(&text[items[1].0..items[1].1], r#"{"a": 1, "b": 2}"#);
        assert_eq!(&text[items[3].0..items[3].1], r#""x,y""#);
    }

    #[test]
    fn removes_trailing_comma_after_span() {
        let text = r#"{"a": 1, "b": 2}"#;
        let edit = remove_span_with_adjoining_comma(text, 1, 8);
        assert_eq!(&text[edit.range.start.offset..edit.range.end.offset], r#""a": 1, "#);
    }
}
