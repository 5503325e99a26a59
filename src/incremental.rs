//! Windowed retokenization after one or more text edits.
//!
//! Re-running the whole tokenizer after every keystroke in an editor buffer
//! is wasteful. [`apply_changes`] instead snaps a context window around the
//! edited region out to the nearest untouched token boundaries, retokenizes
//! only that window, and splices the result back between the unaffected
//! tokens before and after it — those are either reused verbatim (before
//! the window, nothing moved) or have their positions recomputed against
//! the new text (after the window, only the offsets/lines moved).
//!
//! # Example
//!
//! ```
//! use resilient_json::{incremental::apply_changes, Tokenizer, TextChange};
//!
//! let text = r#"{"a": 1, "b": 2}"#;
//! let tokens = Tokenizer::new().tokenize(text, None).unwrap();
//! let change = TextChange { start_offset: 6, end_offset: 7, new_text: "9".into() };
//! let update = apply_changes(text, &tokens, &[], &[change], 8, None).unwrap();
//! assert_eq!(update.text, r#"{"a": 9, "b": 2}"#);
//! ```

use crate::code::LineIndex;
use crate::tokenizer::{CancellationToken, Token, Tokenizer};
use crate::{Cancelled, ParseOptions, ParseResult, PathRange, Range};

/// A single text replacement: replace `[start_offset, end_offset)` (byte
/// offsets into the document as it was before this change) with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub start_offset: usize,
    pub end_offset: usize,
    pub new_text: String,
}

/// The result of applying one or more [`TextChange`]s: the new document
/// text, the updated token stream, the surviving path ranges (entries
/// overlapping an edit are dropped rather than guessed at — a caller that
/// needs them back should reparse), and the byte-offset window (in the new
/// text) that was actually retokenized.
#[derive(Debug, Clone)]
pub struct IncrementalUpdate {
    pub text: String,
    pub tokens: Vec<Token>,
    pub path_ranges: Vec<(String, PathRange)>,
    pub window_start: usize,
    pub window_end: usize,
}

/// Apply `changes` (which must be sorted by `start_offset` and
/// non-overlapping) to `text`/`tokens`, retokenizing only a context window
/// around the edits. Entries of `path_ranges` that fall entirely before the
/// first edit are kept as-is; entries entirely after the last edit have
/// their offsets shifted; anything overlapping an edit is dropped.
pub fn apply_changes(
    text: &str,
    tokens: &[Token],
    path_ranges: &[(String, PathRange)],
    changes: &[TextChange],
    context_radius: usize,
    cancel: Option<&dyn CancellationToken>,
) -> Result<IncrementalUpdate, Cancelled> {
    if changes.is_empty() {
        return Ok(IncrementalUpdate {
            text: text.to_string(),
            tokens: tokens.to_vec(),
            path_ranges: path_ranges.to_vec(),
            window_start: 0,
            window_end: 0,
        });
    }

    for pair in changes.windows(2) {
        debug_assert!(
            pair[0].end_offset <= pair[1].start_offset,
            "text changes must be sorted and non-overlapping"
        );
    }

    let new_text = splice(text, changes);

    let raw_start = changes[0].start_offset.saturating_sub(context_radius);
    let raw_end = (changes[changes.len() - 1].end_offset + context_radius).min(text.len());

    let window_start_offset = tokens
        .iter()
        .filter(|t| t.range.start.offset <= raw_start)
        .map(|t| t.range.start.offset)
        .last()
        .unwrap_or(0);
    let window_end_offset = tokens
        .iter()
        .find(|t| t.range.end.offset >= raw_end)
        .map(|t| t.range.end.offset)
        .unwrap_or(text.len());

    let total_byte_delta: isize = changes
        .iter()
        .map(|c| c.new_text.len() as isize - (c.end_offset - c.start_offset) as isize)
        .sum();

    let before_tokens: Vec<Token> = tokens
        .iter()
        .filter(|t| t.range.end.offset <= window_start_offset)
        .copied()
        .collect();
    let after_tokens_old: Vec<Token> = tokens
        .iter()
        .filter(|t| t.range.start.offset >= window_end_offset)
        .copied()
        .collect();

    let window_origin = tokens
        .iter()
        .find(|t| t.range.start.offset == window_start_offset)
        .map(|t| t.range.start)
        .unwrap_or(crate::Position::zero());

    let new_window_start = window_start_offset;
    let new_window_end = (window_end_offset as isize + total_byte_delta) as usize;
    let window_text = &new_text[new_window_start..new_window_end];

    let tokenizer = Tokenizer::new();
    let window_tokens = tokenizer.tokenize_from(window_text, window_origin, cancel)?;

    let new_line_index = LineIndex::new(&new_text);
    let after_tokens: Vec<Token> = after_tokens_old
        .into_iter()
        .map(|t| {
            let new_start_offset = (t.range.start.offset as isize + total_byte_delta) as usize;
            let new_end_offset = (t.range.end.offset as isize + total_byte_delta) as usize;
            Token::new(
                t.kind,
                Range::new(
                    new_line_index.position_at(new_start_offset),
                    new_line_index.position_at(new_end_offset),
                ),
            )
        })
        .collect();

    let mut final_tokens = Vec::with_capacity(before_tokens.len() + window_tokens.len() + after_tokens.len());
    final_tokens.extend(before_tokens);
    final_tokens.extend(window_tokens);
    final_tokens.extend(after_tokens);

    let first_edit_start = changes[0].start_offset;
    let last_edit_end = changes[changes.len() - 1].end_offset;
    let new_path_ranges: Vec<(String, PathRange)> = path_ranges
        .iter()
        .filter_map(|(path, range)| {
            shift_or_drop_path_range(range, first_edit_start, last_edit_end, total_byte_delta, &new_line_index)
                .map(|shifted| (path.clone(), shifted))
        })
        .collect();

    Ok(IncrementalUpdate {
        text: new_text,
        tokens: final_tokens,
        path_ranges: new_path_ranges,
        window_start: new_window_start,
        window_end: new_window_end,
    })
}

/// Keep `range` unchanged if it lies entirely before the first edit, shift
/// it if it lies entirely after the last edit, or drop it (`None`) if it
/// overlaps the edited span at all.
fn shift_or_drop_path_range(
    range: &PathRange,
    first_edit_start: usize,
    last_edit_end: usize,
    total_byte_delta: isize,
    new_line_index: &LineIndex,
) -> Option<PathRange> {
    let spans = [range.name_range, range.value_range];
    let touches_edit = spans.iter().flatten().any(|r| {
        r.start.offset < last_edit_end && r.end.offset > first_edit_start
    });
    if touches_edit {
        return None;
    }

    let entirely_before = spans
        .iter()
        .flatten()
        .all(|r| r.end.offset <= first_edit_start);
    if entirely_before {
        return Some(*range);
    }

    Some(PathRange {
        name_range: range.name_range.map(|r| shift_range(r, total_byte_delta, new_line_index)),
        value_range: range.value_range.map(|r| shift_range(r, total_byte_delta, new_line_index)),
    })
}

fn shift_range(range: Range, delta: isize, line_index: &LineIndex) -> Range {
    let new_start = (range.start.offset as isize + delta) as usize;
    let new_end = (range.end.offset as isize + delta) as usize;
    Range::new(line_index.position_at(new_start), line_index.position_at(new_end))
}

/// [`apply_changes`] followed by a full [`crate::parse`] of the resulting
/// text — for callers that want both the cheap incremental token stream and
/// a fresh value tree/diagnostics/path map in one call.
pub fn apply_changes_with_reparse(
    text: &str,
    tokens: &[Token],
    changes: &[TextChange],
    context_radius: usize,
    parse_options: &ParseOptions,
    cancel: Option<&dyn CancellationToken>,
) -> Result<(IncrementalUpdate, ParseResult), Cancelled> {
    let update = apply_changes(text, tokens, &[], changes, context_radius, cancel)?;
    let parsed = crate::parser::parse(&update.text, parse_options, cancel)?;
    Ok((update, parsed))
}

fn splice(text: &str, changes: &[TextChange]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for change in changes {
        out.push_str(&text[cursor..change.start_offset]);
        out.push_str(&change.new_text);
        cursor = change.end_offset;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TokenKind;

    #[test]
    fn single_char_edit_retokenizes_only_affected_token() {
        let text = r#"{"a": 1, "b": 2}"#;
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let change = TextChange {
            start_offset: 6,
            end_offset: 7,
            new_text: "9".into(),
        };
        let update = apply_changes(text, &tokens, &[], &[change], 4, None).unwrap();
        assert_eq!(update.text, r#"{"a": 9, "b": 2}"#);
        let kinds: Vec<TokenKind> = update.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, tokens.iter().map(|t| t.kind).collect::<Vec<_>>());
    }

    #[test]
    fn tokens_after_window_shift_offsets_by_net_delta() {
        let text = r#"{"a": 1, "b": 2}"#;
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let change = TextChange {
            start_offset: 6,
            end_offset: 7,
            new_text: "999".into(),
        };
        let update = apply_changes(text, &tokens, &[], &[change], 0, None).unwrap();
        let b_token = update
            .tokens
            .iter()
            .find(|t| update.text[t.range.start.offset..t.range.end.offset].contains("\"b\""))
            .unwrap();
        assert_eq!(&update.text[b_token.range.start.offset..b_token.range.end.offset], "\"b\"");
    }

    #[test]
    fn insertion_across_a_newline_shifts_subsequent_lines() {
        let text = "{\n  \"a\": 1,\n  \"b\": 2\n}";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let insert_at = text.find("1,").unwrap() + 1;
        let change = TextChange {
            start_offset: insert_at,
            end_offset: insert_at,
            new_text: "\n  \"extra\": true,".into(),
        };
        let update = apply_changes(text, &tokens, &[], &[change], 2, None).unwrap();
        let b_token = update
            .tokens
            .iter()
            .find(|t| update.text[t.range.start.offset..t.range.end.offset] == *"\"b\"")
            .unwrap();
        assert_eq!(b_token.range.start.line, 3);
    }

    #[test]
    fn no_changes_is_a_no_op() {
        let text = r#"{"a": 1}"#;
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let update = apply_changes(text, &tokens, &[], &[], 10, None).unwrap();
        assert_eq!(update.text, text);
        assert_eq!(update.tokens.len(), tokens.len());
    }

    #[test]
    fn path_range_overlapping_edit_is_dropped_unrelated_one_is_shifted() {
        use crate::{parse, ParseOptions};
        let text = r#"{"a": 1, "b": 2}"#;
        let parsed = parse(text, &ParseOptions::tolerant(), None).unwrap();
        let tokens = parsed.tokens.clone();
        let change = TextChange {
            start_offset: 6,
            end_offset: 7,
            new_text: "999".into(),
        };
        let update = apply_changes(text, &tokens, &parsed.path_ranges, &[change], 0, None).unwrap();

        assert!(update.path_ranges.iter().all(|(p, _)| p != "a"));
        let (_, b_range) = update.path_ranges.iter().find(|(p, _)| p == "b").unwrap();
        let value_range = b_range.value_range.unwrap();
        assert_eq!(&update.text[value_range.start.offset..value_range.end.offset], "2");
    }
}
