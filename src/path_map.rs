//! Correlates the reader's per-node positions with the token stream to
//! produce a source-range map keyed by dotted/bracketed path.
//!
//! The reader reports, for each property and each array/root value, a
//! one-based (line, column) marking where that node starts. This module's
//! job is to turn that into exact [`Range`]s: for a property, the name
//! range is the matching `String` token, and the value range is whatever
//! token follows the next `Colon` (skipping comments); for a plain value
//! node, the value range is simply the token starting at the reported
//! position.
//!
//! # Example
//!
//! ```
//! use resilient_json::{parse, ParseOptions};
//!
//! let result = parse(r#"{"a": 1}"#, &ParseOptions::tolerant(), None).unwrap();
//! assert!(result.path_ranges.iter().any(|(path, _)| path == "a"));
//! ```

use crate::parser::reader::NodePosition;
use crate::tokenizer::{Token, TokenKind};
use crate::Range;

/// The source ranges of one path's name (if it is a property) and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathRange {
    pub name_range: Option<Range>,
    pub value_range: Option<Range>,
}

pub(crate) fn build(tokens: &[Token], positions: &[NodePosition]) -> Vec<(String, PathRange)> {
    let mut map: Vec<(String, PathRange)> = Vec::new();

    for node in positions {
        let zero_line = node.line.saturating_sub(1);
        let zero_column = node.column.saturating_sub(1);

        if node.is_property {
            let name_index = match find_token_at(tokens, zero_line, zero_column, TokenKind::String)
            {
                Some(i) => i,
                None => continue,
            };
            let name_range = tokens[name_index].range;

            let colon_index = match find_next(tokens, name_index + 1, TokenKind::Colon) {
                Some(i) => i,
                None => {
                    upsert(&mut map, &node.path, Some(name_range), None);
                    continue;
                }
            };

            let value_index = next_significant(tokens, colon_index + 1);
            let value_range = value_index.map(|i| tokens[i].range);
            upsert(&mut map, &node.path, Some(name_range), value_range);
        } else {
            let value_index = find_token_near(tokens, zero_line, zero_column);
            let value_range = value_index.map(|i| tokens[i].range);
            upsert_value_only(&mut map, &node.path, value_range);
        }
    }

    map
}

/// Preserve an existing `name_range`: a later (duplicate-key) occurrence of
/// the same path must not clobber an already-resolved name range unless it
/// is replacing the whole entry (OverwriteWithLast already only emits one
/// position per path by the time this runs, but defensive nonetheless).
fn upsert(
    map: &mut Vec<(String, PathRange)>,
    path: &str,
    name_range: Option<Range>,
    value_range: Option<Range>,
) {
    match map.iter_mut().find(|(p, _)| p == path) {
        Some((_, existing)) => {
            if existing.name_range.is_none() {
                existing.name_range = name_range;
            }
            existing.value_range = value_range.or(existing.value_range);
        }
        None => map.push((
            path.to_string(),
            PathRange {
                name_range,
                value_range,
            },
        )),
    }
}

fn upsert_value_only(map: &mut Vec<(String, PathRange)>, path: &str, value_range: Option<Range>) {
    match map.iter_mut().find(|(p, _)| p == path) {
        Some((_, existing)) => {
            existing.value_range = value_range.or(existing.value_range);
        }
        None => map.push((
            path.to_string(),
            PathRange {
                name_range: None,
                value_range,
            },
        )),
    }
}

fn find_token_at(tokens: &[Token], line: usize, column: usize, kind: TokenKind) -> Option<usize> {
    tokens.iter().position(|t| {
        t.kind == kind && t.range.start.line == line && t.range.start.column == column
    })
}

/// Same as [`find_token_at`] but accepts whichever token kind actually
/// starts at that position (used for non-property value nodes, where the
/// node could be any JSON value).
fn find_token_near(tokens: &[Token], line: usize, column: usize) -> Option<usize> {
    tokens
        .iter()
        .position(|t| t.range.start.line == line && t.range.start.column == column)
}

/// Find `kind` at or after `from`, skipping `Comment` tokens but stopping
/// (returning `None`) at the first other significant token — the colon
/// must be the very next meaningful thing after a property name.
fn find_next(tokens: &[Token], from: usize, kind: TokenKind) -> Option<usize> {
    for (offset, token) in tokens[from..].iter().enumerate() {
        if token.kind == TokenKind::Comment {
            continue;
        }
        return if token.kind == kind {
            Some(from + offset)
        } else {
            None
        };
    }
    None
}

fn next_significant(tokens: &[Token], from: usize) -> Option<usize> {
    tokens[from..]
        .iter()
        .position(|t| t.kind.is_significant())
        .map(|i| i + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, ParseOptions};

    #[test]
    fn simple_object_property_has_name_and_value_ranges() {
        let result = parse(r#"{"a": 1}"#, &ParseOptions::tolerant(), None).unwrap();
        let (_, range) = result.path_ranges.iter().find(|(p, _)| p == "a").unwrap();
        assert!(range.name_range.is_some());
        assert!(range.value_range.is_some());
    }

    #[test]
    fn array_element_has_only_value_range() {
        let result = parse(r#"{"a": [1, 2]}"#, &ParseOptions::tolerant(), None).unwrap();
        let (_, range) = result.path_ranges.iter().find(|(p, _)| p == "a[1]").unwrap();
        assert!(range.name_range.is_none());
        assert!(range.value_range.is_some());
    }

    #[test]
    fn nested_property_path_resolves() {
        let result = parse(r#"{"a": {"b": [1, {"c": 2}]}}"#, &ParseOptions::tolerant(), None).unwrap();
        assert!(result
            .path_ranges
            .iter()
            .any(|(p, r)| p == "a.b[1].c" && r.name_range.is_some() && r.value_range.is_some()));
    }
}
