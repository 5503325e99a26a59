//! Edit synthesis: turn a path plus an intended change into a minimal
//! [`TextEdit`] against the original document, using only the ranges the
//! path map already computed — no reparse, no re-tokenize.
//!
//! A [`Cursor`] is a snapshot, not a live handle: it's resolved once from a
//! [`ParseResult`] and a path, and every edit method it exposes returns a
//! single `TextEdit` (or `None` if the requested operation doesn't apply to
//! what's at that path) rather than mutating anything itself. Applying the
//! edit and re-parsing is the caller's job.

mod helpers;

use crate::value::Value;
use crate::{ParseResult, Range};

/// What kind of node a [`Cursor`] is resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    /// The value at this path is a JSON object.
    Object,
    /// The value at this path is a JSON array.
    Array,
    /// This path names a property slot inside a parent object (its
    /// `name_range` is always `Some`); the property's own value may be any
    /// JSON type.
    Property,
    /// A scalar (string, number, bool, null) that is not itself a property
    /// — an array element or the document root.
    Value,
}

/// A single text replacement, as produced by the cursor and comma-policy
/// edit-synthesis functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// A resolved reference to one path in a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub path: String,
    pub kind: CursorKind,
    pub name_range: Option<Range>,
    pub value_range: Option<Range>,
    pub parent_path: Option<String>,
}

enum Segment<'p> {
    Property(&'p str),
    Index(usize),
}

fn parse_path(path: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = path;
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('[') {
            let end = stripped.find(']').unwrap_or(stripped.len());
            if let Ok(index) = stripped[..end].parse::<usize>() {
                segments.push(Segment::Index(index));
            }
            rest = stripped.get(end + 1..).unwrap_or("");
        } else {
            let dot = rest.find('.');
            let bracket = rest.find('[');
            let end = match (dot, bracket) {
                (Some(d), Some(b)) => d.min(b),
                (Some(d), None) => d,
                (None, Some(b)) => b,
                (None, None) => rest.len(),
            };
            segments.push(Segment::Property(&rest[..end]));
            rest = &rest[end..];
        }
        rest = rest.strip_prefix('.').unwrap_or(rest);
    }
    segments
}

fn navigate<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(root);
    }
    let mut current = root;
    for segment in parse_path(path) {
        current = match segment {
            Segment::Property(name) => current.get(name)?,
            Segment::Index(i) => current.index(i)?,
        };
    }
    Some(current)
}

/// The path of the container holding `path`'s node: strips the trailing
/// `.name` or `[index]` segment. `None` only for the root path `""`.
fn parent_path_of(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    if let Some(idx) = path.rfind('[') {
        if path.ends_with(']') {
            return Some(path[..idx].to_string());
        }
    }
    match path.rfind('.') {
        Some(idx) => Some(path[..idx].to_string()),
        None => Some(String::new()),
    }
}

/// If `path`'s trailing segment is a `[index]`, return that index.
fn trailing_index(path: &str) -> Option<usize> {
    if !path.ends_with(']') {
        return None;
    }
    let open = path.rfind('[')?;
    path[open + 1..path.len() - 1].parse::<usize>().ok()
}

impl Cursor {
    /// Resolve `path` against an already-parsed document. Returns `None` if
    /// the path doesn't resolve to a value in `result.root`, or the
    /// document failed to parse at all.
    pub fn from_path(result: &ParseResult, path: &str) -> Option<Cursor> {
        let root = result.root.as_ref()?;
        let value = navigate(root, path)?;
        let range = result
            .path_ranges
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, r)| *r)
            .unwrap_or_default();

        let kind = if range.name_range.is_some() {
            CursorKind::Property
        } else {
            match value {
                Value::Object(_) => CursorKind::Object,
                Value::Array(_) => CursorKind::Array,
                _ => CursorKind::Value,
            }
        };

        Some(Cursor {
            path: path.to_string(),
            kind,
            name_range: range.name_range,
            value_range: range.value_range,
            parent_path: parent_path_of(path),
        })
    }

    /// Replace this node's value in place. Works regardless of `kind` — a
    /// property's value, an array element, or the whole root can all be
    /// overwritten this way.
    pub fn set(&self, new_value: &Value) -> Option<TextEdit> {
        Some(TextEdit {
            range: self.value_range?,
            new_text: new_value.to_json(),
        })
    }

    /// Insert a new `key: value` member. Only applies when this cursor's
    /// value is a JSON object (checked by inspecting the text at
    /// `value_range`, not by `kind`, since a `Property` cursor's value may
    /// itself be an object).
    pub fn insert_property(&self, text: &str, key: &str, value: &Value) -> Option<TextEdit> {
        let value_range = self.value_range?;
        let open = value_range.start.offset;
        if text.as_bytes().get(open).copied() != Some(b'{') {
            return None;
        }
        let close = helpers::find_matching_closer(text, open)?;
        let inner_start = open + 1;
        let indent = helpers::indentation_of_line(text, helpers::line_start_offset(text, open));
        let member_indent = format!("{indent}  ");
        let entry_text = format!("{}: {}", Value::String(key.to_string()).to_json(), value.to_json());

        if helpers::skip_ws_and_comments_forward(text, inner_start) >= close {
            let new_text = format!("\n{member_indent}{entry_text}\n{indent}");
            return Some(TextEdit {
                range: Range::new(helpers::position_at(text, inner_start), helpers::position_at(text, close)),
                new_text,
            });
        }

        let last_content_end = helpers::rtrim_ws_backward(text, close);
        Some(TextEdit {
            range: Range::point(helpers::position_at(text, last_content_end)),
            new_text: format!(",\n{member_indent}{entry_text}"),
        })
    }

    /// Append `value` as the last element. Only applies when this cursor's
    /// value is a JSON array.
    pub fn insert_array_item(&self, text: &str, value: &Value) -> Option<TextEdit> {
        let value_range = self.value_range?;
        let open = value_range.start.offset;
        if text.as_bytes().get(open).copied() != Some(b'[') {
            return None;
        }
        let close = helpers::find_matching_closer(text, open)?;
        let inner_start = open + 1;
        let indent = helpers::indentation_of_line(text, helpers::line_start_offset(text, open));
        let item_indent = format!("{indent}  ");
        let item_text = value.to_json();

        if helpers::skip_ws_and_comments_forward(text, inner_start) >= close {
            let new_text = format!("\n{item_indent}{item_text}\n{indent}");
            return Some(TextEdit {
                range: Range::new(helpers::position_at(text, inner_start), helpers::position_at(text, close)),
                new_text,
            });
        }

        let last_content_end = helpers::rtrim_ws_backward(text, close);
        Some(TextEdit {
            range: Range::point(helpers::position_at(text, last_content_end)),
            new_text: format!(",\n{item_indent}{item_text}"),
        })
    }

    /// Insert `value` at `index`, shifting the current element at `index`
    /// (and everything after it) down by one. An out-of-range `index`
    /// appends, same as [`Cursor::insert_array_item`].
    pub fn insert_array_item_at(&self, text: &str, index: usize, value: &Value) -> Option<TextEdit> {
        let value_range = self.value_range?;
        let open = value_range.start.offset;
        if text.as_bytes().get(open).copied() != Some(b'[') {
            return None;
        }
        let close = helpers::find_matching_closer(text, open)?;
        let items = helpers::top_level_items(text, open + 1, close);

        match items.get(index) {
            Some(&(item_start, _)) => {
                let indent = helpers::indentation_of_line(text, helpers::line_start_offset(text, item_start));
                Some(TextEdit {
                    range: Range::point(helpers::position_at(text, item_start)),
                    new_text: format!("{},\n{indent}", value.to_json()),
                })
            }
            None => self.insert_array_item(text, value),
        }
    }

    /// Remove this property (its `"key": value` pair, plus whichever
    /// adjoining comma keeps the object valid). Only applies when this
    /// cursor has a `name_range`, i.e. `kind == Property`.
    pub fn remove_property(&self, text: &str) -> Option<TextEdit> {
        let name_range = self.name_range?;
        let value_range = self.value_range?;
        Some(helpers::remove_span_with_adjoining_comma(
            text,
            name_range.start.offset,
            value_range.end.offset,
        ))
    }

    /// Remove the element at `index` from this array (plus whichever
    /// adjoining comma keeps it valid). Only applies when this cursor's
    /// value is a JSON array.
    pub fn remove_array_item(&self, text: &str, index: usize) -> Option<TextEdit> {
        let value_range = self.value_range?;
        let open = value_range.start.offset;
        if text.as_bytes().get(open).copied() != Some(b'[') {
            return None;
        }
        let close = helpers::find_matching_closer(text, open)?;
        let items = helpers::top_level_items(text, open + 1, close);
        let &(item_start, item_end) = items.get(index)?;
        Some(helpers::remove_span_with_adjoining_comma(text, item_start, item_end))
    }

    /// Remove this node itself from its parent: a property removes
    /// `"key": value`; an array element finds its index in the parent array
    /// and removes it the same way [`Cursor::remove_array_item`] would.
    /// Anything else — there is no parent to remove from (the root), or the
    /// parent can't be resolved — returns `None`.
    pub fn remove_self(&self, result: &ParseResult, text: &str) -> Option<TextEdit> {
        if self.name_range.is_some() {
            return self.remove_property(text);
        }
        let index = trailing_index(&self.path)?;
        let parent_path = self.parent_path.as_deref()?;
        let parent = Cursor::from_path(result, parent_path)?;
        parent.remove_array_item(text, index)
    }

    /// Convenience: resolve `object_path.key` and remove that property,
    /// without the caller needing a [`Cursor`] for the child in hand first.
    pub fn remove_property_named(result: &ParseResult, text: &str, object_path: &str, key: &str) -> Option<TextEdit> {
        let target = if object_path.is_empty() {
            key.to_string()
        } else {
            format!("{object_path}.{key}")
        };
        Cursor::from_path(result, &target)?.remove_property(text)
    }

    /// Convenience: resolve `path` and remove it in one call.
    pub fn remove_at(result: &ParseResult, text: &str, path: &str) -> Option<TextEdit> {
        Cursor::from_path(result, path)?.remove_self(result, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, ParseOptions};

    fn parsed(text: &str) -> ParseResult {
        parse(text, &ParseOptions::tolerant(), None).unwrap()
    }

    #[test]
    fn from_path_classifies_object_array_property_and_value() {
        let text = r#"{"obj": {"x": 1}, "arr": [1, 2], "n": 3}"#;
        let result = parsed(text);

        assert_eq!(Cursor::from_path(&result, "obj").unwrap().kind, CursorKind::Property);
        let obj_value = Cursor::from_path(&result, "obj.x").unwrap();
        assert_eq!(obj_value.kind, CursorKind::Property);
        let array_item = Cursor::from_path(&result, "arr[0]").unwrap();
        assert_eq!(array_item.kind, CursorKind::Value);
        assert_eq!(array_item.parent_path.as_deref(), Some("arr"));
    }

    #[test]
    fn set_replaces_value_text() {
        let text = r#"{"a": 1}"#;
        let result = parsed(text);
        let cursor = Cursor::from_path(&result, "a").unwrap();
        let edit = cursor.set(&Value::Number(42.0)).unwrap();
        assert_eq!(&text[edit.range.start.offset..edit.range.end.offset], "1");
        assert_eq!(edit.new_text, "42");
    }

    #[test]
    fn insert_property_into_nonempty_object_adds_comma_and_entry() {
        let text = "{\n  \"a\": 1\n}";
        let result = parsed(text);
        let cursor = Cursor::from_path(&result, "").unwrap();
        let edit = cursor.insert_property(text, "b", &Value::Bool(true)).unwrap();
        assert!(edit.new_text.starts_with(",\n"));
        assert!(edit.new_text.contains("\"b\": true"));
    }

    #[test]
    fn insert_property_into_empty_object_has_no_comma() {
        let text = "{}";
        let result = parsed(text);
        let cursor = Cursor::from_path(&result, "").unwrap();
        let edit = cursor.insert_property(text, "a", &Value::Null).unwrap();
        assert!(!edit.new_text.contains(','));
        assert!(edit.new_text.contains("\"a\": null"));
    }

    #[test]
    fn insert_array_item_appends_after_last_element() {
        let text = "[1, 2]";
        let result = parsed(text);
        let cursor = Cursor::from_path(&result, "").unwrap();
        let edit = cursor.insert_array_item(text, &Value::Number(3.0)).unwrap();
        assert!(edit.new_text.starts_with(",\n"));
        assert!(edit.new_text.contains('3'));
    }

    #[test]
    fn insert_array_item_at_shifts_existing_element() {
        let text = "[1, 2]";
        let result = parsed(text);
        let cursor = Cursor::from_path(&result, "").unwrap();
        let edit = cursor.insert_array_item_at(text, 1, &Value::Number(9.0)).unwrap();
        assert!(edit.new_text.starts_with('9'));
        assert_eq!(edit.range.start.offset, edit.range.end.offset);
    }

    #[test]
    fn remove_property_removes_pair_and_comma() {
        let text = r#"{"a": 1, "b": 2}"#;
        let result = parsed(text);
        let cursor = Cursor::from_path(&result, "a").unwrap();
        let edit = cursor.remove_property(text).unwrap();
        let mut after = text.to_string();
        after.replace_range(edit.range.start.offset..edit.range.end.offset, &edit.new_text);
        assert_eq!(after, r#"{"b": 2}"#);
    }

    #[test]
    fn remove_self_on_last_property_removes_preceding_comma() {
        let text = r#"{"a": 1, "b": 2}"#;
        let result = parsed(text);
        let cursor = Cursor::from_path(&result, "b").unwrap();
        let edit = cursor.remove_self(&result, text).unwrap();
        let mut after = text.to_string();
        after.replace_range(edit.range.start.offset..edit.range.end.offset, &edit.new_text);
        assert_eq!(after, r#"{"a": 1}"#);
    }

    #[test]
    fn remove_self_on_array_element_removes_it_via_parent() {
        let text = "[1, 2, 3]";
        let result = parsed(text);
        let cursor = Cursor::from_path(&result, "[1]").unwrap();
        let edit = cursor.remove_self(&result, text).unwrap();
        let mut after = text.to_string();
        after.replace_range(edit.range.start.offset..edit.range.end.offset, &edit.new_text);
        assert_eq!(after, "[1, 3]");
    }

    #[test]
    fn remove_self_on_root_returns_none() {
        let text = "[1, 2, 3]";
        let result = parsed(text);
        let cursor = Cursor::from_path(&result, "").unwrap();
        assert!(cursor.remove_self(&result, text).is_none());
    }

    #[test]
    fn remove_array_item_by_index() {
        let text = "[1, 2, 3]";
        let result = parsed(text);
        let cursor = Cursor::from_path(&result, "").unwrap();
        let edit = cursor.remove_array_item(text, 1).unwrap();
        let mut after = text.to_string();
        after.replace_range(edit.range.start.offset..edit.range.end.offset, &edit.new_text);
        assert_eq!(after, "[1, 3]");
    }

    #[test]
    fn remove_at_resolves_path_and_removes_in_one_call() {
        let text = r#"{"a": {"b": 1}, "c": 2}"#;
        let result = parsed(text);
        let edit = Cursor::remove_at(&result, text, "a").unwrap();
        let mut after = text.to_string();
        after.replace_range(edit.range.start.offset..edit.range.end.offset, &edit.new_text);
        assert_eq!(after, r#"{"c": 2}"#);
    }

    #[test]
    fn remove_property_named_finds_nested_child() {
        let text = r#"{"outer": {"a": 1, "b": 2}}"#;
        let result = parsed(text);
        let edit = Cursor::remove_property_named(&result, text, "outer", "a").unwrap();
        let mut after = text.to_string();
        after.replace_range(edit.range.start.offset..edit.range.end.offset, &edit.new_text);
        assert_eq!(after, r#"{"outer": {"b": 2}}"#);
    }
}
