//! Interactive comma repair: the single-edit checks an editor integration
//! runs right after a keystroke, as opposed to the sanitizer's whole-document
//! repair pass.
//!
//! Both functions here look only at the two tokens immediately straddling
//! `caret` — they do not rescan the document — so they are cheap enough to
//! call on every newline/closing-bracket keystroke.

use crate::tokenizer::{Token, TokenKind};
use crate::{Range, TextEdit};

/// If `caret` sits between a value-ending token and what looks like the
/// start of a new property (a `String` followed, skipping any comments, by
/// a `Colon`) with no separating comma, return the edit that inserts one.
/// Returns `None` when no comma is needed (a closer follows, a comma is
/// already there, the next token isn't a property name, or there's no
/// value on one side) — in particular, this never fires between two bare
/// array elements, since neither looks like a property name.
pub fn try_insert_comma_before_newline(text: &str, tokens: &[Token], caret: usize) -> Option<TextEdit> {
    debug_assert!(caret <= text.len());

    let prev = tokens.iter().rev().find(|t| t.range.end.offset <= caret)?;
    if !ends_a_value(prev.kind) {
        return None;
    }

    let next_index = tokens
        .iter()
        .position(|t| t.range.start.offset >= caret && t.kind.is_significant())?;
    if !looks_like_property_name(tokens, next_index) {
        return None;
    }

    Some(TextEdit {
        range: Range::point(prev.range.end),
        new_text: ",".to_string(),
    })
}

/// If `caret` sits between a trailing comma and a closing brace/bracket —
/// tolerating whitespace and comments in between on either side — return
/// the edit that removes the comma.
pub fn try_remove_comma_before_closer(text: &str, tokens: &[Token], caret: usize) -> Option<TextEdit> {
    debug_assert!(caret <= text.len());

    let next = tokens
        .iter()
        .find(|t| t.range.start.offset >= caret && t.kind.is_significant())?;
    if !matches!(next.kind, TokenKind::RightBrace | TokenKind::RightBracket) {
        return None;
    }

    let prev = tokens
        .iter()
        .rev()
        .find(|t| t.range.end.offset <= caret && t.kind.is_significant())?;
    if prev.kind != TokenKind::Comma {
        return None;
    }

    Some(TextEdit {
        range: prev.range,
        new_text: String::new(),
    })
}

/// Whether `tokens[start]` is a `String` immediately followed — skipping
/// any `Comment` tokens — by a `Colon`, i.e. looks like a property name.
fn looks_like_property_name(tokens: &[Token], start: usize) -> bool {
    if tokens.get(start).map(|t| t.kind) != Some(TokenKind::String) {
        return false;
    }
    let mut i = start + 1;
    while let Some(t) = tokens.get(i) {
        match t.kind {
            TokenKind::Comment => i += 1,
            TokenKind::Colon => return true,
            _ => return false,
        }
    }
    false
}

fn ends_a_value(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::String
            | TokenKind::Number
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::RightBrace
            | TokenKind::RightBracket
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    #[test]
    fn inserts_comma_between_adjacent_properties() {
        let text = "{\"a\": 1\n\"b\": 2}";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let caret = text.find('\n').unwrap();
        let edit = try_insert_comma_before_newline(text, &tokens, caret).unwrap();
        assert_eq!(edit.new_text, ",");
    }

    #[test]
    fn does_not_insert_before_closer() {
        let text = "{\"a\": 1\n}";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let caret = text.find('\n').unwrap();
        assert!(try_insert_comma_before_newline(text, &tokens, caret).is_none());
    }

    #[test]
    fn does_not_insert_when_comma_already_present() {
        let text = "{\"a\": 1,\n\"b\": 2}";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let caret = text.find('\n').unwrap();
        assert!(try_insert_comma_before_newline(text, &tokens, caret).is_none());
    }

    #[test]
    fn does_not_insert_between_bare_array_elements() {
        let text = "[1\n2]";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let caret = text.find('\n').unwrap();
        assert!(try_insert_comma_before_newline(text, &tokens, caret).is_none());
    }

    #[test]
    fn does_not_insert_before_a_string_with_no_colon() {
        let text = "{\"a\": 1\n\"stray\"}";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let caret = text.find('\n').unwrap();
        assert!(try_insert_comma_before_newline(text, &tokens, caret).is_none());
    }

    #[test]
    fn inserts_comma_when_a_comment_separates_the_name_from_its_colon() {
        let text = "{\"a\": 1\n\"b\" /* c */ : 2}";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let caret = text.find('\n').unwrap();
        let edit = try_insert_comma_before_newline(text, &tokens, caret).unwrap();
        assert_eq!(edit.new_text, ",");
    }

    #[test]
    fn removes_trailing_comma_before_closer() {
        let text = "{\"a\": 1,\n}";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let caret = text.find('\n').unwrap();
        let edit = try_remove_comma_before_closer(text, &tokens, caret).unwrap();
        assert_eq!(edit.new_text, "");
        assert_eq!(&text[edit.range.start.offset..edit.range.end.offset], ",");
    }

    #[test]
    fn no_removal_when_no_trailing_comma() {
        let text = "{\"a\": 1\n}";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let caret = text.find('\n').unwrap();
        assert!(try_remove_comma_before_closer(text, &tokens, caret).is_none());
    }

    #[test]
    fn removes_trailing_comma_across_a_comment_before_closer() {
        let text = "{\"a\": 1, /* c */ }";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let caret = text.find('}').unwrap();
        let edit = try_remove_comma_before_closer(text, &tokens, caret).unwrap();
        assert_eq!(edit.new_text, "");
        assert_eq!(&text[edit.range.start.offset..edit.range.end.offset], ",");
    }
}
