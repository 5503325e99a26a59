//! The strict recursive-descent reader driven by the tokenizer's output.
//!
//! This is the "strict reader" the parser driver wraps: a hand-written
//! `Value` builder rather than a pass-through to an external JSON crate, so
//! that duplicate-key policy, depth tracking, and per-node (line, column)
//! capture are all directly available to the path-map builder the way the
//! distilled design requires.

use crate::tokenizer::{Token, TokenKind};
use crate::{DuplicatePropertyHandling, Value};

/// A single node's reader-reported position, one-based to mirror the
/// convention of a real external JSON reader (diagnostics and the path-map
/// builder convert to zero-based on their own).
#[derive(Debug, Clone)]
pub struct NodePosition {
    pub path: String,
    pub line: usize,
    pub column: usize,
    pub is_property: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadErrorKind {
    InvalidToken,
    DepthLimitExceeded,
    DuplicateKey,
}

#[derive(Debug, Clone)]
pub struct ReadError {
    pub kind: ReadErrorKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub path: Option<String>,
}

enum Segment {
    Property(String),
    Index(usize),
}

pub struct ReadOutcome {
    pub root: Value,
    pub positions: Vec<NodePosition>,
}

pub(crate) fn read(
    text: &str,
    tokens: &[Token],
    allow_comments: bool,
    duplicate_property_handling: DuplicatePropertyHandling,
    max_depth: Option<usize>,
) -> Result<ReadOutcome, ReadError> {
    let mut reader = Reader {
        text,
        tokens,
        pos: 0,
        allow_comments,
        dup_handling: duplicate_property_handling,
        max_depth,
        path_stack: Vec::new(),
        positions: Vec::new(),
    };

    reader.skip_comments();
    if reader.tokens.is_empty() {
        return Err(ReadError {
            kind: ReadErrorKind::InvalidToken,
            message: "Unexpected end of input.".into(),
            line: 1,
            column: 1,
            path: None,
        });
    }

    let start = reader.current().unwrap();
    let (line, column) = reader.one_based(start);
    let root = reader.read_value(0)?;
    reader.record(String::new(), line, column, false);

    reader.skip_comments();
    if reader.pos < reader.tokens.len() {
        let extra = reader.current().unwrap();
        let (line, column) = reader.one_based(extra);
        return Err(ReadError {
            kind: ReadErrorKind::InvalidToken,
            message: "Unexpected trailing content after JSON value.".into(),
            line,
            column,
            path: None,
        });
    }

    Ok(ReadOutcome {
        root,
        positions: reader.positions,
    })
}

struct Reader<'t> {
    text: &'t str,
    tokens: &'t [Token],
    pos: usize,
    allow_comments: bool,
    dup_handling: DuplicatePropertyHandling,
    max_depth: Option<usize>,
    path_stack: Vec<Segment>,
    positions: Vec<NodePosition>,
}

impl<'t> Reader<'t> {
    fn skip_comments(&mut self) {
        if !self.allow_comments {
            return;
        }
        while let Some(token) = self.tokens.get(self.pos) {
            if token.kind == TokenKind::Comment {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn one_based(&self, token: &Token) -> (usize, usize) {
        (token.range.start.line + 1, token.range.start.column + 1)
    }

    fn text_of(&self, token: &Token) -> &'t str {
        &self.text[token.range.start.offset..token.range.end.offset]
    }

    fn error_at(&self, kind: ReadErrorKind, message: impl Into<String>) -> ReadError {
        let (line, column) = match self.current() {
            Some(token) => self.one_based(token),
            None => self.end_of_input_position(),
        };
        ReadError {
            kind,
            message: message.into(),
            line,
            column,
            path: Some(self.current_path()),
        }
    }

    fn end_of_input_position(&self) -> (usize, usize) {
        match self.tokens.last() {
            Some(last) => {
                let p = last.range.end;
                (p.line + 1, p.column + 1)
            }
            None => (1, 1),
        }
    }

    fn current_path(&self) -> String {
        compose_path(&self.path_stack)
    }

    fn record(&mut self, path: String, line: usize, column: usize, is_property: bool) {
        self.positions.push(NodePosition {
            path,
            line,
            column,
            is_property,
        });
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<&'t Token, ReadError> {
        self.skip_comments();
        match self.current() {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token)
            }
            Some(token) => {
                let (line, column) = self.one_based(token);
                Err(ReadError {
                    kind: ReadErrorKind::InvalidToken,
                    message: format!("Expected {} but found {:?}.", what, token.kind),
                    line,
                    column,
                    path: Some(self.current_path()),
                })
            }
            None => {
                let (line, column) = self.end_of_input_position();
                Err(ReadError {
                    kind: ReadErrorKind::InvalidToken,
                    message: format!("Expected {} but reached end of input.", what),
                    line,
                    column,
                    path: Some(self.current_path()),
                })
            }
        }
    }

    fn read_value(&mut self, depth: usize) -> Result<Value, ReadError> {
        if let Some(max) = self.max_depth {
            if depth > max {
                return Err(self.error_at(
                    ReadErrorKind::DepthLimitExceeded,
                    format!("Nesting exceeds the maximum depth of {}.", max),
                ));
            }
        }
        self.skip_comments();
        let token = match self.current() {
            Some(token) => token,
            None => {
                let (line, column) = self.end_of_input_position();
                return Err(ReadError {
                    kind: ReadErrorKind::InvalidToken,
                    message: "Unexpected end of input.".into(),
                    line,
                    column,
                    path: Some(self.current_path()),
                });
            }
        };

        match token.kind {
            TokenKind::LeftBrace => self.read_object(depth),
            TokenKind::LeftBracket => self.read_array(depth),
            TokenKind::String => {
                let text = self.text_of(token);
                self.pos += 1;
                Ok(Value::String(unescape(text)))
            }
            TokenKind::Number => {
                let text = self.text_of(token);
                if text.starts_with('+') {
                    return Err(ReadError {
                        kind: ReadErrorKind::InvalidToken,
                        message: format!("A leading '+' is not valid JSON in '{}'.", text),
                        line: token.range.start.line + 1,
                        column: token.range.start.column + 1,
                        path: Some(self.current_path()),
                    });
                }
                self.pos += 1;
                let n: f64 = text.parse().map_err(|_| ReadError {
                    kind: ReadErrorKind::InvalidToken,
                    message: format!("Invalid number literal '{}'.", text),
                    line: token.range.start.line + 1,
                    column: token.range.start.column + 1,
                    path: Some(self.current_path()),
                })?;
                Ok(Value::Number(n))
            }
            TokenKind::True => {
                self.pos += 1;
                Ok(Value::Bool(true))
            }
            TokenKind::False => {
                self.pos += 1;
                Ok(Value::Bool(false))
            }
            TokenKind::Null => {
                self.pos += 1;
                Ok(Value::Null)
            }
            TokenKind::Comment => unreachable!("comments are skipped before value dispatch"),
            _ => {
                let (line, column) = self.one_based(token);
                Err(ReadError {
                    kind: ReadErrorKind::InvalidToken,
                    message: format!("Unexpected token {:?}.", token.kind),
                    line,
                    column,
                    path: Some(self.current_path()),
                })
            }
        }
    }

    fn read_object(&mut self, depth: usize) -> Result<Value, ReadError> {
        self.expect(TokenKind::LeftBrace, "'{'")?;
        let mut entries: Vec<(String, Value)> = Vec::new();

        self.skip_comments();
        if matches!(self.current(), Some(t) if t.kind == TokenKind::RightBrace) {
            self.pos += 1;
            return Ok(Value::Object(entries));
        }

        loop {
            self.skip_comments();
            let key_token = self.expect(TokenKind::String, "a property name")?;
            let key = unescape(self.text_of(key_token));
            let (key_line, key_col) = self.one_based(key_token);

            self.expect(TokenKind::Colon, "':'")?;

            self.path_stack.push(Segment::Property(key.clone()));
            let path = self.current_path();
            let value = self.read_value(depth + 1)?;
            self.path_stack.pop();

            match entries.iter().position(|(k, _)| k == &key) {
                Some(idx) => match self.dup_handling {
                    DuplicatePropertyHandling::Error => {
                        return Err(ReadError {
                            kind: ReadErrorKind::DuplicateKey,
                            message: format!("Duplicate property '{}'.", key),
                            line: key_line,
                            column: key_col,
                            path: Some(path),
                        });
                    }
                    DuplicatePropertyHandling::KeepFirst => {}
                    DuplicatePropertyHandling::OverwriteWithLast => {
                        entries[idx].1 = value;
                        if let Some(existing) =
                            self.positions.iter_mut().find(|p| p.path == path && p.is_property)
                        {
                            existing.line = key_line;
                            existing.column = key_col;
                        } else {
                            self.record(path, key_line, key_col, true);
                        }
                    }
                },
                None => {
                    entries.push((key, value));
                    self.record(path, key_line, key_col, true);
                }
            }

            self.skip_comments();
            match self.current() {
                Some(t) if t.kind == TokenKind::Comma => {
                    self.pos += 1;
                }
                Some(t) if t.kind == TokenKind::RightBrace => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.expect(TokenKind::RightBrace, "',' or '}'").unwrap_err()),
            }
        }

        Ok(Value::Object(entries))
    }

    fn read_array(&mut self, depth: usize) -> Result<Value, ReadError> {
        self.expect(TokenKind::LeftBracket, "'['")?;
        let mut items = Vec::new();

        self.skip_comments();
        if matches!(self.current(), Some(t) if t.kind == TokenKind::RightBracket) {
            self.pos += 1;
            return Ok(Value::Array(items));
        }

        let mut index = 0usize;
        loop {
            self.skip_comments();
            let (line, column) = match self.current() {
                Some(token) => self.one_based(token),
                None => self.end_of_input_position(),
            };
            self.path_stack.push(Segment::Index(index));
            let path = self.current_path();
            let value = self.read_value(depth + 1)?;
            self.path_stack.pop();
            self.record(path, line, column, false);
            items.push(value);
            index += 1;

            self.skip_comments();
            match self.current() {
                Some(t) if t.kind == TokenKind::Comma => {
                    self.pos += 1;
                }
                Some(t) if t.kind == TokenKind::RightBracket => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.expect(TokenKind::RightBracket, "',' or ']'").unwrap_err()),
            }
        }

        Ok(Value::Array(items))
    }
}

fn compose_path(stack: &[Segment]) -> String {
    let mut out = String::new();
    for segment in stack {
        match segment {
            Segment::Property(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Segment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
        }
    }
    out
}

fn unescape(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw.trim_start_matches('"'));
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = (&mut chars).take(4).collect();
                if let Ok(code) = u32::from_str_radix(&hex, 16) {
                    if let Some(c) = char::from_u32(code) {
                        out.push(c);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn read_ok(text: &str) -> ReadOutcome {
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        read(text, &tokens, false, DuplicatePropertyHandling::Error, None).unwrap()
    }

    #[test]
    fn reads_nested_object_preserving_order() {
        let outcome = read_ok(r#"{"b": 1, "a": {"x": [1, 2]}}"#);
        match outcome.root {
            Value::Object(entries) => {
                assert_eq!(entries[0].0, "b");
                assert_eq!(entries[1].0, "a");
            }
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn records_property_and_element_positions() {
        let outcome = read_ok(r#"{"arr": [1, 2]}"#);
        let arr_prop = outcome.positions.iter().find(|p| p.path == "arr").unwrap();
        assert!(arr_prop.is_property);
        let elem = outcome.positions.iter().find(|p| p.path == "arr[1]").unwrap();
        assert!(!elem.is_property);
    }

    #[test]
    fn duplicate_key_error_policy_fails() {
        let tokens = Tokenizer::new().tokenize(r#"{"a": 1, "a": 2}"#, None).unwrap();
        let result = read(r#"{"a": 1, "a": 2}"#, &tokens, false, DuplicatePropertyHandling::Error, None);
        assert!(matches!(result, Err(e) if e.kind == ReadErrorKind::DuplicateKey));
    }

    #[test]
    fn duplicate_key_overwrite_with_last_keeps_final_value() {
        let outcome = {
            let tokens = Tokenizer::new().tokenize(r#"{"a": 1, "a": 2}"#, None).unwrap();
            read(
                r#"{"a": 1, "a": 2}"#,
                &tokens,
                false,
                DuplicatePropertyHandling::OverwriteWithLast,
                None,
            )
            .unwrap()
        };
        assert_eq!(outcome.root.get("a"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn trailing_comma_is_rejected_even_with_comments_allowed() {
        let tokens = Tokenizer::new().tokenize(r#"{"a": [1, 2,],}"#, None).unwrap();
        let result = read(r#"{"a": [1, 2,],}"#, &tokens, true, DuplicatePropertyHandling::Error, None);
        assert!(matches!(result, Err(e) if e.kind == ReadErrorKind::InvalidToken));
    }

    #[test]
    fn comments_are_skipped_when_allowed() {
        let text = "{\n  // a comment\n  \"a\": 1\n}";
        let tokens = Tokenizer::new().tokenize(text, None).unwrap();
        let outcome = read(text, &tokens, true, DuplicatePropertyHandling::Error, None).unwrap();
        assert_eq!(outcome.root.get("a"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn depth_limit_exceeded() {
        let tokens = Tokenizer::new().tokenize("[[[1]]]", None).unwrap();
        let result = read("[[[1]]]", &tokens, false, DuplicatePropertyHandling::Error, Some(1));
        assert!(matches!(result, Err(e) if e.kind == ReadErrorKind::DepthLimitExceeded));
    }
}
