//! The single-pass lexical scanner.
//!
//! `Tokenizer` never fails on textual content: unrecognized characters are
//! skipped one at a time rather than raising. Whitespace is never emitted.
//! A `Tokenizer` also tracks a container stack internally (used by the
//! sanitizer, which shares this loop's shape) so that strings which open
//! while a property name is expected can be told apart from value strings —
//! that distinction is not exposed on [`Token`] itself.
//!
//! # Example
//!
//! ```
//! use resilient_json::{Tokenizer, TokenKind};
//!
//! let tokens = Tokenizer::new().tokenize(r#"{"a": 1}"#, None).unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::LeftBrace);
//! assert_eq!(tokens[1].kind, TokenKind::String);
//! ```

mod cancellation;
pub(crate) mod scan;

pub use cancellation::CancellationToken;

use crate::{Log, Position, Range};

/// The kind of a lexical token. `Comment` tokens are produced even though
/// strict JSON has no comments — the parser driver skips them when
/// `allow_comments` is set, and the sanitizer consults them to decide what
/// to strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    String,
    Number,
    True,
    False,
    Null,
    Comment,
}

impl TokenKind {
    /// Everything but `Comment` is "significant" per the glossary: comments
    /// are the one token kind a consumer typically wants to see through.
    pub fn is_significant(self) -> bool {
        !matches!(self, TokenKind::Comment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range,
}

impl Token {
    pub fn new(kind: TokenKind, range: Range) -> Self {
        Self { kind, range }
    }
}

/// Container kind tracked internally by the tokenizer/sanitizer shared scan
/// loop, used to decide whether a string opens as a property name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Object,
    Array,
}

/// Produces an ordered token stream over a document.
///
/// `token_span_limit` is a safety cap (floor 1000): once reached,
/// tokenization halts cleanly rather than continuing indefinitely over
/// pathological input. `log_level` drives the debug-only per-lexeme trace
/// points in [`scan`]; it's `Log::None` by default, which compiles away to
/// nothing even in a debug build.
pub struct Tokenizer {
    pub token_span_limit: usize,
    pub log_level: Log<&'static str>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            token_span_limit: 1_000_000,
            log_level: Log::None,
        }
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token_span_limit(mut self, limit: usize) -> Self {
        self.token_span_limit = limit.max(1000);
        self
    }

    /// Enable the debug-only per-lexeme trace points (`#[cfg(debug_assertions)]`
    /// only; a no-op in a release build regardless of the level passed here).
    pub fn with_log_level(mut self, level: Log<&'static str>) -> Self {
        self.log_level = level;
        self
    }

    /// Tokenize `text` from its start.
    pub fn tokenize(
        &self,
        text: &str,
        cancel: Option<&dyn CancellationToken>,
    ) -> Result<Vec<Token>, crate::Cancelled> {
        self.tokenize_from(text, Position::zero(), cancel)
    }

    /// Tokenize `text`, treating it as starting at `origin` for line/column
    /// purposes. Used by the incremental engine to retokenize a window that
    /// does not start at offset zero of the full document.
    pub fn tokenize_from(
        &self,
        text: &str,
        origin: Position,
        cancel: Option<&dyn CancellationToken>,
    ) -> Result<Vec<Token>, crate::Cancelled> {
        scan::scan(text, origin, self.token_span_limit, self.log_level, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_punctuation_and_literals() {
        let tokens = Tokenizer::new()
            .tokenize(r#"{"a": [1, true, null]}"#, None)
            .unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LeftBrace,
                TokenKind::String,
                TokenKind::Colon,
                TokenKind::LeftBracket,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::True,
                TokenKind::Comma,
                TokenKind::Null,
                TokenKind::RightBracket,
                TokenKind::RightBrace,
            ]
        );
    }

    #[test]
    fn token_starts_are_non_decreasing_and_non_overlapping() {
        let tokens = Tokenizer::new()
            .tokenize(r#"{"a": 1, "b": [2, 3]} // trailing"#, None)
            .unwrap();
        for pair in tokens.windows(2) {
            assert!(pair[0].range.start.offset <= pair[1].range.start.offset);
            assert!(pair[0].range.end.offset <= pair[1].range.start.offset);
        }
    }

    #[test]
    fn skips_unrecognized_characters() {
        let tokens = Tokenizer::new().tokenize("@ 1", None).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Number);
    }

    #[test]
    fn token_span_limit_halts_cleanly() {
        let text = "1 ".repeat(100);
        let tokens = Tokenizer::new()
            .with_token_span_limit(1000)
            .tokenize(&text, None)
            .unwrap();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn log_level_does_not_change_tokenization_output() {
        let tokens = Tokenizer::new()
            .with_log_level(Log::Verbose("test"))
            .tokenize(r#"{"a": 1} @"#, None)
            .unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[3].kind, TokenKind::Number);
    }
}
