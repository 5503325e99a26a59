//! A resilient JSON parsing and editing library.
//!
//! Most JSON libraries are built for documents that are already valid.
//! This crate is built for the other case: documents typed by hand, pasted
//! from somewhere lossy, or edited live in an editor buffer, where a stray
//! trailing comma or an unclosed string shouldn't blow up a whole tool
//! chain. The core is a staged parsing pipeline ([`parse`]) that tries a
//! strict read first and only reaches for repair machinery when it has to,
//! plus the source-accurate bookkeeping (tokens, path maps, incremental
//! re-scans, and structural edit synthesis) that lets a caller turn a
//! diagnostic into a fix.
//!
//! # Example
//!
//! ```
//! use resilient_json::{parse, ParseOptions};
//!
//! let text = r#"{ "a": 1, "b": [2, 3,], }"#;
//! let result = parse(text, &ParseOptions::tolerant(), None).unwrap();
//! assert!(result.success());
//! assert!(result
//!     .diagnostics
//!     .iter()
//!     .any(|d| d.code == "W101"));
//! ```
//!
//! # Design
//!
//! The pipeline never throws for malformed JSON: every failure becomes a
//! [`Diagnostic`] attached to a [`ParseResult`] whose `root` is `None`.
//! The one exception is cooperative cancellation ([`Cancelled`]), which is
//! the single channel allowed to propagate out of the library. See the
//! [`parser`] module for the staged Initial → Sanitized → Aggressive
//! algorithm, [`tokenizer`] for the lexical scanner, [`sanitizer`] for the
//! offset-preserving repair pass, [`incremental`] for windowed re-scanning
//! after edits, and [`cursor`] for structural edit synthesis.

mod code;
pub mod comma_policy;
pub mod cursor;
pub mod diagnostics;
mod error;
pub mod incremental;
pub mod parser;
pub mod path_map;
mod position;
pub mod sanitizer;
pub mod tokenizer;
mod value;

pub use code::LineIndex;
pub use cursor::{Cursor, CursorKind, TextEdit};
pub use diagnostics::{Diagnostic, ErrorKey, Severity, Stage};
pub use error::Cancelled;
pub use incremental::{IncrementalUpdate, TextChange};
pub use parser::{
    parse, process, DuplicatePropertyHandling, ParseOptions, ParseResult, ProcessingMode,
    ProcessingOptions, ProcessingPreference, ProcessingResult,
};
pub use path_map::PathRange;
pub use sanitizer::{SanitizerOptions, SanitizerResult};
pub use tokenizer::{CancellationToken, Token, TokenKind, Tokenizer};
pub use value::Value;

/// The zero-based line, column, and byte offset of a point in a document.
///
/// All three fields are zero-based; this is the one place this crate departs
/// from the 1-based line/column convention of most JSON error messages
/// (those are surfaced, 1-based, only on [`Diagnostic`]).
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// A half-open span `[start, end)` of source text.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// A log level used by the debug-only trace points in the tokenizer and
/// sanitizer inner loops. Compiled out entirely in release builds.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}

impl<T> Log<T> {
    /// Numeric ordering of the level, ignoring the payload, so a call site
    /// can ask "is this at least as verbose as X" with `Log::X(()).order()`.
    pub fn order(&self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default(_) => 1,
            Log::Success(_) => 2,
            Log::Result(_) => 3,
            Log::Verbose(_) => 4,
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Log<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Log::None => Ok(()),
            Log::Default(s) | Log::Success(s) | Log::Result(s) | Log::Verbose(s) => write!(f, "{}", s),
        }
    }
}
