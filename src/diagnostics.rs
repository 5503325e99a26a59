//! Diagnostics: the open-ended [`ErrorKey`] taxonomy, the stable short-code
//! registry it resolves to, and the snippet builder used to annotate a
//! diagnostic with the offending source text.

use crate::{Position, Range};
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// The taxonomy of things the pipeline can report. `ErrorKey` is
/// intentionally open-ended (new variants may be added); callers should not
/// exhaustively match without a wildcard arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKey {
    NullInput,
    NoContent,
    InvalidToken,
    DuplicateKey,
    SizeLimitExceeded,
    DepthLimitExceeded,
    Exception,
    CommentsRemoved,
    TrailingCommasRemoved,
    ControlCharsRemoved,
    UnterminatedStringsClosed,
    BomRemoved,
    LineEndingsNormalized,
    MissingCommasInserted,
    ClosersInserted,
}

impl ErrorKey {
    /// The default short code, per the registry in §6 of the spec this
    /// crate implements. Overridable per call via
    /// [`crate::ParseOptions::resolve_error_code`].
    pub fn default_code(self) -> &'static str {
        match self {
            ErrorKey::NullInput => "E000",
            ErrorKey::NoContent => "E001",
            ErrorKey::InvalidToken => "E002",
            ErrorKey::DuplicateKey => "E003",
            ErrorKey::SizeLimitExceeded => "E008",
            ErrorKey::DepthLimitExceeded => "E009",
            ErrorKey::Exception => "E999",
            ErrorKey::CommentsRemoved => "W100",
            ErrorKey::TrailingCommasRemoved => "W101",
            ErrorKey::ControlCharsRemoved => "W102",
            ErrorKey::UnterminatedStringsClosed => "W103",
            ErrorKey::BomRemoved => "I200",
            ErrorKey::LineEndingsNormalized => "I201",
            ErrorKey::MissingCommasInserted => "R100",
            ErrorKey::ClosersInserted => "R101",
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            ErrorKey::NullInput
            | ErrorKey::NoContent
            | ErrorKey::InvalidToken
            | ErrorKey::DuplicateKey
            | ErrorKey::SizeLimitExceeded
            | ErrorKey::DepthLimitExceeded
            | ErrorKey::Exception => Severity::Error,
            ErrorKey::CommentsRemoved
            | ErrorKey::TrailingCommasRemoved
            | ErrorKey::ControlCharsRemoved
            | ErrorKey::UnterminatedStringsClosed => Severity::Warning,
            ErrorKey::BomRemoved
            | ErrorKey::LineEndingsNormalized
            | ErrorKey::MissingCommasInserted
            | ErrorKey::ClosersInserted => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };
        write!(f, "{}", s)
    }
}

/// Which pipeline stage produced a given diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Initial,
    Sanitized,
    Aggressive,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Initial => "Initial",
            Stage::Sanitized => "Sanitized",
            Stage::Aggressive => "Aggressive",
        };
        write!(f, "{}", s)
    }
}

/// A single finding from a parse: either an error that prevented `root`
/// from being populated, or an informational/warning note about a repair
/// that was made along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub stage: Stage,
    /// 1-based line, matching the convention of most JSON error messages.
    pub line: Option<usize>,
    /// 1-based column.
    pub column: Option<usize>,
    pub path: Option<String>,
    pub snippet: Option<String>,
    /// Zero-based, end-exclusive — unlike `line`/`column` above.
    pub range: Option<Range>,
}

/// Per-call override for error-code strings. A function value, not a
/// process-wide table: nothing in this crate is a global singleton.
pub type ErrorCodeResolver = Rc<dyn Fn(ErrorKey) -> String>;

/// Accumulates the repeated (code, severity, stage, message, position)
/// fields every diagnostic call site otherwise has to restate.
pub(crate) struct DiagnosticBuilder {
    key: ErrorKey,
    stage: Stage,
    message: String,
    line: Option<usize>,
    column: Option<usize>,
    path: Option<String>,
    snippet: Option<String>,
    range: Option<Range>,
}

impl DiagnosticBuilder {
    pub fn new(key: ErrorKey, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            key,
            stage,
            message: message.into(),
            line: None,
            column: None,
            path: None,
            snippet: None,
            range: None,
        }
    }

    pub fn at_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn build(self, resolve_error_code: Option<&ErrorCodeResolver>) -> Diagnostic {
        let code = match resolve_error_code {
            Some(resolver) => resolver(self.key),
            None => self.key.default_code().to_string(),
        };
        Diagnostic {
            code,
            severity: self.key.default_severity(),
            message: self.message,
            stage: self.stage,
            line: self.line,
            column: self.column,
            path: self.path,
            snippet: self.snippet,
            range: self.range,
        }
    }
}

/// Render a diagnostic as the single-line header plus optional snippet/caret
/// lines described by the external console writer interface. This is the
/// plain formatter still in scope; styled/colored pretty-printing is an
/// external collaborator.
impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.stage, self.severity, self.code, self.message
        )?;
        if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, " (Line {}, Position {})", line, col)?;
        }
        if let Some(path) = &self.path {
            write!(f, " Path='{}'", path)?;
        }
        if let Some(snippet) = &self.snippet {
            write!(f, "\n{}", snippet)?;
        }
        Ok(())
    }
}

/// Build a best-effort source snippet around `line`/`column` (both
/// 1-based), or a plain preview when no position is known.
///
/// `radius` is in characters; the returned snippet is at most
/// `2 * radius` characters of source plus a caret line.
pub fn build_snippet(text: &str, line: Option<usize>, column: Option<usize>, radius: usize) -> String {
    let (line, column) = match (line, column) {
        (Some(l), Some(c)) => (l, c),
        _ => {
            let limit = 2 * radius;
            return text.chars().take(limit).collect();
        }
    };

    let target_line = match text.lines().nth(line.saturating_sub(1)) {
        Some(l) => l,
        None => return String::new(),
    };

    let line_chars: Vec<char> = target_line.chars().collect();
    let mut caret = column.max(1).min(line_chars.len() + 1) - 1;
    while caret < line_chars.len() && line_chars[caret].is_whitespace() {
        caret += 1;
    }

    if line_chars.len() <= 2 * radius {
        let prefix = caret_prefix(&line_chars, caret);
        return format!("{}\n{}^", target_line, prefix);
    }

    let start = caret.saturating_sub(radius);
    let end = (caret + radius).min(line_chars.len());
    let slice: String = line_chars[start..end].iter().collect();
    let prefix = caret_prefix(&line_chars[start..end.max(start)], caret - start);
    format!("{}\n{}^", slice, prefix)
}

fn caret_prefix(line_chars: &[char], caret: usize) -> String {
    line_chars
        .iter()
        .take(caret)
        .map(|c| if *c == '\t' { '\t' } else { ' ' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_codes_match_registry() {
        assert_eq!(ErrorKey::NullInput.default_code(), "E000");
        assert_eq!(ErrorKey::DuplicateKey.default_code(), "E003");
        assert_eq!(ErrorKey::Exception.default_code(), "E999");
        assert_eq!(ErrorKey::BomRemoved.default_code(), "I200");
        assert_eq!(ErrorKey::ClosersInserted.default_code(), "R101");
    }

    #[test]
    fn snippet_without_position_is_preview() {
        let snippet = build_snippet("hello world", None, None, 5);
        assert_eq!(snippet, "hello worl");
    }

    #[test]
    fn snippet_with_position_has_caret_line() {
        let snippet = build_snippet("{ \"a\": 1, }", Some(1), Some(10), 20);
        let mut lines = snippet.lines();
        assert_eq!(lines.next(), Some("{ \"a\": 1, }"));
        let caret_line = lines.next().unwrap();
        assert!(caret_line.ends_with('^'));
    }
}
