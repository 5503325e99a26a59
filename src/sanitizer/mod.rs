//! The offset-preserving repair pass.
//!
//! `sanitize` rewrites text, never deletes a character where replacing it
//! with a space keeps the rewrite easy to reason about: comments become
//! spaces (newlines inside block comments stay newlines), a stray trailing
//! comma becomes a space, a control character becomes a space. The
//! insertions it does make — a missing comma, a missing closing brace, a
//! closing quote for an unterminated property name — are the only points
//! where output length can diverge from input length within a line, and
//! each is counted separately in [`SanitizerResult`].
//!
//! # Example
//!
//! ```
//! use resilient_json::{sanitizer::sanitize, SanitizerOptions};
//!
//! let result = sanitize("{ \"a\": 1, }", &SanitizerOptions::aggressive());
//! assert_eq!(result.text, "{ \"a\": 1   }");
//! assert_eq!(result.trailing_commas_removed, 1);
//! assert!(result.changed);
//! ```

mod pass;

use crate::tokenizer::CancellationToken;
use crate::{Cancelled, Log};

/// Which repairs a [`sanitize`] call is permitted to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizerOptions {
    pub remove_comments: bool,
    pub remove_trailing_commas: bool,
    pub remove_control_chars: bool,
    pub normalize_line_endings: bool,
    pub fix_unterminated_strings: bool,
    pub recover_missing_commas: bool,
    pub recover_missing_closers: bool,
    /// Drives the debug-only per-repair trace points in the rewrite pass;
    /// `Log::None` by default, which compiles away to nothing even in a
    /// debug build.
    pub log_level: Log<&'static str>,
}

impl SanitizerOptions {
    pub fn none() -> Self {
        Self {
            remove_comments: false,
            remove_trailing_commas: false,
            remove_control_chars: false,
            normalize_line_endings: false,
            fix_unterminated_strings: false,
            recover_missing_commas: false,
            recover_missing_closers: false,
            log_level: Log::None,
        }
    }

    /// Every repair switch enabled — the Aggressive-stage configuration.
    pub fn aggressive() -> Self {
        Self {
            remove_comments: true,
            remove_trailing_commas: true,
            remove_control_chars: true,
            normalize_line_endings: true,
            fix_unterminated_strings: true,
            recover_missing_commas: true,
            recover_missing_closers: true,
            log_level: Log::None,
        }
    }

    /// Enable the debug-only per-repair trace points at `level`.
    pub fn with_log_level(mut self, level: Log<&'static str>) -> Self {
        self.log_level = level;
        self
    }
}

/// The outcome of a [`sanitize`] call: the rewritten text, whether anything
/// changed, and one counter per repair kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizerResult {
    pub text: String,
    pub changed: bool,
    pub line_comments_removed: usize,
    pub block_comments_removed: usize,
    pub trailing_commas_removed: usize,
    pub control_chars_removed: usize,
    pub bom_removed: usize,
    pub line_endings_normalized: usize,
    pub unterminated_strings_closed: usize,
    pub missing_commas_inserted: usize,
    pub closers_inserted: usize,
}

impl SanitizerResult {
    pub fn comments_removed(&self) -> usize {
        self.line_comments_removed + self.block_comments_removed
    }
}

/// Run a single sanitization pass over `text` with the given `options`.
/// Deterministic and single-threaded; always succeeds (a pass over text
/// needing no repairs is simply a no-op with `changed = false`).
pub fn sanitize(text: &str, options: &SanitizerOptions) -> SanitizerResult {
    pass::run(text, options, None).expect("sanitize without cancellation never fails")
}

/// Run a sanitization pass that can be cooperatively cancelled, yielding
/// every `yield_every` characters (floor 1024) in addition to polling
/// `cancel`. There is no separate async entry point: this crate carries no
/// cooperative scheduler, so cooperative yielding here means "check the
/// token often enough that a caller driving this in a loop can interleave
/// other work between calls" rather than an actual `await` point.
pub fn sanitize_cancellable(
    text: &str,
    options: &SanitizerOptions,
    cancel: &dyn CancellationToken,
) -> Result<SanitizerResult, Cancelled> {
    pass::run(text, options, Some(cancel))
}
