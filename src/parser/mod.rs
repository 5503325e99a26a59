//! The staged parsing pipeline: Initial → Sanitized → Aggressive.
//!
//! [`parse`] never throws for malformed JSON. It tries a strict read first
//! (`Initial`), then — if the caller has opted in — re-tries against
//! progressively more aggressively repaired text (`Sanitized`, then
//! `Aggressive`), attaching a [`Diagnostic`] for every repair it made along
//! the way. Only [`Cancelled`] is allowed to propagate as an `Err`.
//!
//! # Example
//!
//! ```
//! use resilient_json::{parse, ParseOptions};
//!
//! let result = parse(r#"{ "a": 1, "b": [2, 3,], }"#, &ParseOptions::tolerant(), None).unwrap();
//! assert!(result.success());
//! ```

pub(crate) mod reader;

use crate::diagnostics::{DiagnosticBuilder, ErrorCodeResolver};
use crate::sanitizer::{self, SanitizerOptions, SanitizerResult};
use crate::tokenizer::{CancellationToken, Token, Tokenizer};
use crate::{Cancelled, Diagnostic, ErrorKey, PathRange, Stage, Value};
use reader::{ReadErrorKind, ReadOutcome};

/// How the reader should treat a repeated object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePropertyHandling {
    /// Raise a `DuplicateKey` diagnostic and fail the attempt.
    Error,
    /// Keep the first occurrence; later ones are parsed (to stay in sync
    /// with the token stream) and then discarded.
    KeepFirst,
    /// Keep the last occurrence, replacing earlier ones.
    OverwriteWithLast,
}

/// Configuration for a single [`parse`] call.
#[derive(Clone)]
pub struct ParseOptions {
    pub normalize_line_endings: bool,
    pub collect_line_info: bool,
    pub allow_comments: bool,
    pub duplicate_property_handling: DuplicatePropertyHandling,
    pub enable_sanitization_fallback: bool,
    pub enable_aggressive_recovery: bool,
    pub allow_trailing_commas: bool,
    pub remove_control_characters: bool,
    pub return_sanitized_text: bool,
    pub include_sanitization_diagnostics: bool,
    pub snippet_context_radius: usize,
    pub resolve_error_code: Option<ErrorCodeResolver>,
    pub max_depth: Option<usize>,
    pub max_document_length: Option<usize>,
    pub produce_token_spans: bool,
    pub produce_path_map: bool,
    pub token_span_limit: usize,
    pub fix_unterminated_strings: bool,
    pub recover_missing_commas: bool,
    pub recover_missing_closers: bool,
}

impl Default for ParseOptions {
    /// The strict dialect: no comments, no trailing commas, no fallback
    /// stages, duplicate keys are an error. Matches a conservative reading
    /// of RFC 8259 plus this crate's own diagnostic/position bookkeeping.
    fn default() -> Self {
        Self {
            normalize_line_endings: false,
            collect_line_info: true,
            allow_comments: false,
            duplicate_property_handling: DuplicatePropertyHandling::Error,
            enable_sanitization_fallback: false,
            enable_aggressive_recovery: false,
            allow_trailing_commas: false,
            remove_control_characters: false,
            return_sanitized_text: false,
            include_sanitization_diagnostics: true,
            snippet_context_radius: 40,
            resolve_error_code: None,
            max_depth: Some(1000),
            max_document_length: None,
            produce_token_spans: false,
            produce_path_map: false,
            token_span_limit: 1_000_000,
            fix_unterminated_strings: false,
            recover_missing_commas: false,
            recover_missing_closers: false,
        }
    }
}

impl ParseOptions {
    /// A permissive preset: every repair stage enabled, comments and
    /// trailing commas accepted, tokens and a path map produced. The
    /// configuration a caller reaching for "just make this JSON-ish text
    /// parse" wants.
    pub fn tolerant() -> Self {
        Self {
            normalize_line_endings: true,
            collect_line_info: true,
            allow_comments: true,
            duplicate_property_handling: DuplicatePropertyHandling::OverwriteWithLast,
            enable_sanitization_fallback: true,
            enable_aggressive_recovery: true,
            allow_trailing_commas: true,
            remove_control_characters: true,
            return_sanitized_text: true,
            include_sanitization_diagnostics: true,
            snippet_context_radius: 40,
            resolve_error_code: None,
            max_depth: Some(1000),
            max_document_length: None,
            produce_token_spans: true,
            produce_path_map: true,
            token_span_limit: 1_000_000,
            fix_unterminated_strings: true,
            recover_missing_commas: true,
            recover_missing_closers: true,
        }
    }
}

/// The outcome of a [`parse`] call.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub root: Option<Value>,
    pub diagnostics: Vec<Diagnostic>,
    pub sanitized_text: Option<String>,
    pub tokens: Vec<Token>,
    pub path_ranges: Vec<(String, PathRange)>,
    pub sanitization_report: Option<SanitizerResult>,
}

impl ParseResult {
    pub fn success(&self) -> bool {
        self.root.is_some()
    }
}

/// Parse `text`, trying a strict read and falling back to increasingly
/// aggressive repair stages as `options` permits. Returns `Ok` in every
/// case except cooperative cancellation; a failed parse is a `ParseResult`
/// with `root: None` and at least one `Severity::Error` diagnostic.
pub fn parse(
    text: &str,
    options: &ParseOptions,
    cancel: Option<&dyn CancellationToken>,
) -> Result<ParseResult, Cancelled> {
    let mut diagnostics = Vec::new();

    if let Some(max_len) = options.max_document_length {
        if text.chars().count() > max_len {
            diagnostics.push(
                DiagnosticBuilder::new(
                    ErrorKey::SizeLimitExceeded,
                    Stage::Initial,
                    format!("Document exceeds the maximum length of {} characters.", max_len),
                )
                .build(options.resolve_error_code.as_ref()),
            );
            return Ok(ParseResult {
                diagnostics,
                ..Default::default()
            });
        }
    }

    if text.trim().is_empty() {
        diagnostics.push(
            DiagnosticBuilder::new(
                ErrorKey::NoContent,
                Stage::Initial,
                "The document contains no content to parse.",
            )
            .build(options.resolve_error_code.as_ref()),
        );
        return Ok(ParseResult {
            diagnostics,
            ..Default::default()
        });
    }

    let mut working_text = text.to_string();
    if options.normalize_line_endings {
        let pre = sanitizer::sanitize(
            &working_text,
            &SanitizerOptions {
                normalize_line_endings: true,
                ..SanitizerOptions::none()
            },
        );
        record_sanitization_diagnostics(&pre, Stage::Initial, options, &mut diagnostics);
        working_text = pre.text;
    }

    if let Some(outcome) = try_stage(
        Stage::Initial,
        &working_text,
        options.allow_comments,
        options,
        cancel,
        !options.enable_sanitization_fallback,
        &mut diagnostics,
    )? {
        let (stage_text, secondary_report) =
            if options.include_sanitization_diagnostics || options.return_sanitized_text {
                let secondary_opts = SanitizerOptions {
                    remove_comments: options.allow_comments,
                    remove_trailing_commas: options.allow_trailing_commas,
                    remove_control_chars: options.remove_control_characters,
                    normalize_line_endings: options.normalize_line_endings,
                    fix_unterminated_strings: false,
                    recover_missing_commas: false,
                    recover_missing_closers: false,
                    log_level: crate::Log::None,
                };
                let sresult = sanitizer::sanitize_cancellable(
                    &working_text,
                    &secondary_opts,
                    cancel.unwrap_or(&NeverCancelled),
                )?;
                record_sanitization_diagnostics(&sresult, Stage::Initial, options, &mut diagnostics);
                (sresult.text.clone(), Some(sresult))
            } else {
                (working_text.clone(), None)
            };

        return Ok(finish(
            Stage::Initial,
            stage_text,
            outcome,
            diagnostics,
            options,
            secondary_report,
        ));
    }

    if options.enable_sanitization_fallback {
        let sanitize_opts = SanitizerOptions {
            remove_comments: options.allow_comments,
            remove_trailing_commas: options.allow_trailing_commas,
            remove_control_chars: options.remove_control_characters,
            normalize_line_endings: options.normalize_line_endings,
            fix_unterminated_strings: false,
            recover_missing_commas: false,
            recover_missing_closers: false,
            log_level: crate::Log::None,
        };
        let sresult = sanitizer::sanitize_cancellable(
            &working_text,
            &sanitize_opts,
            cancel.unwrap_or(&NeverCancelled),
        )?;
        record_sanitization_diagnostics(&sresult, Stage::Sanitized, options, &mut diagnostics);

        if let Some(outcome) = try_stage(
            Stage::Sanitized,
            &sresult.text,
            false,
            options,
            cancel,
            !options.enable_aggressive_recovery,
            &mut diagnostics,
        )? {
            return Ok(finish(
                Stage::Sanitized,
                sresult.text.clone(),
                outcome,
                diagnostics,
                options,
                Some(sresult),
            ));
        }

        if options.enable_aggressive_recovery {
            let aggressive_opts = SanitizerOptions {
                remove_comments: true,
                remove_trailing_commas: true,
                remove_control_chars: options.remove_control_characters,
                normalize_line_endings: options.normalize_line_endings,
                fix_unterminated_strings: options.fix_unterminated_strings,
                recover_missing_commas: options.recover_missing_commas,
                recover_missing_closers: options.recover_missing_closers,
                log_level: crate::Log::None,
            };
            let aresult = sanitizer::sanitize_cancellable(
                &working_text,
                &aggressive_opts,
                cancel.unwrap_or(&NeverCancelled),
            )?;
            record_sanitization_diagnostics(&aresult, Stage::Aggressive, options, &mut diagnostics);

            if let Some(outcome) = try_stage(
                Stage::Aggressive,
                &aresult.text,
                false,
                options,
                cancel,
                true,
                &mut diagnostics,
            )? {
                return Ok(finish(
                    Stage::Aggressive,
                    aresult.text.clone(),
                    outcome,
                    diagnostics,
                    options,
                    Some(aresult),
                ));
            }
        }
    }

    Ok(ParseResult {
        root: None,
        diagnostics,
        sanitized_text: None,
        tokens: Vec::new(),
        path_ranges: Vec::new(),
        sanitization_report: None,
    })
}

struct NeverCancelled;
impl CancellationToken for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Tokenize and read `text` at one stage. Returns `Ok(None)` (not an error)
/// when the stage fails so the caller can fall through to the next one;
/// only the terminal failure of the whole pipeline becomes a diagnostic.
#[allow(clippy::type_complexity)]
fn try_stage(
    stage: Stage,
    text: &str,
    allow_comments: bool,
    options: &ParseOptions,
    cancel: Option<&dyn CancellationToken>,
    is_last_stage: bool,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Option<(Vec<Token>, ReadOutcome)>, Cancelled> {
    let tokenizer = Tokenizer::new().with_token_span_limit(options.token_span_limit);
    let tokens = tokenizer.tokenize(text, cancel)?;
    match reader::read(
        text,
        &tokens,
        allow_comments,
        options.duplicate_property_handling,
        options.max_depth,
    ) {
        Ok(outcome) => Ok(Some((tokens, outcome))),
        Err(err) => {
            if is_last_stage {
                let key = match err.kind {
                    ReadErrorKind::DepthLimitExceeded => ErrorKey::DepthLimitExceeded,
                    ReadErrorKind::DuplicateKey => ErrorKey::DuplicateKey,
                    ReadErrorKind::InvalidToken => ErrorKey::InvalidToken,
                };
                let mut builder = DiagnosticBuilder::new(key, stage, err.message)
                    .at_position(err.line, err.column)
                    .snippet(crate::diagnostics::build_snippet(
                        text,
                        Some(err.line),
                        Some(err.column),
                        options.snippet_context_radius,
                    ));
                if let Some(path) = err.path {
                    builder = builder.path(path);
                }
                diagnostics.push(builder.build(options.resolve_error_code.as_ref()));
            }
            Ok(None)
        }
    }
}

fn record_sanitization_diagnostics(
    result: &SanitizerResult,
    stage: Stage,
    options: &ParseOptions,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if !options.include_sanitization_diagnostics {
        return;
    }
    let counts: &[(usize, ErrorKey, &str)] = &[
        (result.comments_removed(), ErrorKey::CommentsRemoved, "Comment(s) were removed."),
        (
            result.trailing_commas_removed,
            ErrorKey::TrailingCommasRemoved,
            "Trailing comma(s) were removed.",
        ),
        (
            result.control_chars_removed,
            ErrorKey::ControlCharsRemoved,
            "Control character(s) were removed.",
        ),
        (
            result.unterminated_strings_closed,
            ErrorKey::UnterminatedStringsClosed,
            "Unterminated string(s) were closed.",
        ),
        (result.bom_removed, ErrorKey::BomRemoved, "A byte-order mark was removed."),
        (
            result.line_endings_normalized,
            ErrorKey::LineEndingsNormalized,
            "Line ending(s) were normalized to '\\n'.",
        ),
        (
            result.missing_commas_inserted,
            ErrorKey::MissingCommasInserted,
            "Missing comma(s) were inserted.",
        ),
        (result.closers_inserted, ErrorKey::ClosersInserted, "Missing closer(s) were inserted."),
    ];
    for (count, key, message) in counts {
        if *count > 0 {
            diagnostics.push(
                DiagnosticBuilder::new(*key, stage, format!("{} ({} occurrence(s))", message, count))
                    .build(options.resolve_error_code.as_ref()),
            );
        }
    }
}

fn finish(
    _stage: Stage,
    text: String,
    (tokens, outcome): (Vec<Token>, ReadOutcome),
    diagnostics: Vec<Diagnostic>,
    options: &ParseOptions,
    sanitization_report: Option<SanitizerResult>,
) -> ParseResult {
    let path_ranges = if options.produce_path_map {
        crate::path_map::build(&tokens, &outcome.positions)
    } else {
        Vec::new()
    };

    ParseResult {
        root: Some(outcome.root),
        diagnostics,
        sanitized_text: if options.return_sanitized_text {
            Some(text)
        } else {
            None
        },
        tokens: if options.produce_token_spans { tokens } else { Vec::new() },
        path_ranges,
        sanitization_report,
    }
}

/// Which pipeline stages [`process`] should attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Only the strict Initial attempt.
    Strict,
    /// The full staged pipeline (equivalent to [`ParseOptions::tolerant`]'s
    /// stage selection, modulated by [`ProcessingOptions`]'s own switches).
    Tolerant,
    /// Run both a strict attempt and a tolerant attempt, returning whichever
    /// [`ProcessingPreference`] favors.
    Both,
}

/// When [`ProcessingMode::Both`] produces two differing outcomes, which one
/// [`process`] should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingPreference {
    /// Prefer the strict result whenever it succeeded at all.
    CorrectnessFirst,
    /// Prefer the tolerant result whenever it succeeded at all.
    RecoveryFirst,
}

/// Configuration for [`process`]: a thin wrapper that picks between a
/// strict and a tolerant [`parse`], layering a preference over the result
/// rather than re-implementing the pipeline.
#[derive(Clone)]
pub struct ProcessingOptions {
    pub mode: ProcessingMode,
    pub preference: ProcessingPreference,
    pub base: ParseOptions,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Tolerant,
            preference: ProcessingPreference::RecoveryFirst,
            base: ParseOptions::tolerant(),
        }
    }
}

/// The outcome of a [`process`] call: the chosen [`ParseResult`] plus,
/// under [`ProcessingMode::Both`], the result of the attempt that was not
/// chosen.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub chosen: ParseResult,
    pub alternate: Option<ParseResult>,
}

/// Run [`parse`] under a [`ProcessingMode`], applying a preference when both
/// a strict and a tolerant attempt were made.
pub fn process(
    text: &str,
    processing_options: &ProcessingOptions,
    cancel: Option<&dyn CancellationToken>,
) -> Result<ProcessingResult, Cancelled> {
    match processing_options.mode {
        ProcessingMode::Strict => {
            let mut strict_options = processing_options.base.clone();
            strict_options.enable_sanitization_fallback = false;
            strict_options.enable_aggressive_recovery = false;
            let chosen = parse(text, &strict_options, cancel)?;
            Ok(ProcessingResult {
                chosen,
                alternate: None,
            })
        }
        ProcessingMode::Tolerant => {
            let chosen = parse(text, &processing_options.base, cancel)?;
            Ok(ProcessingResult {
                chosen,
                alternate: None,
            })
        }
        ProcessingMode::Both => {
            let mut strict_options = processing_options.base.clone();
            strict_options.enable_sanitization_fallback = false;
            strict_options.enable_aggressive_recovery = false;
            let strict = parse(text, &strict_options, cancel)?;
            let tolerant = parse(text, &processing_options.base, cancel)?;

            let (chosen, alternate) = match processing_options.preference {
                ProcessingPreference::CorrectnessFirst => {
                    if strict.success() {
                        (strict, Some(tolerant))
                    } else {
                        (tolerant, Some(strict))
                    }
                }
                ProcessingPreference::RecoveryFirst => {
                    if tolerant.success() {
                        (tolerant, Some(strict))
                    } else {
                        (strict, Some(tolerant))
                    }
                }
            };
            Ok(ProcessingResult {
                chosen,
                alternate,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_succeeds_on_valid_json() {
        let result = parse(r#"{"a": 1}"#, &ParseOptions::default(), None).unwrap();
        assert!(result.success());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn strict_parse_fails_on_trailing_comma() {
        let result = parse(r#"{"a": 1,}"#, &ParseOptions::default(), None).unwrap();
        assert!(!result.success());
        assert_eq!(result.diagnostics[0].code, "E002");
    }

    #[test]
    fn tolerant_parse_recovers_trailing_comma_with_warning() {
        let result = parse(r#"{"a": 1, "b": [2, 3,], }"#, &ParseOptions::tolerant(), None).unwrap();
        assert!(result.success());
        assert!(result.diagnostics.iter().any(|d| d.code == "W101"));
    }

    #[test]
    fn empty_input_reports_no_content() {
        let result = parse("   ", &ParseOptions::default(), None).unwrap();
        assert!(!result.success());
        assert_eq!(result.diagnostics[0].code, "E001");
    }

    #[test]
    fn oversize_input_reports_size_limit() {
        let mut options = ParseOptions::default();
        options.max_document_length = Some(3);
        let result = parse(r#"{"a": 1}"#, &options, None).unwrap();
        assert_eq!(result.diagnostics[0].code, "E008");
    }

    #[test]
    fn duplicate_key_error_in_strict_mode() {
        let result = parse(r#"{"a": 1, "a": 2}"#, &ParseOptions::default(), None).unwrap();
        assert!(!result.success());
        assert_eq!(result.diagnostics[0].code, "E003");
    }

    #[test]
    fn initial_success_still_populates_sanitization_counters_and_text() {
        let result = parse(r#"{"a": 1 /* c */}"#, &ParseOptions::tolerant(), None).unwrap();
        assert!(result.success());
        assert!(result.diagnostics.iter().any(|d| d.code == "W100"));
        let sanitized = result.sanitized_text.expect("sanitized_text should be populated");
        assert!(!sanitized.contains("/* c */"));
    }

    #[test]
    fn process_both_prefers_recovery_by_default() {
        let outcome = process(
            r#"{"a": 1, "b": [2, 3,], }"#,
            &ProcessingOptions {
                mode: ProcessingMode::Both,
                ..ProcessingOptions::default()
            },
            None,
        )
        .unwrap();
        assert!(outcome.chosen.success());
        assert!(outcome.alternate.is_some());
    }
}
