use super::{SanitizerOptions, SanitizerResult};
use crate::tokenizer::scan::can_start_value;
use crate::tokenizer::{CancellationToken, Container};
use crate::{Cancelled, Log};

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Normal,
    /// `start` is the index in `out` of the string's opening quote, needed
    /// to bound the trailing-whitespace trim when closing an unterminated
    /// property-name string.
    InString { is_property: bool, start: usize },
    LineComment,
    BlockComment,
}

struct State {
    mode: Mode,
    stack: Vec<Container>,
    expecting_property: bool,
}

impl State {
    fn top_is_object(&self) -> bool {
        matches!(self.stack.last(), Some(Container::Object))
    }
}

pub(crate) fn run(
    text: &str,
    options: &SanitizerOptions,
    cancel: Option<&dyn CancellationToken>,
) -> Result<SanitizerResult, Cancelled> {
    let mut result = SanitizerResult::default();
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut i = 0usize;

    if len > 0 && chars[0] == '\u{FEFF}' {
        i = 1;
        result.bom_removed = 1;
        trace_repair(options.log_level, "BomRemoved", "byte-order mark");
    }

    let mut out: Vec<char> = Vec::with_capacity(len);
    let mut state = State {
        mode: Mode::Normal,
        stack: Vec::new(),
        expecting_property: false,
    };

    while i < len {
        if let Some(token) = cancel {
            if token.is_cancelled() {
                return Err(Cancelled);
            }
        }

        let raw = chars[i];

        // Line-ending normalization applies uniformly, ahead of any
        // mode-specific handling, so that every later check only ever sees
        // '\n' as the line-break marker.
        if raw == '\r' && options.normalize_line_endings {
            let crlf = i + 1 < len && chars[i + 1] == '\n';
            i += if crlf { 2 } else { 1 };
            result.line_endings_normalized += 1;
            trace_repair(options.log_level, "LineEndingsNormalized", if crlf { "CRLF" } else { "lone CR" });
            dispatch(&mut state, '\n', &chars, i, &mut out, options, &mut result);
            continue;
        }

        match state.mode {
            Mode::Normal => {
                if raw == '"' {
                    let is_property = state.top_is_object() && state.expecting_property;
                    state.mode = Mode::InString {
                        is_property,
                        start: out.len(),
                    };
                    out.push('"');
                    i += 1;
                    continue;
                }
                if raw == '/' && i + 1 < len && chars[i + 1] == '/' {
                    state.mode = Mode::LineComment;
                    out.push(if options.remove_comments { ' ' } else { '/' });
                    out.push(if options.remove_comments { ' ' } else { '/' });
                    i += 2;
                    continue;
                }
                if raw == '/' && i + 1 < len && chars[i + 1] == '*' {
                    state.mode = Mode::BlockComment;
                    out.push(if options.remove_comments { ' ' } else { '/' });
                    out.push(if options.remove_comments { ' ' } else { '*' });
                    i += 2;
                    continue;
                }
                i += 1;
                dispatch(&mut state, raw, &chars, i, &mut out, options, &mut result);
            }
            Mode::LineComment => {
                if raw == '\n' || raw == '\r' {
                    if options.remove_comments {
                        result.line_comments_removed += 1;
                        trace_repair(options.log_level, "CommentsRemoved", "line comment");
                    }
                    state.mode = Mode::Normal;
                    continue; // re-dispatch this char (the line break) as Normal.
                }
                out.push(if options.remove_comments { ' ' } else { raw });
                i += 1;
            }
            Mode::BlockComment => {
                if raw == '*' && i + 1 < len && chars[i + 1] == '/' {
                    out.push(if options.remove_comments { ' ' } else { '*' });
                    out.push(if options.remove_comments { ' ' } else { '/' });
                    i += 2;
                    state.mode = Mode::Normal;
                    if options.remove_comments {
                        result.block_comments_removed += 1;
                        trace_repair(options.log_level, "CommentsRemoved", "block comment");
                    }
                    continue;
                }
                // Newlines inside a block comment are preserved even when
                // removing comments, so offsets downstream of the comment
                // stay on the right line.
                out.push(if raw == '\n' || !options.remove_comments {
                    raw
                } else {
                    ' '
                });
                i += 1;
            }
            Mode::InString { is_property, start } => {
                if options.fix_unterminated_strings && is_property && (raw == ':' || raw == '\n') {
                    close_unterminated_string(&mut out, start, &mut result, options.log_level);
                    state.mode = Mode::Normal;
                    i += 1;
                    if raw == ':' {
                        out.push(':');
                        state.expecting_property = false;
                    } else {
                        out.push('\n');
                        check_newline_repairs(&mut state, &chars, i, &mut out, options, &mut result);
                    }
                    continue;
                }
                if raw == '"' {
                    out.push('"');
                    i += 1;
                    state.mode = Mode::Normal;
                    continue;
                }
                if raw == '\n' || raw == '\r' {
                    // Value string left open across a line break without a
                    // repair in effect: mirrors the tokenizer's own
                    // tolerant behavior of ending the token at the break.
                    out.push(raw);
                    i += 1;
                    state.mode = Mode::Normal;
                    continue;
                }
                if raw == '\\' {
                    out.push('\\');
                    i += 1;
                    if i < len {
                        out.push(apply_control_scrub(chars[i], options, &mut result));
                        i += 1;
                    }
                    continue;
                }
                out.push(apply_control_scrub(raw, options, &mut result));
                i += 1;
            }
        }
    }

    match state.mode {
        Mode::InString { is_property, start } if is_property && options.fix_unterminated_strings => {
            close_unterminated_string(&mut out, start, &mut result, options.log_level);
        }
        Mode::LineComment if options.remove_comments => {
            result.line_comments_removed += 1;
            trace_repair(options.log_level, "CommentsRemoved", "line comment at end of input");
        }
        Mode::BlockComment if options.remove_comments => {
            result.block_comments_removed += 1;
            trace_repair(options.log_level, "CommentsRemoved", "unterminated block comment");
        }
        _ => {}
    }

    if options.recover_missing_closers {
        if let Some(container) = state.stack.pop() {
            out.push(match container {
                Container::Object => '}',
                Container::Array => ']',
            });
            result.closers_inserted += 1;
            trace_repair(options.log_level, "ClosersInserted", "at end of input");
        }
    }

    result.changed = result.bom_removed > 0
        || result.line_endings_normalized > 0
        || result.comments_removed() > 0
        || result.trailing_commas_removed > 0
        || result.control_chars_removed > 0
        || result.unterminated_strings_closed > 0
        || result.missing_commas_inserted > 0
        || result.closers_inserted > 0;
    result.text = out.into_iter().collect();
    Ok(result)
}

fn apply_control_scrub(c: char, options: &SanitizerOptions, result: &mut SanitizerResult) -> char {
    if options.remove_control_chars && (c as u32) < 0x20 && c != '\n' && c != '\t' {
        result.control_chars_removed += 1;
        trace_repair(options.log_level, "ControlCharsRemoved", format!("{:?}", c));
        ' '
    } else {
        c
    }
}

fn close_unterminated_string(
    out: &mut Vec<char>,
    start: usize,
    result: &mut SanitizerResult,
    log: Log<&'static str>,
) {
    while out.len() > start + 1 && matches!(out[out.len() - 1], ' ' | '\t') {
        out.pop();
    }
    out.push('"');
    result.unterminated_strings_closed += 1;
    trace_repair(log, "UnterminatedStringsClosed", format!("opened at {}", start));
}

/// Handle a single structural/plain character while in `Mode::Normal`.
/// `next` is the input index just past `c` (after it has been consumed).
fn dispatch(
    state: &mut State,
    c: char,
    chars: &[char],
    next: usize,
    out: &mut Vec<char>,
    options: &SanitizerOptions,
    result: &mut SanitizerResult,
) {
    match c {
        '{' => {
            state.stack.push(Container::Object);
            state.expecting_property = true;
            out.push('{');
        }
        '[' => {
            state.stack.push(Container::Array);
            state.expecting_property = false;
            out.push('[');
        }
        '}' | ']' => {
            if options.remove_trailing_commas {
                scrub_trailing_comma(out, result, options.log_level);
            }
            state.stack.pop();
            out.push(c);
        }
        ',' => {
            if state.top_is_object() {
                state.expecting_property = true;
            }
            out.push(',');
        }
        ':' => {
            state.expecting_property = false;
            out.push(':');
        }
        '\n' => {
            out.push('\n');
            check_newline_repairs(state, chars, next, out, options, result);
        }
        _ => out.push(apply_control_scrub(c, options, result)),
    }
}

/// `out` already has the `\n` appended; `next` is the input index just
/// past it. Runs the missing-comma and missing-closer lookahead repairs.
fn check_newline_repairs(
    state: &mut State,
    chars: &[char],
    next: usize,
    out: &mut Vec<char>,
    options: &SanitizerOptions,
    result: &mut SanitizerResult,
) {
    if state.stack.is_empty() {
        return;
    }
    let Some(upcoming) = peek_next_non_whitespace(chars, next) else {
        return;
    };

    if options.recover_missing_closers {
        let mismatched = matches!(
            (state.stack.last(), upcoming),
            (Some(Container::Object), ']') | (Some(Container::Array), '}')
        );
        if mismatched {
            let top = state.stack.pop().unwrap();
            out.push(match top {
                Container::Object => '}',
                Container::Array => ']',
            });
            result.closers_inserted += 1;
            trace_repair(options.log_level, "ClosersInserted", format!("before mismatched {:?}", upcoming));
            return;
        }
    }

    if options.recover_missing_commas {
        let top_object = state.top_is_object();
        if top_object && !state.expecting_property && upcoming == '"' {
            out.push(',');
            state.expecting_property = true;
            result.missing_commas_inserted += 1;
            trace_repair(options.log_level, "MissingCommasInserted", "before property name");
        } else if !top_object && can_start_value(upcoming) {
            out.push(',');
            result.missing_commas_inserted += 1;
            trace_repair(options.log_level, "MissingCommasInserted", "before array element");
        }
    }
}

fn scrub_trailing_comma(out: &mut [char], result: &mut SanitizerResult, log: Log<&'static str>) {
    let mut j = out.len();
    while j > 0 && matches!(out[j - 1], ' ' | '\t' | '\n' | '\r') {
        j -= 1;
    }
    if j > 0 && out[j - 1] == ',' {
        out[j - 1] = ' ';
        result.trailing_commas_removed += 1;
        trace_repair(log, "TrailingCommasRemoved", "before closer");
    }
}

/// Trace a single repair action at the `Success` level.
#[cfg(debug_assertions)]
fn trace_repair(log: Log<&'static str>, kind: &str, detail: impl std::fmt::Display) {
    if log.order() >= Log::Success(()).order() {
        println!("[{}; SanitizerRepair]: {} ({})", log, kind, detail);
    }
}
#[cfg(not(debug_assertions))]
fn trace_repair(_log: Log<&'static str>, _kind: &str, _detail: impl std::fmt::Display) {}

fn peek_next_non_whitespace(chars: &[char], mut i: usize) -> Option<char> {
    while i < chars.len() {
        if !chars[i].is_whitespace() {
            return Some(chars[i]);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::super::SanitizerOptions;
    use super::*;

    fn run_default(text: &str, options: &SanitizerOptions) -> SanitizerResult {
        run(text, options, None).unwrap()
    }

    #[test]
    fn strips_trailing_comma_before_closer() {
        let result = run_default("{ \"a\": 1, }", &SanitizerOptions::aggressive());
        assert_eq!(result.text, "{ \"a\": 1   }");
        assert_eq!(result.trailing_commas_removed, 1);
    }

    #[test]
    fn strips_line_and_block_comments_preserving_offsets() {
        let input = "{ /* c */ \"a\": 1 // x\n}";
        let result = run_default(input, &SanitizerOptions::aggressive());
        assert_eq!(result.text.chars().count(), input.chars().count());
        assert!(!result.text.contains("/*"));
        assert!(!result.text.contains("//"));
    }

    #[test]
    fn strips_bom() {
        let result = run_default("\u{FEFF}{}", &SanitizerOptions::aggressive());
        assert_eq!(result.text, "{}");
        assert_eq!(result.bom_removed, 1);
    }

    #[test]
    fn normalizes_crlf_and_lone_cr() {
        let result = run_default("{\r\n\"a\":1\r}", &SanitizerOptions::aggressive());
        assert!(!result.text.contains('\r'));
        assert_eq!(result.line_endings_normalized, 2);
    }

    #[test]
    fn closes_unterminated_property_name_on_colon() {
        let result = run_default("{ \"a: 1 }", &SanitizerOptions::aggressive());
        assert!(result.unterminated_strings_closed >= 1);
    }

    #[test]
    fn inserts_missing_comma_between_object_properties() {
        let result = run_default("{ \"a\": 1\n\"b\": 2 }", &SanitizerOptions::aggressive());
        assert_eq!(result.missing_commas_inserted, 1);
        assert!(result.text.contains("1,\n"));
    }

    #[test]
    fn inserts_missing_closer_at_end_of_input() {
        let result = run_default("{ \"a\": 1", &SanitizerOptions::aggressive());
        assert_eq!(result.closers_inserted, 1);
        assert_eq!(result.text, "{ \"a\": 1}");
    }

    #[test]
    fn removes_control_characters() {
        let result = run_default("{ \"a\": \u{1}1 }", &SanitizerOptions::aggressive());
        assert_eq!(result.control_chars_removed, 1);
    }

    #[test]
    fn inserts_missing_closer_for_mismatched_next_closer() {
        let result = run_default("{ \"a\": [1, 2\n}", &SanitizerOptions::aggressive());
        assert_eq!(result.closers_inserted, 1);
        assert!(result.text.contains("]\n}"));
    }
}
