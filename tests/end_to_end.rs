//! End-to-end scenarios exercising the parsing, incremental, and cursor
//! layers together, the way a caller actually uses this crate.

use resilient_json::incremental::apply_changes_with_reparse;
use resilient_json::{comma_policy, parse, Cursor, DuplicatePropertyHandling, ParseOptions, Value};

#[test]
fn trailing_comma_in_object_is_removed_with_warning() {
    let result = parse(r#"{ "a": 1, }"#, &ParseOptions::tolerant(), None).unwrap();
    assert!(result.success());
    assert!(result.diagnostics.iter().any(|d| d.code == "W101"));
    assert_eq!(result.root.unwrap().get("a"), Some(&Value::Number(1.0)));
}

#[test]
fn trailing_comma_in_array_is_removed_with_warning() {
    let result = parse("[1, 2, ]", &ParseOptions::tolerant(), None).unwrap();
    assert!(result.success());
    assert!(result.diagnostics.iter().any(|d| d.code == "W101"));
    let root = result.root.unwrap();
    let arr = root.as_array().unwrap();
    assert_eq!(arr, &vec![Value::Number(1.0), Value::Number(2.0)]);
}

#[test]
fn bom_and_crlf_and_comment_are_normalized_away() {
    let text = "\u{FEFF}{\r\n  // c\r\n  \"n\": 1,\r\n}\r\n";
    let result = parse(text, &ParseOptions::tolerant(), None).unwrap();
    assert!(result.success());
    assert_eq!(result.root.as_ref().unwrap().get("n"), Some(&Value::Number(1.0)));
    assert!(result.diagnostics.iter().any(|d| d.code == "I200"));
    assert!(result.diagnostics.iter().any(|d| d.code == "I201"));
}

#[test]
fn double_comma_fails_when_fallback_stages_are_disabled() {
    let mut options = ParseOptions::tolerant();
    options.allow_trailing_commas = false;
    options.enable_sanitization_fallback = false;
    options.enable_aggressive_recovery = false;

    let result = parse(r#"{ "a": 1,, "b": 2 }"#, &options, None).unwrap();
    assert!(!result.success());
    let diag = result
        .diagnostics
        .iter()
        .find(|d| d.code == "E002")
        .expect("expected an InvalidToken diagnostic");
    assert!(diag.snippet.as_ref().is_some_and(|s| !s.is_empty()));
    assert!(diag.range.is_some());
}

#[test]
fn duplicate_key_with_error_policy_fails() {
    let mut options = ParseOptions::tolerant();
    options.duplicate_property_handling = DuplicatePropertyHandling::Error;

    let result = parse(r#"{ "a": 1, "a": 2 }"#, &options, None).unwrap();
    assert!(!result.success());
    let diag = result
        .diagnostics
        .iter()
        .find(|d| d.code == "E003")
        .expect("expected a DuplicateKey diagnostic");
    assert!(diag.path.is_some());
    assert!(diag.range.is_some());
}

#[test]
fn incremental_edit_inserting_array_element_reparses_with_new_path() {
    use resilient_json::{TextChange, Tokenizer};

    let text = r#"{ "arr": [1] }"#;
    let tokens = Tokenizer::new().tokenize(text, None).unwrap();
    let bracket_offset = text.find(']').unwrap();
    let change = TextChange {
        start_offset: bracket_offset,
        end_offset: bracket_offset,
        new_text: ", 2".into(),
    };

    let (update, parsed) =
        apply_changes_with_reparse(text, &tokens, &[change], 8, &ParseOptions::tolerant(), None)
            .unwrap();

    assert_eq!(update.text, r#"{ "arr": [1, 2] }"#);
    assert!(parsed.success());
    assert!(parsed.path_ranges.iter().any(|(path, _)| path == "arr[1]"));
}

#[test]
fn cursor_removes_middle_property_leaving_valid_json() {
    let text = r#"{ "a": 1, "b": 2, "c": 3 }"#;
    let result = parse(text, &ParseOptions::tolerant(), None).unwrap();
    assert!(result.success());

    let cursor = Cursor::from_path(&result, "b").expect("cursor for \"b\"");
    let edit = cursor.remove_self(&result, text).expect("remove_self edit");

    let mut new_text = text.to_string();
    new_text.replace_range(edit.range.start.offset..edit.range.end.offset, &edit.new_text);

    let reparsed = parse(&new_text, &ParseOptions::tolerant(), None).unwrap();
    assert!(reparsed.success());
    let root = reparsed.root.unwrap();
    assert_eq!(root.get("a"), Some(&Value::Number(1.0)));
    assert_eq!(root.get("b"), None);
    assert_eq!(root.get("c"), Some(&Value::Number(3.0)));
}

#[test]
fn comma_policy_removes_trailing_comma_before_closer() {
    use resilient_json::Tokenizer;

    let text = "[1, 2, ]";
    let tokens = Tokenizer::new().tokenize(text, None).unwrap();
    let caret = text.find(']').unwrap();

    let edit = comma_policy::try_remove_comma_before_closer(text, &tokens, caret)
        .expect("a trailing comma to remove");

    let removed = &text[edit.range.start.offset..edit.range.end.offset];
    assert_eq!(removed, ",");
    assert_eq!(edit.new_text, "");
}
