//! JSON canonicalization and unified diffing.
//!
//! Both inputs are parsed independently. Text that parses is re-serialized in
//! canonical form (object keys sorted at every level, 2-space indentation, one
//! value per line) so key order and whitespace do not register as differences.
//! Text that does not parse is compared literally, so malformed output always
//! shows up in the diff.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use similar::TextDiff;
use tracing::debug;

use crate::artifact::{ensure_dir, record_comparison, JSON_DIFF_FILE};
use crate::error::{DiffError, DiffResult};
use crate::Comparison;

/// Report emitted when the texts differ but the diff engine produced no hunks.
const NO_TEXTUAL_DIFF: &str = "(no textual diff available)\n";

/// Lines of context around each hunk.
const CONTEXT_LINES: usize = 3;

/// Result of attempting to parse a text blob as JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedText {
    /// The text parsed as a JSON document.
    Json(Value),
    /// The text is not JSON and is kept verbatim.
    Raw(String),
}

impl ParsedText {
    /// Parses `text`, falling back to the raw text if it is not valid JSON.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => ParsedText::Json(value),
            Err(_) => ParsedText::Raw(text.to_string()),
        }
    }

    /// Returns true if the text parsed as JSON.
    pub fn is_json(&self) -> bool {
        matches!(self, ParsedText::Json(_))
    }

    /// Returns the canonical text used for diffing.
    ///
    /// JSON documents are pretty-printed with sorted keys and a trailing
    /// newline. Raw text is returned unchanged.
    pub fn canonical_form(&self) -> String {
        match self {
            ParsedText::Json(value) => {
                let mut text = format!("{:#}", sort_keys(value));
                text.push('\n');
                text
            }
            ParsedText::Raw(text) => text.clone(),
        }
    }
}

/// Rebuilds a JSON value with object keys in lexicographic order.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (key, child) in entries {
                sorted.insert(key.clone(), sort_keys(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Compares two JSON texts after canonicalization.
///
/// `expected_label` and `actual_label` become the `---`/`+++` headers of the
/// unified diff.
pub fn compare_json_text(
    expected: &str,
    actual: &str,
    expected_label: &str,
    actual_label: &str,
) -> Comparison {
    if expected == actual {
        return Comparison::matched();
    }

    let expected_parsed = ParsedText::parse(expected);
    let actual_parsed = ParsedText::parse(actual);
    debug!(
        expected_is_json = expected_parsed.is_json(),
        actual_is_json = actual_parsed.is_json(),
        "raw texts differ, comparing canonical forms"
    );

    let expected_canonical = expected_parsed.canonical_form();
    let actual_canonical = actual_parsed.canonical_form();
    if expected_canonical == actual_canonical {
        return Comparison::matched();
    }

    Comparison::mismatch(diff_report(
        &expected_canonical,
        &actual_canonical,
        expected_label,
        actual_label,
    ))
}

/// Reads and compares two JSON files, labelling the diff with their paths.
pub fn compare_json_files(expected: &Path, actual: &Path) -> DiffResult<Comparison> {
    let expected_text = read_text(expected)?;
    let actual_text = read_text(actual)?;

    Ok(compare_json_text(
        &expected_text,
        &actual_text,
        &expected.display().to_string(),
        &actual.display().to_string(),
    ))
}

/// Compares two JSON files and records the result as `diff.patch` in `output_dir`.
///
/// The directory is created if needed; a stale `diff.patch` is removed when
/// the files match.
pub fn compare_json_into_dir(
    expected: &Path,
    actual: &Path,
    output_dir: &Path,
) -> DiffResult<Comparison> {
    ensure_dir(output_dir)?;
    let comparison = compare_json_files(expected, actual)?;
    record_comparison(&output_dir.join(JSON_DIFF_FILE), &comparison)?;
    Ok(comparison)
}

fn read_text(path: &Path) -> DiffResult<String> {
    fs::read_to_string(path).map_err(|source| DiffError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Unified diff of two canonical texts, never empty.
fn diff_report(expected: &str, actual: &str, expected_label: &str, actual_label: &str) -> String {
    let diff = TextDiff::from_lines(expected, actual)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(expected_label, actual_label)
        .to_string();
    if diff.is_empty() {
        NO_TEXTUAL_DIFF.to_string()
    } else {
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identical_text_matches() {
        let text = r#"{"sample_rate": 44100}"#;
        assert!(compare_json_text(text, text, "a", "b").is_match());
    }

    #[test]
    fn test_identical_non_json_matches() {
        let text = "render failed: no session\n";
        assert!(compare_json_text(text, text, "a", "b").is_match());
    }

    #[test]
    fn test_key_order_and_whitespace_ignored() {
        let expected = r#"{"bpm": 120, "tracks": [{"name": "click", "gain": -6}]}"#;
        let actual = "{\n    \"tracks\": [ {\"gain\":-6,\"name\":\"click\"} ],\n    \"bpm\":120\n}\n";
        assert!(compare_json_text(expected, actual, "a", "b").is_match());
    }

    #[test]
    fn test_canonical_form_layout() {
        let parsed = ParsedText::parse(r#"{"b":{"d":1,"c":[1,2]},"a":null}"#);
        assert!(parsed.is_json());
        assert_eq!(
            parsed.canonical_form(),
            "{\n  \"a\": null,\n  \"b\": {\n    \"c\": [\n      1,\n      2\n    ],\n    \"d\": 1\n  }\n}\n"
        );
    }

    #[test]
    fn test_raw_text_canonical_form_is_verbatim() {
        let parsed = ParsedText::parse("{'a': 1}");
        assert!(!parsed.is_json());
        assert_eq!(parsed.canonical_form(), "{'a': 1}");
    }

    #[test]
    fn test_malformed_json_is_diffed_literally() {
        let result = compare_json_text(r#"{"a": 1}"#, "{'a': 1}", "expected.json", "actual.json");
        assert!(!result.is_match());

        let diff = result.diff_text().unwrap();
        assert!(diff.starts_with("--- expected.json\n+++ actual.json\n"));
        assert!(diff.contains("-  \"a\": 1\n"));
        assert!(diff.contains("+{'a': 1}"));
    }

    #[test]
    fn test_value_change_produces_unified_diff() {
        let expected = r#"{"frames": 44100, "channels": 2}"#;
        let actual = r#"{"frames": 44101, "channels": 2}"#;
        let result = compare_json_text(expected, actual, "golden", "produced");

        let diff = result.diff_text().unwrap();
        assert!(diff.contains("@@"));
        assert!(diff.contains("-  \"frames\": 44100\n"));
        assert!(diff.contains("+  \"frames\": 44101\n"));
        assert!(diff.contains("   \"channels\": 2,\n"));
    }

    #[test]
    fn test_diff_report_placeholder_without_hunks() {
        let text = "{\n  \"a\": 1\n}\n";
        assert_eq!(
            diff_report(text, text, "expected", "actual"),
            "(no textual diff available)\n"
        );
    }

    #[test]
    fn test_diff_report_has_headers() {
        let report = diff_report("1\n", "2\n", "expected", "actual");
        assert!(report.starts_with("--- expected\n+++ actual\n"));
        assert!(report.contains("-1\n+2\n"));
    }

    #[test]
    fn test_nested_keys_sorted_recursively() {
        let value: Value = serde_json::from_str(r#"{"z": {"y": 1, "x": {"b": 2, "a": 1}}}"#).unwrap();
        let sorted = sort_keys(&value);
        assert_eq!(
            sorted.to_string(),
            r#"{"z":{"x":{"a":1,"b":2},"y":1}}"#
        );
    }

    #[test]
    fn test_stale_patch_removed_after_fix() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("diffs");
        let expected = dir.path().join("expected.json");
        let actual = dir.path().join("actual.json");
        fs::write(&expected, r#"{"peak": 0.5}"#).unwrap();

        fs::write(&actual, r#"{"peak": 0.75}"#).unwrap();
        let first = compare_json_into_dir(&expected, &actual, &out).unwrap();
        assert!(!first.is_match());
        assert!(out.join(JSON_DIFF_FILE).exists());

        fs::write(&actual, "{ \"peak\" : 0.5 }\n").unwrap();
        let second = compare_json_into_dir(&expected, &actual, &out).unwrap();
        assert!(second.is_match());
        assert!(!out.join(JSON_DIFF_FILE).exists());
    }

    #[test]
    fn test_compare_json_files_reports_unreadable_path() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("expected.json");
        fs::write(&present, "{}").unwrap();
        let missing = dir.path().join("missing.json");

        let err = compare_json_files(&present, &missing).unwrap_err();
        assert_eq!(err.path(), missing.as_path());
        assert!(err.to_string().contains("missing.json"));
    }
}
