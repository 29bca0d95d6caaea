//! Orpheus fixture comparison library.
//!
//! Compares the two outputs of the Orpheus minhost against golden fixtures:
//!
//! - [`json`]: canonicalizes JSON (sorted keys, fixed indentation) and emits a
//!   unified diff over the canonical lines. Text that does not parse as JSON is
//!   diffed literally.
//! - [`wav`]: decodes WAV payloads (optionally base64-wrapped) into format
//!   parameters and raw frame bytes, then compares both exactly.
//! - [`artifact`]: persists a comparison as a diff file, or removes a stale one
//!   when the comparison now matches.
//!
//! # Example
//!
//! ```
//! use orpheus_diff::json::compare_json_text;
//!
//! let result = compare_json_text(r#"{"b": 1, "a": 2}"#, r#"{"a":2,"b":1}"#, "expected", "actual");
//! assert!(result.is_match());
//! ```

pub mod artifact;
pub mod error;
pub mod json;
pub mod wav;

pub use artifact::{record_comparison, JSON_DIFF_FILE, WAV_DIFF_FILE};
pub use error::{DiffError, DiffResult};
pub use json::{compare_json_files, compare_json_into_dir, compare_json_text, ParsedText};
pub use wav::{
    compare_wav_files, compare_wav_into_dir, compare_wav_payloads, Compression, InputEncoding,
    WavParams, WavPayload,
};

/// Outcome of comparing an expected artifact against an actual one.
///
/// A mismatch always carries a non-empty, human-readable report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    diff: Option<String>,
}

impl Comparison {
    /// Creates a matching comparison.
    pub fn matched() -> Self {
        Self { diff: None }
    }

    /// Creates a mismatching comparison with the given report.
    pub fn mismatch(report: impl Into<String>) -> Self {
        Self {
            diff: Some(report.into()),
        }
    }

    /// Returns true if expected and actual are considered equal.
    pub fn is_match(&self) -> bool {
        self.diff.is_none()
    }

    /// Returns the diff report, if the comparison did not match.
    pub fn diff_text(&self) -> Option<&str> {
        self.diff.as_deref()
    }
}
