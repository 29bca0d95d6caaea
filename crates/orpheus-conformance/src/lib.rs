//! Orpheus conformance harness.
//!
//! Runs the `orpheus_minhost` subject once per case, captures its JSON and WAV
//! output, and compares both against golden fixtures with [`orpheus_diff`].
//!
//! Each case gets a working directory under the output root; mismatches leave
//! diff artifacts in the diff directory along with a `summary.json`. A clean
//! run leaves no diff directory behind.

pub mod case;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runner;
pub mod subject;
pub mod summary;

pub use case::{builtin_cases, load_cases, load_manifest, TestCase, MANIFEST_FILE};
pub use error::{ConformanceError, ConformanceResult};
pub use runner::{CaseOutcome, CaseReport, RunReport, Runner, RunnerConfig};
pub use subject::{find_subject, ExecutionResult, SUBJECT_ENV, SUBJECT_NAME};
pub use summary::{RunSummary, SUMMARY_FILE};
