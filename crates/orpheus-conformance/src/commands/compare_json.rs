//! compare_json command implementation
//!
//! Canonicalizes two JSON files and writes a unified diff of the canonical
//! forms to `<output>/diff.patch` when they differ.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;

use orpheus_diff::{compare_json_into_dir, JSON_DIFF_FILE};

use super::{print_verdict, verdict};

/// Run the compare_json command
///
/// # Returns
/// Exit code: 0 on match, 1 on mismatch
pub fn run(expected: &Path, actual: &Path, output_dir: &Path) -> Result<ExitCode> {
    let comparison = compare_json_into_dir(expected, actual, output_dir).with_context(|| {
        format!(
            "Failed to compare {} against {}",
            actual.display(),
            expected.display()
        )
    })?;

    let what = format!("{} vs {}", expected.display(), actual.display());
    print_verdict(comparison.is_match(), &what, &output_dir.join(JSON_DIFF_FILE));
    Ok(verdict(comparison.is_match()))
}
