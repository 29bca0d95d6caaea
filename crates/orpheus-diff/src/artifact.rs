//! Diff artifact persistence.
//!
//! The existence of a diff file encodes "there was a difference": a mismatch
//! writes the report, a match removes whatever an earlier run left behind.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::{DiffError, DiffResult};
use crate::Comparison;

/// File name of the JSON comparer's diff inside its output directory.
pub const JSON_DIFF_FILE: &str = "diff.patch";

/// File name of the WAV comparer's report inside its output directory.
pub const WAV_DIFF_FILE: &str = "diff.txt";

/// Creates `dir` and its parents if they do not exist.
pub fn ensure_dir(dir: &Path) -> DiffResult<()> {
    fs::create_dir_all(dir).map_err(|source| DiffError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Writes or clears the diff artifact at `path` according to `comparison`.
///
/// Returns `true` if the comparison matched.
pub fn record_comparison(path: &Path, comparison: &Comparison) -> DiffResult<bool> {
    match comparison.diff_text() {
        None => {
            remove_stale(path)?;
            Ok(true)
        }
        Some(report) => {
            if let Some(parent) = path.parent() {
                ensure_dir(parent)?;
            }
            let mut content = report.to_string();
            if !content.ends_with('\n') {
                content.push('\n');
            }
            fs::write(path, content).map_err(|source| DiffError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            debug!(path = %path.display(), "wrote diff artifact");
            Ok(false)
        }
    }
}

/// Removes a diff artifact left by an earlier run. Missing files are fine.
pub fn remove_stale(path: &Path) -> DiffResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale diff artifact");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DiffError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}
