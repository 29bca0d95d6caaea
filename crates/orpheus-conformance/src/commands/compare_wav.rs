//! compare_wav command implementation
//!
//! Compares WAV format parameters and frame bytes exactly. Either input may
//! be base64-wrapped (`.b64` / `.base64`).

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use orpheus_diff::{compare_wav_into_dir, WAV_DIFF_FILE};

use super::{print_verdict, verdict};

/// Run the compare_wav command
///
/// # Returns
/// Exit code: 0 on match, 1 on mismatch
pub fn run(expected: &Path, actual: &Path, output_dir: &Path) -> Result<ExitCode> {
    let comparison = compare_wav_into_dir(expected, actual, output_dir).with_context(|| {
        format!(
            "Failed to compare {} against {}",
            actual.display(),
            expected.display()
        )
    })?;

    let what = format!("{} vs {}", expected.display(), actual.display());
    print_verdict(comparison.is_match(), &what, &output_dir.join(WAV_DIFF_FILE));

    if let Some(report) = comparison.diff_text() {
        for line in report.lines() {
            println!("  {}", line);
        }
        println!("  {} {}", "hash expected:".dimmed(), short_hash(expected)?);
        println!("  {} {}", "hash actual:  ".dimmed(), short_hash(actual)?);
    }

    Ok(verdict(comparison.is_match()))
}

fn short_hash(path: &Path) -> Result<String> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let hash = blake3::hash(&data).to_hex().to_string();
    Ok(hash[..16].to_string())
}
