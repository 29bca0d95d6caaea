//! Run summary persisted when at least one case fails.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConformanceError, ConformanceResult};

/// File name of the summary inside the diff directory.
pub const SUMMARY_FILE: &str = "summary.json";

/// Failed case names plus the total case count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub failed: Vec<String>,
    pub total: usize,
}

impl RunSummary {
    /// Returns true if no case failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of cases that passed.
    pub fn passed(&self) -> usize {
        self.total - self.failed.len()
    }

    /// Writes `summary.json` into `dir` and returns its path.
    pub fn write_to(&self, dir: &Path) -> ConformanceResult<PathBuf> {
        let path = dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(self).map_err(ConformanceError::Summary)?;
        fs::write(&path, json).map_err(|source| ConformanceError::io("write", &path, source))?;
        Ok(path)
    }
}
