//! Error types for the conformance runner.
//!
//! Everything here aborts the whole run: a missing subject, a broken manifest
//! or fixture, or an output tree that cannot be written. Case failures are not
//! errors; see [`crate::runner::CaseOutcome`].

use std::path::PathBuf;
use thiserror::Error;

use orpheus_diff::DiffError;

/// Result type for conformance runner operations.
pub type ConformanceResult<T> = Result<T, ConformanceError>;

/// Errors that can occur while configuring or driving a conformance run.
#[derive(Debug, Error)]
pub enum ConformanceError {
    /// No subject executable at any probed location.
    #[error("unable to locate orpheus_minhost (searched: {}); specify --minhost or set ORPHEUS_MINHOST", format_paths(.searched))]
    SubjectNotFound { searched: Vec<PathBuf> },

    /// Explicitly supplied subject path does not exist.
    #[error("orpheus_minhost not found at {path}")]
    SubjectMissing { path: PathBuf },

    /// Subject process could not be started.
    #[error("failed to spawn {path}: {source}")]
    SpawnFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Case manifest could not be read.
    #[error("failed to read case manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Case manifest is not valid JSON or has the wrong shape.
    #[error("failed to parse case manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Case list is empty.
    #[error("case manifest {path} declares no cases")]
    NoCases { path: PathBuf },

    /// Two cases share a name.
    #[error("duplicate case name '{name}'")]
    DuplicateCase { name: String },

    /// Case name cannot be used as a file name.
    #[error("invalid case name '{name}': must match {pattern}")]
    InvalidCaseName { name: String, pattern: &'static str },

    /// Filesystem operation on the output tree failed.
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Summary could not be serialized.
    #[error("failed to serialize run summary: {0}")]
    Summary(#[source] serde_json::Error),

    /// A fixture could not be loaded or a diff could not be persisted.
    #[error(transparent)]
    Diff(#[from] DiffError),
}

impl ConformanceError {
    /// Creates an I/O error for `action` on `path`.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
