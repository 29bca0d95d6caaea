//! Error types for fixture comparison.
//!
//! These are configuration/input errors: a fixture that cannot be read or
//! decoded. Differences between expected and actual output are never errors;
//! they are reported through [`crate::Comparison`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type for comparison operations.
pub type DiffResult<T> = Result<T, DiffError>;

/// Errors that can occur while loading or persisting comparison inputs.
#[derive(Debug, Error)]
pub enum DiffError {
    /// Input file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Diff artifact could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stale diff artifact could not be removed.
    #[error("failed to remove stale diff {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Base64-wrapped fixture is not valid base64.
    #[error("failed to decode base64 data from {path}: {source}")]
    Base64 {
        path: PathBuf,
        #[source]
        source: base64::DecodeError,
    },

    /// Payload is not a readable WAV container.
    #[error("failed to parse WAV data from {path}: {source}")]
    InvalidWav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// WAV data chunk ended before the declared frame count.
    #[error("failed to read WAV frames from {path}: {source}")]
    ReadFrames {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DiffError {
    /// Returns the path the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            DiffError::Read { path, .. }
            | DiffError::Write { path, .. }
            | DiffError::Remove { path, .. }
            | DiffError::CreateDir { path, .. }
            | DiffError::Base64 { path, .. }
            | DiffError::InvalidWav { path, .. }
            | DiffError::ReadFrames { path, .. } => path,
        }
    }
}
