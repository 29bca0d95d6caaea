//! Conformance runner.
//!
//! Drives each case through the subject and the two comparers, one case at a
//! time, and reduces the results to a run-level verdict.
//!
//! Output layout:
//!
//! ```text
//! <output>/<case>/actual.json    subject stdout, always written
//! <output>/<case>/actual.wav     subject audio
//! <output>/<case>/stderr.log     subject stderr, only for crashes and timeouts
//! <diff>/<case>.json.diff        JSON mismatch
//! <diff>/<case>.wav.diff         WAV mismatch
//! <diff>/summary.json            only when a case failed
//! ```
//!
//! The diff directory is cleared at the start of a run and removed at the end
//! if every case passed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use orpheus_diff::{
    compare_json_files, compare_wav_payloads, record_comparison, Comparison, WavPayload,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::case::TestCase;
use crate::error::{ConformanceError, ConformanceResult};
use crate::subject::{execute, subject_args};
use crate::summary::RunSummary;

/// Subject stdout, per case.
pub const ACTUAL_JSON_FILE: &str = "actual.json";

/// Subject audio output, per case.
pub const ACTUAL_WAV_FILE: &str = "actual.wav";

/// Subject stderr, per failed case.
pub const STDERR_LOG_FILE: &str = "stderr.log";

/// Configuration for a conformance run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Subject executable.
    pub subject: PathBuf,
    /// Root of the per-case working directories.
    pub output_dir: PathBuf,
    /// Directory receiving diff artifacts and the summary.
    pub diff_dir: PathBuf,
    /// Per-case time budget. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl RunnerConfig {
    /// Creates a config without a timeout.
    pub fn new(
        subject: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        diff_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            subject: subject.into(),
            output_dir: output_dir.into(),
            diff_dir: diff_dir.into(),
            timeout: None,
        }
    }

    /// Sets the per-case timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// How a single case ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// Both outputs matched their fixtures.
    Passed,
    /// The subject exited non-zero or was killed by a signal.
    Crashed { exit_code: Option<i32> },
    /// The subject overran the per-case timeout and was killed.
    TimedOut { timeout_ms: u64 },
    /// The subject succeeded but at least one output differs.
    Mismatch { json_differs: bool, wav_differs: bool },
}

impl CaseOutcome {
    /// Returns true if the case passed.
    pub fn passed(&self) -> bool {
        matches!(self, CaseOutcome::Passed)
    }

    /// Short human-readable description.
    pub fn describe(&self) -> String {
        match self {
            CaseOutcome::Passed => "passed".to_string(),
            CaseOutcome::Crashed {
                exit_code: Some(code),
            } => format!("subject exited with status {}", code),
            CaseOutcome::Crashed { exit_code: None } => "subject terminated by signal".to_string(),
            CaseOutcome::TimedOut { timeout_ms } => {
                format!("subject timed out after {} ms", timeout_ms)
            }
            CaseOutcome::Mismatch {
                json_differs,
                wav_differs,
            } => {
                let mut parts = Vec::new();
                if *json_differs {
                    parts.push("json differs");
                }
                if *wav_differs {
                    parts.push("wav differs");
                }
                parts.join(", ")
            }
        }
    }
}

/// Result of one case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: CaseOutcome,
    pub elapsed_ms: u64,
}

/// Result of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub cases: Vec<CaseReport>,
    pub summary: RunSummary,
    /// Where `summary.json` was written, if any case failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_path: Option<PathBuf>,
}

impl RunReport {
    /// Returns true if every case passed.
    pub fn passed(&self) -> bool {
        self.summary.is_success()
    }
}

/// Runs conformance cases sequentially.
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Creates a runner with the given configuration.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs every case and writes or removes the run-level artifacts.
    ///
    /// `on_case` is called after each case finishes.
    pub fn run_all<F>(&self, cases: &[TestCase], mut on_case: F) -> ConformanceResult<RunReport>
    where
        F: FnMut(&CaseReport),
    {
        self.prepare()?;

        let mut reports = Vec::with_capacity(cases.len());
        for case in cases {
            let report = self.run_case(case)?;
            on_case(&report);
            reports.push(report);
        }

        let summary = RunSummary {
            failed: reports
                .iter()
                .filter(|r| !r.outcome.passed())
                .map(|r| r.name.clone())
                .collect(),
            total: reports.len(),
        };

        let summary_path = if summary.is_success() {
            remove_dir_if_present(&self.config.diff_dir)?;
            None
        } else {
            Some(summary.write_to(&self.config.diff_dir)?)
        };

        info!(
            total = summary.total,
            failed = summary.failed.len(),
            "conformance run finished"
        );

        Ok(RunReport {
            cases: reports,
            summary,
            summary_path,
        })
    }

    /// Clears the diff directory and creates the output tree.
    pub fn prepare(&self) -> ConformanceResult<()> {
        remove_dir_if_present(&self.config.diff_dir)?;
        create_dir(&self.config.diff_dir)?;
        create_dir(&self.config.output_dir)
    }

    /// Runs one case: invoke the subject, persist its output, compare.
    pub fn run_case(&self, case: &TestCase) -> ConformanceResult<CaseReport> {
        let start = Instant::now();
        info!(case = case.name(), "running case");

        let case_dir = self.config.output_dir.join(case.name());
        create_dir(&case_dir)?;

        let json_path = case_dir.join(ACTUAL_JSON_FILE);
        let wav_path = case_dir.join(ACTUAL_WAV_FILE);
        let stderr_path = case_dir.join(STDERR_LOG_FILE);
        // Leftovers from an earlier run must not stand in for fresh output.
        remove_file_if_present(&wav_path)?;
        remove_file_if_present(&stderr_path)?;

        // The subject runs inside the case directory, so both paths must be absolute.
        let subject = absolute_path(&self.config.subject)?;
        let session = absolute_path(case.session())?;
        let args = subject_args(case, &session, ACTUAL_WAV_FILE);
        let result = execute(
            &subject,
            &args,
            &case_dir,
            wav_path.clone(),
            self.config.timeout,
        )?;

        fs::write(&json_path, &result.stdout)
            .map_err(|source| ConformanceError::io("write", &json_path, source))?;

        let outcome = if result.success() {
            self.compare_outputs(case, &json_path, &result.audio_path)?
        } else {
            fs::write(&stderr_path, &result.stderr)
                .map_err(|source| ConformanceError::io("write", &stderr_path, source))?;

            let outcome = if result.timed_out {
                CaseOutcome::TimedOut {
                    timeout_ms: self.config.timeout.map_or(0, |t| t.as_millis() as u64),
                }
            } else {
                CaseOutcome::Crashed {
                    exit_code: result.exit_code,
                }
            };
            warn!(
                case = case.name(),
                reason = %outcome.describe(),
                log = %stderr_path.display(),
                "subject failed, skipping comparison"
            );
            outcome
        };

        info!(case = case.name(), outcome = %outcome.describe(), "case finished");
        Ok(CaseReport {
            name: case.name().to_string(),
            outcome,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn compare_outputs(
        &self,
        case: &TestCase,
        json_path: &Path,
        wav_path: &Path,
    ) -> ConformanceResult<CaseOutcome> {
        let json_diff = self.config.diff_dir.join(format!("{}.json.diff", case.name()));
        let wav_diff = self.config.diff_dir.join(format!("{}.wav.diff", case.name()));

        let json_comparison = compare_json_files(case.expected_json(), json_path)?;

        // A broken fixture aborts the run; broken subject output fails the case.
        let expected_wav = WavPayload::load(case.expected_wav())?;
        let wav_comparison = match WavPayload::load(wav_path) {
            Ok(actual_wav) => compare_wav_payloads(&expected_wav, &actual_wav),
            Err(err) => Comparison::mismatch(format!("actual output unusable: {}", err)),
        };

        let json_ok = record_comparison(&json_diff, &json_comparison)?;
        let wav_ok = record_comparison(&wav_diff, &wav_comparison)?;

        if json_ok && wav_ok {
            Ok(CaseOutcome::Passed)
        } else {
            Ok(CaseOutcome::Mismatch {
                json_differs: !json_ok,
                wav_differs: !wav_ok,
            })
        }
    }
}

/// Resolves `path` against the current directory without touching the filesystem.
pub fn absolute_path(path: &Path) -> ConformanceResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|source| ConformanceError::io("resolve", path, source))?;
    Ok(cwd.join(path))
}

fn create_dir(path: &Path) -> ConformanceResult<()> {
    fs::create_dir_all(path).map_err(|source| ConformanceError::io("create", path, source))
}

fn remove_file_if_present(path: &Path) -> ConformanceResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ConformanceError::io("remove", path, source)),
    }
}

fn remove_dir_if_present(path: &Path) -> ConformanceResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ConformanceError::io("remove", path, source)),
    }
}
