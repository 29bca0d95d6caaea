//! run_conformance command implementation
//!
//! Locates the subject, loads the case list and runs every case. Progress is
//! printed per case; `--json` replaces it with a single JSON report.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::case::load_cases;
use crate::runner::{absolute_path, CaseReport, RunReport, Runner, RunnerConfig};
use crate::subject::find_subject;

use super::verdict;

/// Options for a conformance run.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub build_dir: PathBuf,
    pub fixtures_dir: PathBuf,
    pub output_dir: PathBuf,
    pub diff_dir: PathBuf,
    pub minhost: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub json: bool,
}

/// Run the conformance suite
///
/// # Returns
/// Exit code: 0 if every case passed, 1 otherwise
pub fn run(args: &RunArgs) -> Result<ExitCode> {
    let build_dir = absolute(&args.build_dir)?;
    let fixtures_dir = absolute(&args.fixtures_dir)?;
    let explicit = args.minhost.as_deref().map(absolute).transpose()?;
    let manifest = args.manifest.as_deref().map(absolute).transpose()?;

    // The subject is located before any case runs.
    let subject = find_subject(&build_dir, explicit.as_deref())?;
    let cases = load_cases(&fixtures_dir, manifest.as_deref())?;

    let mut config = RunnerConfig::new(
        subject,
        absolute(&args.output_dir)?,
        absolute(&args.diff_dir)?,
    );
    if let Some(secs) = args.timeout_secs {
        config = config.timeout(Duration::from_secs(secs));
    }

    if !args.json {
        println!("{}", "Running conformance cases:".cyan().bold());
        println!("  {} {}", "subject:".dimmed(), config.subject.display());
        println!("  {} {}", "cases:".dimmed(), cases.len());
    }

    let runner = Runner::new(config);
    let json = args.json;
    let report = runner
        .run_all(&cases, |case| {
            if !json {
                print_case(case);
            }
        })
        .context("Conformance run aborted")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &runner.config().diff_dir);
    }

    Ok(verdict(report.passed()))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(absolute_path(path)?)
}

fn print_case(case: &CaseReport) {
    if case.outcome.passed() {
        println!(
            "  {} {} {}",
            "PASS".green().bold(),
            case.name,
            format!("({} ms)", case.elapsed_ms).dimmed()
        );
    } else {
        println!(
            "  {} {}: {}",
            "FAIL".red().bold(),
            case.name,
            case.outcome.describe()
        );
    }
}

fn print_summary(report: &RunReport, diff_dir: &Path) {
    let summary = &report.summary;
    println!();
    if summary.is_success() {
        println!(
            "{} {} of {} cases passed",
            "OK".green().bold(),
            summary.passed(),
            summary.total
        );
        return;
    }

    println!(
        "{} {} of {} cases failed: {}",
        "FAILED".red().bold(),
        summary.failed.len(),
        summary.total,
        summary.failed.join(", ")
    );
    println!("  {} {}", "diffs:".dimmed(), diff_dir.display());
}
