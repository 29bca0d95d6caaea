//! CLI command implementations
//!
//! Each command returns `anyhow::Result<ExitCode>`: `Ok` carries the verdict
//! (0 match or pass, 1 mismatch or failure), `Err` is a configuration error
//! that [`finish`] maps to exit code 2.

pub mod compare_json;
pub mod compare_wav;
pub mod run;

use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

/// Exit code for configuration errors (missing inputs, broken fixtures).
pub const EXIT_CONFIG_ERROR: u8 = 2;

/// Exit code for a mismatch or a failed case.
pub const EXIT_FAILURE: u8 = 1;

/// Reports a command error on stderr and converts the result to an exit code.
pub fn finish(result: anyhow::Result<ExitCode>) -> ExitCode {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red(), e);
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn verdict(matched: bool) -> ExitCode {
    if matched {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FAILURE)
    }
}

fn print_verdict(matched: bool, what: &str, artifact: &Path) {
    if matched {
        println!("{} {}", "PASS".green().bold(), what);
    } else {
        println!("{} {}", "FAIL".red().bold(), what);
        println!("  {} {}", "diff:".dimmed(), artifact.display());
    }
}
