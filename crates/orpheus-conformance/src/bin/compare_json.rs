//! Compares two JSON files after canonicalization.
//!
//! Writes `diff.patch` into the output directory when they differ.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use orpheus_conformance::commands;
use orpheus_conformance::logging::init_logging;

/// Compare JSON output against a golden fixture
#[derive(Parser)]
#[command(name = "compare_json")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Golden JSON file
    #[arg(long)]
    expected: PathBuf,

    /// JSON produced by the subject
    #[arg(long)]
    actual: PathBuf,

    /// Directory receiving diff.patch
    #[arg(long)]
    output: PathBuf,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    commands::finish(commands::compare_json::run(
        &cli.expected,
        &cli.actual,
        &cli.output,
    ))
}
