//! Compares two WAV files byte-for-byte.
//!
//! Writes `diff.txt` into the output directory when they differ.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use orpheus_conformance::commands;
use orpheus_conformance::logging::init_logging;

/// Compare WAV output against a golden fixture
#[derive(Parser)]
#[command(name = "compare_wav")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Golden WAV file (raw, or base64 with a .b64/.base64 suffix)
    #[arg(long)]
    expected: PathBuf,

    /// WAV produced by the subject
    #[arg(long)]
    actual: PathBuf,

    /// Directory receiving diff.txt
    #[arg(long)]
    output: PathBuf,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    commands::finish(commands::compare_wav::run(
        &cli.expected,
        &cli.actual,
        &cli.output,
    ))
}
