//! Runs orpheus_minhost against the golden fixtures.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use orpheus_conformance::commands::{self, run::RunArgs};
use orpheus_conformance::logging::init_logging;

/// Orpheus minhost conformance runner
#[derive(Parser)]
#[command(name = "run_conformance")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Build directory searched for orpheus_minhost
    #[arg(long)]
    build_dir: PathBuf,

    /// Directory holding golden fixtures (and optionally cases.json)
    #[arg(long)]
    fixtures: PathBuf,

    /// Root of the per-case working directories
    #[arg(long)]
    output: PathBuf,

    /// Directory receiving diff artifacts and summary.json
    #[arg(long)]
    diff: PathBuf,

    /// Explicit path to orpheus_minhost
    #[arg(long)]
    minhost: Option<PathBuf>,

    /// Case manifest (default: <fixtures>/cases.json, then built-in cases)
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Kill a case's subject after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the run report as JSON instead of progress lines
    #[arg(long)]
    json: bool,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let args = RunArgs {
        build_dir: cli.build_dir,
        fixtures_dir: cli.fixtures,
        output_dir: cli.output,
        diff_dir: cli.diff,
        minhost: cli.minhost,
        manifest: cli.manifest,
        timeout_secs: cli.timeout_secs,
        json: cli.json,
    };
    commands::finish(commands::run::run(&args))
}
