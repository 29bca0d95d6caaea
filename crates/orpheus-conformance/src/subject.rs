//! Subject executable discovery and invocation.
//!
//! The subject (`orpheus_minhost`) is a black box invoked as
//! `<subject> --session <path> <case flags...> --out <file>`. It prints JSON on
//! stdout and writes a WAV named by `--out` into its working directory.

use std::borrow::Cow;
use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::case::TestCase;
use crate::error::{ConformanceError, ConformanceResult};

/// File stem of the subject executable.
pub const SUBJECT_NAME: &str = "orpheus_minhost";

/// Environment variable overriding subject discovery.
pub const SUBJECT_ENV: &str = "ORPHEUS_MINHOST";

/// Poll interval while waiting on a subject with a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to keep reading pipes after a timed-out subject was killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Candidate subject locations under a build directory, in probe order.
pub fn candidate_paths(build_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    for suffix in ["", ".exe"] {
        let file_name = format!("{}{}", SUBJECT_NAME, suffix);
        candidates.push(build_dir.join("adapters").join("minhost").join(&file_name));
        candidates.push(build_dir.join(&file_name));
    }
    candidates
}

/// Finds the subject executable.
///
/// Order: `explicit`, then `ORPHEUS_MINHOST`, then the build directory
/// candidates, then `PATH`.
pub fn find_subject(build_dir: &Path, explicit: Option<&Path>) -> ConformanceResult<PathBuf> {
    let env_override = std::env::var_os(SUBJECT_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    locate_subject(build_dir, explicit, env_override.as_deref(), true)
}

/// Discovery with the environment lookup made explicit.
pub fn locate_subject(
    build_dir: &Path,
    explicit: Option<&Path>,
    env_override: Option<&Path>,
    search_path: bool,
) -> ConformanceResult<PathBuf> {
    if let Some(path) = explicit.or(env_override) {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(ConformanceError::SubjectMissing {
            path: path.to_path_buf(),
        });
    }

    let candidates = candidate_paths(build_dir);
    if let Some(found) = candidates.iter().find(|candidate| candidate.is_file()) {
        debug!(subject = %found.display(), "found subject in build directory");
        return Ok(found.clone());
    }

    if search_path {
        if let Ok(found) = which::which(SUBJECT_NAME) {
            debug!(subject = %found.display(), "found subject on PATH");
            return Ok(found);
        }
    }

    Err(ConformanceError::SubjectNotFound {
        searched: candidates,
    })
}

/// Builds the subject's argument vector (without the program itself).
pub fn subject_args(case: &TestCase, session: &Path, out_file: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--session".into(), session.as_os_str().to_owned()];
    args.extend(case.subject_args().iter().map(OsString::from));
    args.push("--out".into());
    args.push(out_file.into());
    args
}

/// What one subject invocation produced.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit code, or `None` if the process was killed by a signal or timed out.
    pub exit_code: Option<i32>,
    /// Captured stdout, byte for byte.
    pub stdout: Vec<u8>,
    /// Captured stderr, byte for byte.
    pub stderr: Vec<u8>,
    /// Where the subject was asked to write its audio.
    pub audio_path: PathBuf,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl ExecutionResult {
    /// True if the subject exited zero within its time budget.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Stdout for display; invalid UTF-8 is replaced.
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Stderr for display; invalid UTF-8 is replaced.
    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

/// Runs `subject` with `args` in `work_dir`, capturing stdout and stderr.
///
/// A non-zero exit is reported in the result, not as an error. With a
/// `timeout`, the subject runs in its own process group; on expiry the whole
/// group is killed, `timed_out` is set, and output still held open by
/// surviving descendants is dropped after a short grace period.
pub fn execute(
    subject: &Path,
    args: &[OsString],
    work_dir: &Path,
    audio_path: PathBuf,
    timeout: Option<Duration>,
) -> ConformanceResult<ExecutionResult> {
    debug!(subject = %subject.display(), ?args, cwd = %work_dir.display(), "spawning subject");

    let mut cmd = Command::new(subject);
    cmd.args(args)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if timeout.is_some() {
        isolate_process_group(&mut cmd);
    }

    let start = Instant::now();
    let mut child = cmd.spawn().map_err(|source| ConformanceError::SpawnFailed {
        path: subject.to_path_buf(),
        source,
    })?;

    // Drain both pipes concurrently so a chatty subject cannot block on a full pipe.
    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let waited = wait_with_timeout(&mut child, timeout)
        .map_err(|source| ConformanceError::io("wait for", subject, source))?;
    let elapsed = start.elapsed();

    let (exit_code, timed_out) = match waited {
        Some(status) => (status.code(), false),
        None => (None, true),
    };

    let grace = timed_out.then_some(DRAIN_GRACE);
    let stdout = collect(stdout_reader, grace);
    let stderr = collect(stderr_reader, grace);
    debug!(?exit_code, timed_out, elapsed_ms = elapsed.as_millis() as u64, "subject finished");

    Ok(ExecutionResult {
        exit_code,
        stdout,
        stderr,
        audio_path,
        timed_out,
        elapsed,
    })
}

/// Waits for `child`; returns `None` if it was killed after `timeout`.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() > timeout {
            kill_process_group(child);
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn isolate_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_cmd: &mut Command) {}

/// Kills the subject's process group so wrapper scripts take their children down too.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    let group = format!("-{}", child.id());
    let killed = Command::new("kill")
        .args(["-s", "KILL", "--", &group])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(err) = killed {
        debug!(%err, "failed to kill subject process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    })
}

/// Waits for a pipe reader. With `grace`, gives up after that long and
/// returns nothing; the detached reader ends once the pipe closes.
fn collect(reader: Option<Receiver<Vec<u8>>>, grace: Option<Duration>) -> Vec<u8> {
    let Some(reader) = reader else {
        return Vec::new();
    };
    let received = match grace {
        Some(grace) => reader.recv_timeout(grace).ok(),
        None => reader.recv().ok(),
    };
    received.unwrap_or_default()
}
