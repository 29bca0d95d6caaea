//! Conformance case model and case-list loading.
//!
//! Cases are declared in a JSON manifest (`cases.json` in the fixtures
//! directory by default). Relative paths in the manifest resolve against the
//! manifest's own directory. Without a manifest the built-in case list is
//! used.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ConformanceError, ConformanceResult};

/// Default manifest file name inside the fixtures directory.
pub const MANIFEST_FILE: &str = "cases.json";

/// Case names become directory and file names, so they are restricted.
pub const CASE_NAME_PATTERN: &str = r"^[a-z0-9][a-z0-9_.-]*$";

static CASE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn case_name_regex() -> &'static Regex {
    CASE_NAME_REGEX.get_or_init(|| Regex::new(CASE_NAME_PATTERN).expect("invalid regex pattern"))
}

/// Checks if a case name is usable as a file name component.
pub fn is_valid_case_name(name: &str) -> bool {
    case_name_regex().is_match(name)
}

/// One configured invocation of the subject plus its expected outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    name: String,
    session: PathBuf,
    subject_args: Vec<String>,
    expected_json: PathBuf,
    expected_wav: PathBuf,
}

impl TestCase {
    /// Creates a new case.
    pub fn new(
        name: impl Into<String>,
        session: impl Into<PathBuf>,
        subject_args: Vec<String>,
        expected_json: impl Into<PathBuf>,
        expected_wav: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            session: session.into(),
            subject_args,
            expected_json: expected_json.into(),
            expected_wav: expected_wav.into(),
        }
    }

    /// Case name, unique within a run.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session file passed to the subject via `--session`.
    pub fn session(&self) -> &Path {
        &self.session
    }

    /// Case-specific flags passed to the subject.
    pub fn subject_args(&self) -> &[String] {
        &self.subject_args
    }

    /// Golden JSON fixture.
    pub fn expected_json(&self) -> &Path {
        &self.expected_json
    }

    /// Golden WAV fixture, raw or base64-wrapped.
    pub fn expected_wav(&self) -> &Path {
        &self.expected_wav
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseManifest {
    cases: Vec<ManifestCase>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestCase {
    name: String,
    session: PathBuf,
    #[serde(default)]
    args: Vec<String>,
    expected_json: PathBuf,
    expected_wav: PathBuf,
}

/// Loads the case list for a run.
///
/// Precedence: an explicit `manifest`, then `<fixtures_dir>/cases.json`, then
/// the built-in cases.
pub fn load_cases(fixtures_dir: &Path, manifest: Option<&Path>) -> ConformanceResult<Vec<TestCase>> {
    if let Some(path) = manifest {
        return load_manifest(path);
    }

    let default_manifest = fixtures_dir.join(MANIFEST_FILE);
    if default_manifest.is_file() {
        return load_manifest(&default_manifest);
    }

    debug!(fixtures = %fixtures_dir.display(), "no case manifest, using built-in cases");
    Ok(builtin_cases(fixtures_dir))
}

/// Parses a case manifest file.
pub fn load_manifest(path: &Path) -> ConformanceResult<Vec<TestCase>> {
    let content = fs::read_to_string(path).map_err(|source| ConformanceError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: CaseManifest =
        serde_json::from_str(&content).map_err(|source| ConformanceError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

    if manifest.cases.is_empty() {
        return Err(ConformanceError::NoCases {
            path: path.to_path_buf(),
        });
    }

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let cases: Vec<TestCase> = manifest
        .cases
        .into_iter()
        .map(|case| {
            TestCase::new(
                case.name,
                base.join(case.session),
                case.args,
                base.join(case.expected_json),
                base.join(case.expected_wav),
            )
        })
        .collect();

    validate_cases(&cases)?;
    debug!(manifest = %path.display(), count = cases.len(), "loaded case manifest");
    Ok(cases)
}

/// The built-in case list: a solo click render at 44.1 kHz / 16-bit.
///
/// The session lives in the repository-level `fixtures/` directory, two
/// levels above the conformance fixtures.
pub fn builtin_cases(fixtures_dir: &Path) -> Vec<TestCase> {
    let repo_root = fixtures_dir.ancestors().nth(2).unwrap_or(fixtures_dir);
    let session = repo_root.join("fixtures").join("solo_click.json");
    let render_fixture_dir = fixtures_dir.join("render_click");

    vec![TestCase::new(
        "render_click_solo",
        session,
        ["--json", "--sr", "44100", "--bd", "16", "render-click"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        render_fixture_dir.join("solo_click.render.json"),
        render_fixture_dir.join("solo_click.render.wav.b64"),
    )]
}

/// Rejects invalid or duplicate case names.
pub fn validate_cases(cases: &[TestCase]) -> ConformanceResult<()> {
    let mut seen = HashSet::new();
    for case in cases {
        if !is_valid_case_name(case.name()) {
            return Err(ConformanceError::InvalidCaseName {
                name: case.name().to_string(),
                pattern: CASE_NAME_PATTERN,
            });
        }
        if !seen.insert(case.name()) {
            return Err(ConformanceError::DuplicateCase {
                name: case.name().to_string(),
            });
        }
    }
    Ok(())
}
