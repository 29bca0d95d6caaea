//! Shared scaffolding: a fixture tree plus a shell stand-in for the subject.

#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tempfile::TempDir;

use orpheus_conformance::TestCase;

pub const RENDER_JSON: &str = "{\"sample_rate\": 44100, \"frames\": 8, \"peak\": 0.5}\n";

/// A short mono 16-bit click.
pub fn click_wav() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for sample in [0i16, 16384, -16384, 8192, -8192, 0, 0, 0] {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Scratch tree with golden fixtures, a session file and subject outputs.
pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let ws = Self {
            root: tempfile::tempdir().unwrap(),
        };
        fs::create_dir_all(ws.fixtures().join("render_click")).unwrap();
        fs::create_dir_all(ws.build_dir()).unwrap();
        fs::create_dir_all(ws.path("sources")).unwrap();

        fs::write(ws.session(), "{\"tracks\": []}\n").unwrap();
        fs::write(ws.expected_json(), RENDER_JSON).unwrap();
        fs::write(ws.expected_wav(), STANDARD.encode(click_wav()) + "\n").unwrap();

        // What the stand-in subject emits unless a test changes it.
        ws.set_subject_output(RENDER_JSON, &click_wav());
        ws
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    pub fn fixtures(&self) -> PathBuf {
        self.path("golden")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.path("build")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path("out")
    }

    pub fn diff_dir(&self) -> PathBuf {
        self.path("diffs")
    }

    pub fn session(&self) -> PathBuf {
        self.path("session.json")
    }

    pub fn expected_json(&self) -> PathBuf {
        self.fixtures().join("render_click").join("click.render.json")
    }

    pub fn expected_wav(&self) -> PathBuf {
        self.fixtures().join("render_click").join("click.render.wav.b64")
    }

    pub fn set_subject_output(&self, json: &str, wav: &[u8]) {
        fs::write(self.path("sources/render.json"), json).unwrap();
        fs::write(self.path("sources/render.wav"), wav).unwrap();
    }

    pub fn case(&self, name: &str) -> TestCase {
        TestCase::new(
            name,
            self.session(),
            vec!["--json".to_string(), "render-click".to_string()],
            self.expected_json(),
            self.expected_wav(),
        )
    }

    /// Writes `cases.json` listing `names`, all sharing the click fixtures.
    pub fn write_manifest(&self, names: &[&str]) {
        let cases: Vec<serde_json::Value> = names
            .iter()
            .map(|name| {
                serde_json::json!({
                    "name": name,
                    "session": "../session.json",
                    "args": ["--json", "render-click"],
                    "expected_json": "render_click/click.render.json",
                    "expected_wav": "render_click/click.render.wav.b64"
                })
            })
            .collect();
        let manifest = serde_json::json!({ "cases": cases });
        fs::write(
            self.fixtures().join("cases.json"),
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .unwrap();
    }

    /// Installs a well-behaved subject that echoes the prepared outputs.
    pub fn install_subject(&self) -> PathBuf {
        let sources = self.path("sources");
        let body = format!(
            r#"session=""
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --session) session="$2"; shift 2 ;;
    --out) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
[ -f "$session" ] || {{ echo "missing session: $session" >&2; exit 9; }}
cat "{sources}/render.json"
cp "{sources}/render.wav" "$out"
"#,
            sources = sources.display()
        );
        self.install_script(&body)
    }

    /// Installs a subject that fails with `code` after writing to stderr.
    pub fn install_crashing_subject(&self, code: i32) -> PathBuf {
        self.install_script(&format!(
            "echo '{{\"partial\": true}}'\necho 'render failed' >&2\nexit {}\n",
            code
        ))
    }

    /// Installs a subject that never finishes on its own.
    pub fn install_hanging_subject(&self) -> PathBuf {
        self.install_script("exec sleep 30\n")
    }

    /// Installs a wrapper script whose child renderer never finishes.
    pub fn install_hanging_wrapper_subject(&self) -> PathBuf {
        self.install_script("echo 'starting renderer' >&2\nsleep 30\necho done\n")
    }

    /// Installs a subject that prints bytes which are not UTF-8, then fails.
    pub fn install_binary_stdout_subject(&self) -> PathBuf {
        self.install_script("printf '\\377{}'\nexit 1\n")
    }

    /// Installs a subject that exits cleanly without writing any audio.
    pub fn install_silent_subject(&self) -> PathBuf {
        self.install_script(&format!("cat \"{}\"\n", self.path("sources/render.json").display()))
    }

    #[cfg(unix)]
    fn install_script(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.build_dir().join("orpheus_minhost");
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(not(unix))]
    fn install_script(&self, _body: &str) -> PathBuf {
        unimplemented!("shell stand-in subjects need a unix shell")
    }
}

/// Flips one bit in the last byte of the WAV data chunk.
pub fn corrupt_last_sample(wav: &[u8]) -> Vec<u8> {
    let mut bytes = wav.to_vec();
    if let Some(last) = bytes.last_mut() {
        *last ^= 0x01;
    }
    bytes
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}
