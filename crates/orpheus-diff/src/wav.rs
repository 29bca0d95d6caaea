//! WAV decoding and byte-exact comparison.
//!
//! A WAV input is reduced to its format parameters and the raw interleaved
//! frame bytes of its `data` chunk. Fixtures may be stored base64-encoded; the
//! encoding is resolved once from the path ([`InputEncoding::from_path`]) and
//! passed to the decoder explicitly.
//!
//! Comparison is exact: the renderer is expected to be bit-deterministic, so
//! there is no tolerance, resampling, or perceptual distance.

use std::fmt;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::artifact::{ensure_dir, record_comparison, WAV_DIFF_FILE};
use crate::error::{DiffError, DiffResult};
use crate::Comparison;

/// How the bytes of a WAV input are wrapped on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEncoding {
    /// A plain RIFF/WAVE file.
    Raw,
    /// Base64 text wrapping a RIFF/WAVE file.
    Base64,
}

impl InputEncoding {
    /// Resolves the encoding from the path's suffixes.
    ///
    /// Any `.b64` or `.base64` suffix (case-insensitive) selects base64, so
    /// both `render.b64` and `render.wav.b64` are decoded.
    pub fn from_path(path: &Path) -> Self {
        let Some(name) = path.file_name() else {
            return InputEncoding::Raw;
        };
        let name = name.to_string_lossy();
        let name = name.strip_prefix('.').unwrap_or(&name);

        let is_base64 = name
            .split('.')
            .skip(1)
            .any(|suffix| suffix.eq_ignore_ascii_case("b64") || suffix.eq_ignore_ascii_case("base64"));

        if is_base64 {
            InputEncoding::Base64
        } else {
            InputEncoding::Raw
        }
    }
}

/// Sample encoding of the `data` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Integer PCM.
    Pcm,
    /// IEEE 754 floating point samples.
    IeeeFloat,
}

impl Compression {
    /// Short compression type tag.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Compression::Pcm => "NONE",
            Compression::IeeeFloat => "FLOAT",
        }
    }

    /// Human-readable compression name.
    pub fn name(&self) -> &'static str {
        match self {
            Compression::Pcm => "not compressed",
            Compression::IeeeFloat => "IEEE float",
        }
    }
}

impl From<hound::SampleFormat> for Compression {
    fn from(format: hound::SampleFormat) -> Self {
        match format {
            hound::SampleFormat::Int => Compression::Pcm,
            hound::SampleFormat::Float => Compression::IeeeFloat,
        }
    }
}

/// Format parameters of a WAV payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavParams {
    /// Number of interleaved channels.
    pub channels: u16,
    /// Bytes per sample.
    pub sample_width: u16,
    /// Frames per second.
    pub frame_rate: u32,
    /// Number of frames declared by the header.
    pub frames: u32,
    /// Sample encoding.
    pub compression: Compression,
}

impl fmt::Display for WavParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "channels={}, sample_width={}, frame_rate={}, frames={}, compression={}/{}",
            self.channels,
            self.sample_width,
            self.frame_rate,
            self.frames,
            self.compression.type_tag(),
            self.compression.name()
        )
    }
}

/// A decoded WAV payload: parameters plus raw frame bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavPayload {
    pub params: WavParams,
    pub frame_bytes: Vec<u8>,
}

impl WavPayload {
    /// Reads and decodes the WAV file at `path`.
    pub fn load(path: &Path) -> DiffResult<Self> {
        let raw = fs::read(path).map_err(|source| DiffError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(path, &raw, InputEncoding::from_path(path))
    }

    /// Decodes `bytes` using `encoding`. `source` is only used in errors.
    pub fn decode(source: &Path, bytes: &[u8], encoding: InputEncoding) -> DiffResult<Self> {
        match encoding {
            InputEncoding::Raw => Self::parse(source, bytes),
            InputEncoding::Base64 => {
                let decoded = STANDARD
                    .decode(trim_ascii_whitespace(bytes))
                    .map_err(|err| DiffError::Base64 {
                        path: source.to_path_buf(),
                        source: err,
                    })?;
                Self::parse(source, &decoded)
            }
        }
    }

    fn parse(source: &Path, bytes: &[u8]) -> DiffResult<Self> {
        let reader =
            hound::WavReader::new(Cursor::new(bytes)).map_err(|err| DiffError::InvalidWav {
                path: source.to_path_buf(),
                source: err,
            })?;

        let spec = reader.spec();
        let frames = reader.duration();
        let sample_width = spec.bits_per_sample.div_ceil(8);
        let byte_len = frames as u64 * u64::from(spec.channels) * u64::from(sample_width);

        // The reader is positioned at the start of the data chunk.
        let mut frame_bytes = Vec::new();
        reader
            .into_inner()
            .take(byte_len)
            .read_to_end(&mut frame_bytes)
            .map_err(|err| DiffError::ReadFrames {
                path: source.to_path_buf(),
                source: err,
            })?;

        let params = WavParams {
            channels: spec.channels,
            sample_width,
            frame_rate: spec.sample_rate,
            frames,
            compression: spec.sample_format.into(),
        };
        debug!(path = %source.display(), %params, bytes = frame_bytes.len(), "decoded WAV payload");

        Ok(Self {
            params,
            frame_bytes,
        })
    }
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Compares two decoded payloads.
///
/// The report lists a parameter block and/or a payload block. The payload
/// block names the first differing byte within the overlapping range, and
/// both lengths when they differ.
pub fn compare_wav_payloads(expected: &WavPayload, actual: &WavPayload) -> Comparison {
    let mut lines: Vec<String> = Vec::new();

    if expected.params != actual.params {
        lines.push("parameter mismatch:".to_string());
        lines.push(format!("  expected: {}", expected.params));
        lines.push(format!("  actual:   {}", actual.params));
    }

    let expected_data = &expected.frame_bytes;
    let actual_data = &actual.frame_bytes;
    if expected_data != actual_data {
        lines.push("audio payload differs".to_string());

        let first_mismatch = expected_data
            .iter()
            .zip(actual_data.iter())
            .position(|(a, b)| a != b);
        if let Some(offset) = first_mismatch {
            lines.push(format!("  first mismatch at byte {}", offset));
        }

        if expected_data.len() != actual_data.len() {
            lines.push(format!(
                "  frame byte lengths differ: expected={}, actual={}",
                expected_data.len(),
                actual_data.len()
            ));
        }
    }

    if lines.is_empty() {
        Comparison::matched()
    } else {
        Comparison::mismatch(lines.join("\n"))
    }
}

/// Loads and compares two WAV files.
pub fn compare_wav_files(expected: &Path, actual: &Path) -> DiffResult<Comparison> {
    let expected_payload = WavPayload::load(expected)?;
    let actual_payload = WavPayload::load(actual)?;
    Ok(compare_wav_payloads(&expected_payload, &actual_payload))
}

/// Compares two WAV files and records the report as `diff.txt` in `output_dir`.
///
/// The directory is created if needed; a stale `diff.txt` is removed when the
/// files match.
pub fn compare_wav_into_dir(
    expected: &Path,
    actual: &Path,
    output_dir: &Path,
) -> DiffResult<Comparison> {
    ensure_dir(output_dir)?;
    let comparison = compare_wav_files(expected, actual)?;
    record_comparison(&output_dir.join(WAV_DIFF_FILE), &comparison)?;
    Ok(comparison)
}
