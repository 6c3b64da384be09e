//! Interleaved 16-bit PCM tracks.

use std::borrow::Cow;
use std::fmt;
use std::io::{Cursor, ErrorKind};
use std::ops::Range;
use std::time::Duration;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AudioError;

/// Sample layout of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PcmSpec {
    /// Frames per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl PcmSpec {
    /// Create a layout.
    #[must_use]
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Mono layout at `sample_rate`.
    #[must_use]
    pub const fn mono(sample_rate: u32) -> Self {
        Self::new(sample_rate, 1)
    }

    const fn wav_spec(self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }
}

impl fmt::Display for PcmSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz/{} ch", self.sample_rate, self.channels)
    }
}

/// Decoded linear16 audio.
///
/// Samples are interleaved; a frame holds one sample per channel. The sample
/// count is always a whole number of frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmTrack {
    spec: PcmSpec,
    samples: Vec<i16>,
}

impl PcmTrack {
    /// Wrap interleaved samples, dropping a trailing partial frame.
    #[must_use]
    pub fn new(spec: PcmSpec, mut samples: Vec<i16>) -> Self {
        let channels = usize::from(spec.channels.max(1));
        samples.truncate(samples.len() - samples.len() % channels);
        Self { spec, samples }
    }

    /// An empty track with the given layout.
    #[must_use]
    pub const fn empty(spec: PcmSpec) -> Self {
        Self {
            spec,
            samples: Vec::new(),
        }
    }

    /// Decode a WAV container holding 16-bit integer PCM.
    ///
    /// Streaming responses carry a placeholder length (`0` or `0xFFFFFFFF`)
    /// in the `RIFF` and `data` headers. When the declared `data` length is
    /// a placeholder or runs past the buffer, both sizes are rewritten to
    /// the bytes actually present, rounded down to whole frames.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::UnsupportedFormat`] for anything other than
    /// 16-bit integer samples, or [`AudioError::Decode`] for a malformed
    /// container.
    pub fn from_wav(bytes: &[u8]) -> Result<Self, AudioError> {
        let bytes = repair_sizes(bytes);
        let mut reader = WavReader::new(Cursor::new(bytes.as_ref()))?;
        let wav = reader.spec();
        if wav.sample_format != SampleFormat::Int || wav.bits_per_sample != 16 {
            return Err(AudioError::UnsupportedFormat(format!(
                "{}-bit {:?}",
                wav.bits_per_sample, wav.sample_format
            )));
        }

        let declared = reader.len() as usize;
        let mut samples = Vec::with_capacity(declared.min(bytes.len() / 2));
        for sample in reader.samples::<i16>() {
            match sample {
                Ok(s) => samples.push(s),
                Err(hound::Error::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    debug!(declared, read = samples.len(), "WAV data shorter than header");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Self::new(
            PcmSpec::new(wav.sample_rate, wav.channels),
            samples,
        ))
    }

    /// Encode as a 16-bit PCM WAV file.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Encode`] if the writer fails.
    pub fn to_wav(&self) -> Result<Vec<u8>, AudioError> {
        let encode_err = |e: hound::Error| AudioError::Encode(e.to_string());

        let mut cursor = Cursor::new(Vec::with_capacity(44 + self.samples.len() * 2));
        let mut writer = WavWriter::new(&mut cursor, self.spec.wav_spec()).map_err(encode_err)?;
        for &sample in &self.samples {
            writer.write_sample(sample).map_err(encode_err)?;
        }
        writer.finalize().map_err(encode_err)?;

        Ok(cursor.into_inner())
    }

    /// Sample layout.
    #[must_use]
    pub const fn spec(&self) -> PcmSpec {
        self.spec
    }

    /// Interleaved samples.
    #[must_use]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of frames.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.spec.channels.max(1))
    }

    /// Whether the track holds no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        if self.spec.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.spec.sample_rate))
    }

    /// Copy a frame range into a new track. The range is clamped to the track.
    #[must_use]
    pub fn slice(&self, frames: Range<usize>) -> Self {
        let channels = usize::from(self.spec.channels.max(1));
        let end = frames.end.min(self.frames()) * channels;
        let start = (frames.start * channels).min(end);
        Self {
            spec: self.spec,
            samples: self.samples[start..end].to_vec(),
        }
    }

    /// Append another track's frames.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::SpecMismatch`] if the layouts differ.
    pub fn append(&mut self, other: &Self) -> Result<(), AudioError> {
        if self.spec != other.spec {
            return Err(AudioError::SpecMismatch {
                left: self.spec,
                right: other.spec,
            });
        }
        self.samples.extend_from_slice(&other.samples);
        Ok(())
    }
}

/// Placeholder lengths written by streaming encoders.
const PLACEHOLDER_SIZES: [u32; 2] = [0, u32::MAX];

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let raw = bytes.get(at..at + 2)?;
    Some(u16::from_le_bytes([raw[0], raw[1]]))
}

/// Fix up the `RIFF` and `data` sizes of a streamed WAV.
///
/// Bytes that are not a RIFF/WAVE container, or whose `data` size already
/// fits the buffer, are returned untouched.
fn repair_sizes(bytes: &[u8]) -> Cow<'_, [u8]> {
    if !bytes.starts_with(b"RIFF") || bytes.get(8..12) != Some(b"WAVE".as_slice()) {
        return Cow::Borrowed(bytes);
    }

    let mut block_align = 2usize;
    let mut offset = 12;
    while let (Some(id), Some(size)) = (bytes.get(offset..offset + 4), read_u32(bytes, offset + 4)) {
        let body = offset + 8;
        if id == b"fmt " {
            if let Some(align) = read_u16(bytes, body + 12).filter(|a| *a > 0) {
                block_align = usize::from(align);
            }
        } else if id == b"data" {
            let available = bytes.len() - body;
            let fits = usize::try_from(size).is_ok_and(|s| s <= available);
            if fits && !PLACEHOLDER_SIZES.contains(&size) {
                return Cow::Borrowed(bytes);
            }
            let data_len = available - available % block_align;
            debug!(declared = size, actual = data_len, "rewriting streamed WAV sizes");

            let mut fixed = bytes[..body + data_len].to_vec();
            let riff_len = u32::try_from(fixed.len() - 8).unwrap_or(u32::MAX);
            let data_len = u32::try_from(data_len).unwrap_or(u32::MAX);
            fixed[4..8].copy_from_slice(&riff_len.to_le_bytes());
            fixed[offset + 4..body].copy_from_slice(&data_len.to_le_bytes());
            return Cow::Owned(fixed);
        }
        // Chunks are padded to an even length.
        let Some(next) = usize::try_from(size)
            .ok()
            .and_then(|s| s.checked_add(s & 1))
            .and_then(|s| body.checked_add(s))
        else {
            break;
        };
        offset = next;
    }

    Cow::Borrowed(bytes)
}
