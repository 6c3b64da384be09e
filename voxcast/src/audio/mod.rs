//! Audio decoding, segmentation and export.
//!
//! Speech comes back from the synthesis endpoint as linear16 WAV. It is
//! decoded into a [`PcmTrack`], cut per dialogue segment by the
//! [`Compositor`], and the stitched track is exported as MP3 or WAV.

mod compositor;
mod export;
mod pcm;
mod split;

use serde::{Deserialize, Serialize};

pub use compositor::Compositor;
pub use export::{DEFAULT_BITRATE_KBPS, encode, write_atomic};
pub(crate) use export::is_supported_bitrate;
pub use pcm::{PcmSpec, PcmTrack};
pub use split::{proportional_ranges, text_weights};

/// Container the final podcast is exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// MPEG-1/2 Layer III at a fixed bit rate.
    #[default]
    Mp3,
    /// Uncompressed linear16 WAV.
    Wav,
}

impl OutputFormat {
    /// Get the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    /// Detect format from file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            _ => None,
        }
    }
}

/// Error type for audio processing.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AudioError {
    /// The bytes could not be decoded as WAV.
    #[error("WAV decode failed: {0}")]
    Decode(String),

    /// WAV encoding failed.
    #[error("WAV encode failed: {0}")]
    Encode(String),

    /// The audio is not 16-bit integer PCM.
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Two tracks with different layouts were joined.
    #[error("cannot join {left} audio with {right} audio")]
    SpecMismatch {
        /// Layout of the track being appended to.
        left: PcmSpec,
        /// Layout of the appended track.
        right: PcmSpec,
    },

    /// A segment's speaker has no synthesized audio.
    #[error("no audio for speaker `{0}`")]
    MissingSpeaker(String),

    /// Non-empty text was synthesized into zero frames.
    #[error("speech for speaker `{0}` decoded to no audio")]
    EmptySpeech(String),

    /// MP3 encoding failed or is unavailable.
    #[error("MP3 encode failed: {0}")]
    Mp3(String),

    /// I/O error while writing the output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => Self::Io(e),
            hound::Error::Unsupported => Self::UnsupportedFormat("unsupported WAV variant".into()),
            other => Self::Decode(other.to_string()),
        }
    }
}
