//! Text-to-speech types and provider trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use voxcast::speech::{SpeechProvider, SpeechRequest};
//!
//! let request = SpeechRequest::new("Hello, world!", "aura-stella-en");
//! let wav = provider.synthesize(&request).await?;
//! std::fs::write("hello.wav", wav)?;
//! ```

pub mod deepgram;
mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;

pub use deepgram::{Deepgram, DeepgramConfig};
pub use mock::MockSpeech;

/// Sample encoding requested from the speech endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// 16-bit signed little-endian PCM.
    #[default]
    Linear16,
}

impl AudioEncoding {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Linear16 => "linear16",
        }
    }
}

/// Container wrapped around the encoded samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioContainer {
    /// RIFF/WAVE.
    #[default]
    Wav,
}

impl AudioContainer {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
        }
    }
}

/// Request for synthesizing speech from text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// Text to speak.
    pub text: String,
    /// Voice model identifier (e.g. `aura-stella-en`).
    pub voice: String,
    /// Sample encoding.
    pub encoding: AudioEncoding,
    /// Output container.
    pub container: AudioContainer,
}

impl SpeechRequest {
    /// Create a linear16 WAV request.
    #[must_use]
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            encoding: AudioEncoding::Linear16,
            container: AudioContainer::Wav,
        }
    }
}

/// Trait for providers that turn text into audio bytes.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize `request.text` with `request.voice`.
    ///
    /// Returns the raw response body: a complete audio container.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, UpstreamError>;

    /// Get the name of this provider, used in logs and errors.
    fn provider_name(&self) -> &'static str;
}

/// Shared, dynamically dispatched speech provider.
pub type SharedSpeechProvider = Arc<dyn SpeechProvider>;
