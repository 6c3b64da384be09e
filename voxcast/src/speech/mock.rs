//! Mock speech provider for testing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::audio::{PcmSpec, PcmTrack};
use crate::error::UpstreamError;

use super::{SpeechProvider, SpeechRequest};

/// A speech provider that renders text into a synthetic WAV.
///
/// Each character becomes `frames_per_char` frames, so the track length is
/// predictable. Sample `i` of a track has value `i % 30_000`. Requests are
/// recorded, and individual voices can be made to fail.
#[derive(Debug)]
pub struct MockSpeech {
    spec: PcmSpec,
    frames_per_char: usize,
    failures: HashMap<String, UpstreamError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<SpeechRequest>>,
}

impl Default for MockSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpeech {
    /// Mono 24 kHz output, 10 frames per character.
    #[must_use]
    pub fn new() -> Self {
        Self {
            spec: PcmSpec::mono(24_000),
            frames_per_char: 10,
            failures: HashMap::new(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Set the output layout.
    #[must_use]
    pub const fn with_spec(mut self, spec: PcmSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Set how many frames each character produces.
    #[must_use]
    pub const fn with_frames_per_char(mut self, frames: usize) -> Self {
        self.frames_per_char = frames;
        self
    }

    /// Fail every request for `voice` with `error`.
    #[must_use]
    pub fn fail_voice(mut self, voice: impl Into<String>, error: UpstreamError) -> Self {
        self.failures.insert(voice.into(), error);
        self
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The track this mock produces for `text`.
    #[must_use]
    pub fn render(&self, text: &str) -> PcmTrack {
        let frames = text.chars().count() * self.frames_per_char;
        let channels = usize::from(self.spec.channels.max(1));
        let samples = (0..frames * channels)
            .map(|i| i16::try_from((i / channels) % 30_000).unwrap_or_default())
            .collect();
        PcmTrack::new(self.spec, samples)
    }
}

#[async_trait]
impl SpeechProvider for MockSpeech {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(error) = self.failures.get(&request.voice) {
            return Err(error.clone());
        }

        self.render(&request.text)
            .to_wav()
            .map_err(|e| UpstreamError::internal(e.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
