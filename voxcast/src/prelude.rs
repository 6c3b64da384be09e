//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use voxcast::prelude::*;
//! ```

pub use crate::audio::{AudioError, Compositor, OutputFormat, PcmSpec, PcmTrack};
pub use crate::config::{Config, ConfigError, OutputSettings, PodcastSettings};
pub use crate::error::{Error, Result, UpstreamError};
pub use crate::llms::{
    CompletionProvider, CompletionRequest, Groq, GroqConfig, MockCompletion,
    SharedCompletionProvider,
};
pub use crate::pipeline::{PodcastOutput, Podcaster};
pub use crate::prompts::{PromptEngine, PromptRender, PromptTemplates, TemplateContext};
pub use crate::script::{
    Gender, MalformedScriptError, PodcastRequest, PodcastScript, Segment, Speaker, parse_script,
    parse_script_lenient,
};
pub use crate::speech::{
    Deepgram, DeepgramConfig, MockSpeech, SharedSpeechProvider, SpeechProvider, SpeechRequest,
};
pub use crate::voices::{PoolExhaustedError, VoiceAssignment, VoicePools};
