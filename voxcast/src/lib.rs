//! Voxcast - turn a topic into a spoken answer or a multi-voice podcast.
//!
//! This crate drives a hosted LLM completion API (Groq) and a hosted
//! text-to-speech API (Deepgram Aura), then splits, stitches and exports the
//! resulting audio.

pub mod audio;
pub mod config;
pub mod error;
pub mod llms;
pub mod pipeline;
pub mod prelude;
pub mod prompts;
pub mod script;
pub mod speech;
pub mod voices;

pub use error::{Error, Result, UpstreamError};
pub use pipeline::{PodcastOutput, Podcaster};
