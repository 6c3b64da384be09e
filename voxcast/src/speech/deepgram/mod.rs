//! Deepgram speech API client implementation.
//!
//! Uses the REST `speak` endpoint with Aura voices, returning a complete
//! linear16 WAV file per call.

mod client;
mod config;

pub use client::Deepgram;
pub use config::DeepgramConfig;
