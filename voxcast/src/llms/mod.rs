//! LLM completion backends.
//!
//! [`CompletionProvider`] is the seam the pipelines call through. The
//! production backend is [`groq`]; [`MockCompletion`] replays canned answers
//! in tests.
//!
//! # Available Backends
//!
//! - [`groq`] - Groq's OpenAI-compatible chat completions API

pub mod groq;
mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;

pub use groq::{Groq, GroqConfig};
pub use mock::MockCompletion;

/// Temperature used by both pipelines.
pub const DEFAULT_TEMPERATURE: f32 = 0.4;

/// One prompt-in, text-out completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g. `llama3-70b-8192`).
    pub model: String,
    /// Fully rendered prompt, sent as a single user message.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl CompletionRequest {
    /// Create a request with the default temperature.
    #[must_use]
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Trait for backends that turn a prompt into text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Submit a prompt and return the raw response text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError>;

    /// Get the name of this provider, used in logs and errors.
    fn provider_name(&self) -> &'static str;
}

/// Shared, dynamically dispatched completion provider.
pub type SharedCompletionProvider = Arc<dyn CompletionProvider>;

