//! Groq chat completion wire types.
//!
//! Groq speaks the OpenAI Chat Completions format; only the fields this crate
//! sends or reads are modeled.

use serde::{Deserialize, Serialize};

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct GroqChatRequest {
    pub model: String,
    pub messages: Vec<GroqMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroqMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl GroqMessage {
    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_owned(),
            content: Some(content.into()),
        }
    }
}

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct GroqChatResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<GroqChoice>,
    #[serde(default)]
    pub usage: Option<GroqUsage>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct GroqChoice {
    pub message: GroqMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token accounting.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GroqUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

/// Error response body.
#[derive(Debug, Clone, Deserialize)]
pub struct GroqErrorResponse {
    pub error: GroqError,
}

/// Error details.
#[derive(Debug, Clone, Deserialize)]
pub struct GroqError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}
