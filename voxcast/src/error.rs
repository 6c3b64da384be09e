//! Unified error types for voxcast.
//!
//! Every failure surfaced by the pipelines folds into [`Error`]:
//! - configuration problems ([`ConfigError`])
//! - upstream API failures from the completion or speech endpoints ([`UpstreamError`])
//! - malformed podcast scripts and exhausted voice pools
//! - per-speaker synthesis failures, tagged with the speaker and voice involved
//! - audio decoding, splitting and export problems

use crate::audio::AudioError;
use crate::config::ConfigError;
use crate::prompts::RenderError;
use crate::script::MalformedScriptError;
use crate::voices::PoolExhaustedError;

/// Result type alias for voxcast operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for voxcast.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure calling the completion or speech endpoint.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// The completion response is not a usable podcast script.
    #[error("Malformed script: {0}")]
    MalformedScript(#[from] MalformedScriptError),

    /// More speakers of one gender than available voices.
    #[error("Voice pool exhausted: {0}")]
    PoolExhausted(#[from] PoolExhaustedError),

    /// Speech synthesis failed for one speaker.
    #[error("Synthesis failed for speaker {speaker_id} (voice {voice_id}): {source}")]
    Synthesis {
        /// Speaker whose audio could not be produced.
        speaker_id: String,
        /// Voice that was requested for the speaker.
        voice_id: String,
        /// Underlying upstream failure.
        #[source]
        source: UpstreamError,
    },

    /// The podcast request itself is inconsistent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Prompt template rendering failed.
    #[error("Prompt error: {0}")]
    Prompt(#[from] RenderError),

    /// Audio decoding or export failed.
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a synthesis error for a speaker.
    #[must_use]
    pub fn synthesis(
        speaker_id: impl Into<String>,
        voice_id: impl Into<String>,
        source: UpstreamError,
    ) -> Self {
        Self::Synthesis {
            speaker_id: speaker_id.into(),
            voice_id: voice_id.into(),
            source,
        }
    }
}

/// Error type for calls to a hosted API (completion or speech).
///
/// Each variant is a distinct failure mode.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum UpstreamError {
    /// Authentication or authorization failure.
    #[error("[{provider}] {message}")]
    Auth {
        /// Provider name (e.g., "groq", "deepgram").
        provider: String,
        /// Error description.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("[{provider}] Rate limit exceeded. Please retry after some time.")]
    RateLimited {
        /// Provider name.
        provider: String,
    },

    /// Response body did not have the expected shape.
    #[error("Expected {expected}, got {got}")]
    ResponseFormat {
        /// Expected format description.
        expected: String,
        /// Actual format received.
        got: String,
    },

    /// Network or connection error.
    #[error("{0}")]
    Network(String),

    /// HTTP status error without a recognizable provider body.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Provider-specific error.
    #[error("[{provider}] {message}")]
    Provider {
        /// Provider name.
        provider: String,
        /// Error description.
        message: String,
        /// Optional error code from the provider.
        code: Option<String>,
    },

    /// Internal error (client construction and the like).
    #[error("{0}")]
    Internal(String),
}

impl UpstreamError {
    /// Create an authentication error.
    #[must_use]
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
        }
    }

    /// Create a response format error.
    #[must_use]
    pub fn response_format(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::ResponseFormat {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a provider error with an error code.
    #[must_use]
    pub fn provider_code(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Map a non-success status with an already-extracted provider message.
    #[must_use]
    pub fn from_status(
        provider: &str,
        status: u16,
        code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::auth(provider, message),
            429 => Self::rate_limited(provider),
            _ => Self::Provider {
                provider: provider.to_owned(),
                message,
                code: Some(code.unwrap_or_else(|| status.to_string())),
            },
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}
