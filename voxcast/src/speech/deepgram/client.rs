//! Deepgram Aura text-to-speech client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::UpstreamError;
use crate::speech::{SpeechProvider, SpeechRequest};

use super::config::DeepgramConfig;

/// `POST /speak` body.
#[derive(Debug, Clone, Serialize)]
struct DeepgramSpeakBody<'a> {
    text: &'a str,
}

/// Deepgram error body. Older endpoints use `err_code`/`err_msg`, newer ones
/// `category`/`message`.
#[derive(Debug, Clone, Deserialize)]
struct DeepgramErrorResponse {
    #[serde(default)]
    err_code: Option<String>,
    #[serde(default)]
    err_msg: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Deepgram API client.
#[derive(Debug, Clone)]
pub struct Deepgram {
    pub(crate) config: Arc<DeepgramConfig>,
    pub(crate) client: Client,
}

impl Deepgram {
    /// Provider name used in errors and logs.
    pub const PROVIDER: &'static str = "deepgram";

    /// Create a new Deepgram client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an auth error if the API key is empty, or an internal error if
    /// the HTTP client cannot be built.
    pub fn new(config: DeepgramConfig) -> Result<Self, UpstreamError> {
        if config.api_key.trim().is_empty() {
            return Err(UpstreamError::auth(Self::PROVIDER, "API key is required"));
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = builder
            .build()
            .map_err(|e| UpstreamError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Build the speak URL.
    pub(crate) fn speak_url(&self) -> String {
        format!("{}/speak", self.config.base_url.trim_end_matches('/'))
    }

    /// Query parameters selecting voice and output format.
    pub(crate) fn speak_query(request: &SpeechRequest) -> [(&'static str, &str); 3] {
        [
            ("model", request.voice.as_str()),
            ("encoding", request.encoding.as_str()),
            ("container", request.container.as_str()),
        ]
    }

    /// Build the authenticated speak request.
    pub(crate) fn build_request(&self, request: &SpeechRequest) -> reqwest::RequestBuilder {
        self.client
            .post(self.speak_url())
            .header("Authorization", format!("Token {}", self.config.api_key))
            .query(&Self::speak_query(request))
            .json(&DeepgramSpeakBody {
                text: &request.text,
            })
    }

    /// Parse an error response from Deepgram.
    pub(crate) fn parse_error(status: u16, body: &str) -> UpstreamError {
        if let Ok(error) = serde_json::from_str::<DeepgramErrorResponse>(body) {
            let code = error.err_code.or(error.category);
            if let Some(message) = error.err_msg.or(error.message) {
                return UpstreamError::from_status(Self::PROVIDER, status, code, message);
            }
        }

        match status {
            401 | 403 | 429 => UpstreamError::from_status(Self::PROVIDER, status, None, body),
            _ => UpstreamError::http_status(status, body.to_owned()),
        }
    }
}

#[async_trait]
impl SpeechProvider for Deepgram {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, UpstreamError> {
        debug!(voice = %request.voice, chars = request.text.chars().count(), "sending speak request");

        let response = self.build_request(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &error_text));
        }

        let audio = response.bytes().await?.to_vec();
        if audio.is_empty() {
            return Err(UpstreamError::response_format("audio bytes", "empty body"));
        }
        debug!(voice = %request.voice, bytes = audio.len(), "speech received");

        Ok(audio)
    }

    fn provider_name(&self) -> &'static str {
        Self::PROVIDER
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn client() -> Deepgram {
        Deepgram::new(DeepgramConfig::new("dg-test").with_base_url("http://localhost:9999/v1"))
            .unwrap()
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            Deepgram::new(DeepgramConfig::default()).unwrap_err(),
            UpstreamError::Auth { .. }
        ));
    }

    #[test]
    fn test_request_shape() {
        let request = SpeechRequest::new("Hello there", "aura-orion-en");
        let built = client().build_request(&request).build().unwrap();

        assert_eq!(*built.method(), reqwest::Method::POST);
        assert_eq!(
            built.url().as_str(),
            "http://localhost:9999/v1/speak?model=aura-orion-en&encoding=linear16&container=wav"
        );
        assert_eq!(
            built.headers().get("Authorization").unwrap(),
            "Token dg-test"
        );

        let body = built.body().and_then(reqwest::Body::as_bytes).unwrap();
        let json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(json, serde_json::json!({"text": "Hello there"}));
    }

    #[test]
    fn test_parse_error_variants() {
        let body = r#"{"err_code": "INVALID_AUTH", "err_msg": "Invalid credentials.", "request_id": "abc"}"#;
        assert!(matches!(
            Deepgram::parse_error(401, body),
            UpstreamError::Auth { .. }
        ));

        let body = r#"{"category": "INVALID_QUERY_PARAMETER", "message": "No such model", "details": "x"}"#;
        match Deepgram::parse_error(400, body) {
            UpstreamError::Provider { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("INVALID_QUERY_PARAMETER"));
                assert_eq!(message, "No such model");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            Deepgram::parse_error(500, "oops"),
            UpstreamError::HttpStatus { status: 500, .. }
        ));
        assert!(matches!(
            Deepgram::parse_error(429, ""),
            UpstreamError::RateLimited { .. }
        ));
    }
}
