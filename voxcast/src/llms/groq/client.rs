//! Groq API client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::error::UpstreamError;
use crate::llms::CompletionRequest;

use super::config::GroqConfig;
use super::types::{GroqChatRequest, GroqErrorResponse, GroqMessage};

/// Groq API client.
#[derive(Debug, Clone)]
pub struct Groq {
    pub(crate) config: Arc<GroqConfig>,
    pub(crate) client: Client,
}

impl Groq {
    /// Provider name used in errors and logs.
    pub const PROVIDER: &'static str = "groq";

    /// Create a new Groq client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an auth error if the API key is empty, or an internal error if
    /// the HTTP client cannot be built.
    pub fn new(config: GroqConfig) -> Result<Self, UpstreamError> {
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

    /// Build the chat completions URL.
    pub(crate) fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Build an authenticated JSON POST.
    pub(crate) fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .header("Content-Type", "application/json")
    }

    /// Build the request body: the prompt goes out as one user message.
    pub(crate) fn build_body(request: &CompletionRequest) -> GroqChatRequest {
        GroqChatRequest {
            model: request.model.clone(),
            messages: vec![GroqMessage::user(request.prompt.clone())],
            temperature: Some(request.temperature),
            stream: false,
        }
    }

    /// Parse an error response from Groq.
    pub(crate) fn parse_error(status: u16, body: &str) -> UpstreamError {
        if let Ok(error_response) = serde_json::from_str::<GroqErrorResponse>(body) {
            let error = error_response.error;
            let code = error.code.or(error.error_type);
            return UpstreamError::from_status(Self::PROVIDER, status, code, error.message);
        }

        match status {
            401 | 403 | 429 => UpstreamError::from_status(Self::PROVIDER, status, None, body),
            _ => UpstreamError::http_status(status, body.to_owned()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn client() -> Groq {
        Groq::new(GroqConfig::new("gsk-test").with_base_url("http://localhost:9999/openai/v1/"))
            .expect("client should build")
    }

    #[test]
    fn test_requires_api_key() {
        let err = Groq::new(GroqConfig::default()).expect_err("empty key must fail");
        assert!(matches!(err, UpstreamError::Auth { .. }));
    }

    #[test]
    fn test_chat_url_trims_trailing_slash() {
        assert_eq!(
            client().chat_url(),
            "http://localhost:9999/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_body_has_single_user_message() {
        let request = CompletionRequest::new("llama3-70b-8192", "Generate a podcast");
        let body = Groq::build_body(&request);

        assert_eq!(body.model, "llama3-70b-8192");
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
        assert_eq!(body.messages[0].content.as_deref(), Some("Generate a podcast"));
        assert_eq!(body.temperature, Some(0.4));
        assert!(!body.stream);
    }

    #[test]
    fn test_parse_error_variants() {
        let body = r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error", "code": "invalid_api_key"}}"#;
        assert!(matches!(
            Groq::parse_error(401, body),
            UpstreamError::Auth { .. }
        ));

        let body = r#"{"error": {"message": "Rate limit reached", "type": "tokens"}}"#;
        assert!(matches!(
            Groq::parse_error(429, body),
            UpstreamError::RateLimited { .. }
        ));

        let body = r#"{"error": {"message": "model not found", "type": "invalid_request_error", "code": "model_not_found"}}"#;
        match Groq::parse_error(404, body) {
            UpstreamError::Provider { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("model_not_found"));
                assert_eq!(message, "model not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            Groq::parse_error(502, "<html>bad gateway</html>"),
            UpstreamError::HttpStatus { status: 502, .. }
        ));
    }
}
