//! Groq `CompletionProvider` implementation.

use async_trait::async_trait;
use tracing::debug;

use crate::error::UpstreamError;
use crate::llms::{CompletionProvider, CompletionRequest};

use super::client::Groq;
use super::types::GroqChatResponse;

impl Groq {
    /// Pull the text of the first choice out of a response.
    pub(crate) fn parse_response(response: GroqChatResponse) -> Result<String, UpstreamError> {
        debug!(
            id = response.id.as_deref().unwrap_or("-"),
            model = response.model.as_deref().unwrap_or("-"),
            prompt_tokens = response.usage.map(|u| u.prompt_tokens),
            completion_tokens = response.usage.map(|u| u.completion_tokens),
            "completion received"
        );

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::response_format("at least one choice", "empty choices"))?;

        if let Some(reason) = choice.finish_reason.as_deref().filter(|r| *r != "stop") {
            debug!(finish_reason = reason, "completion did not stop naturally");
        }

        choice
            .message
            .content
            .ok_or_else(|| UpstreamError::response_format("message content", "null content"))
    }
}

#[async_trait]
impl CompletionProvider for Groq {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
        let url = self.chat_url();
        let body = Self::build_body(request);
        debug!(model = %request.model, temperature = request.temperature, "sending completion request");

        let response = self.build_request(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &error_text));
        }

        let response_text = response.text().await?;
        let parsed: GroqChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            UpstreamError::response_format(
                "valid chat completion response",
                format!("parse error: {e}, response: {response_text}"),
            )
        })?;

        Self::parse_response(parsed)
    }

    fn provider_name(&self) -> &'static str {
        Self::PROVIDER
    }
}
