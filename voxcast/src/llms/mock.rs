//! Mock completion provider for testing.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::UpstreamError;

use super::{CompletionProvider, CompletionRequest};

/// A completion provider that replays predefined responses.
///
/// Responses are returned in sequence, cycling when exhausted. Every request
/// is recorded so tests can inspect the rendered prompt.
///
/// # Example
///
/// ```rust,ignore
/// let llm = MockCompletion::new(vec![Ok("Hello!".to_owned())]);
/// ```
#[derive(Debug)]
pub struct MockCompletion {
    responses: Vec<Result<String, UpstreamError>>,
    index: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    /// Create a mock with predefined results.
    #[must_use]
    pub fn new(responses: Vec<Result<String, UpstreamError>>) -> Self {
        Self {
            responses,
            index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always answers with `text`.
    #[must_use]
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    /// Create a mock that always fails with `error`.
    #[must_use]
    pub fn failing(error: UpstreamError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for MockCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, UpstreamError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let index = self.index.fetch_add(1, Ordering::SeqCst);
        if self.responses.is_empty() {
            return Err(UpstreamError::internal("mock has no responses"));
        }
        self.responses[index % self.responses.len()].clone()
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cycles_responses_and_records_requests() {
        let llm = MockCompletion::new(vec![Ok("first".to_owned()), Ok("second".to_owned())]);
        let request = CompletionRequest::new("m", "p");

        assert_eq!(llm.complete(&request).await.unwrap(), "first");
        assert_eq!(llm.complete(&request).await.unwrap(), "second");
        assert_eq!(llm.complete(&request).await.unwrap(), "first");
        assert_eq!(llm.calls(), 3);
        assert_eq!(llm.requests()[0].prompt, "p");
    }

    #[tokio::test]
    async fn test_failing_mock_returns_error() {
        let llm = MockCompletion::failing(UpstreamError::auth("mock", "bad key"));
        let err = llm.complete(&CompletionRequest::new("m", "p")).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Auth { .. }));
    }
}
