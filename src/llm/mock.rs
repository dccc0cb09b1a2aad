//! Mock text-generation backend for tests and offline development.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::traits::*;

/// Mock backend returning a canned response.
pub struct MockBackend {
    model_id: String,
    available: AtomicBool,
    response_content: String,
    call_count: AtomicU32,
}

impl MockBackend {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            available: AtomicBool::new(true),
            response_content: "Mock response".to_string(),
            call_count: AtomicU32::new(0),
        }
    }

    /// Set the response content.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.response_content = content.into();
        self
    }

    /// When unavailable every call fails with [`LlmError::Unavailable`].
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return Err(LlmError::Unavailable("Mock backend disabled".to_string()));
        }

        // Rough token estimate
        let prompt_tokens: u32 = request
            .messages
            .iter()
            .map(|m| m.content.len() as u32 / 4)
            .sum();

        Ok(CompletionResponse {
            content: self.response_content.clone(),
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens,
                completion_tokens: self.response_content.len() as u32 / 4,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend() {
        let backend = MockBackend::new("test-model").with_response("Hello, world!");
        assert_eq!(backend.call_count(), 0);

        let response = backend.complete(CompletionRequest::user("Hi")).await.unwrap();

        assert_eq!(response.content, "Hello, world!");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_unavailable() {
        let backend = MockBackend::new("test-model").with_available(false);
        let result = backend.complete(CompletionRequest::user("Hi")).await;
        assert!(matches!(result, Err(LlmError::Unavailable(_))));
        assert_eq!(backend.call_count(), 1);
    }
}
