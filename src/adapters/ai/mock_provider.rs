//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing the LLM briefing generator to be tested without calling real
//! AI APIs.
//!
//! # Features
//!
//! - Pre-configured responses consumed in order
//! - Simulated delays for timeout testing
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! # Panics
//!
//! Methods panic if the internal locks are poisoned. This adapter is for
//! tests and local development only.
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response(r#"{"sections": []}"#)
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = provider.complete(request).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

/// Mock AI provider for testing.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<Result<String, AIError>>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1", 128_000),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(Ok(content.into()));
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: AIError) -> Self {
        self.push(Err(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("MockAIProvider: calls lock poisoned").len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.calls
            .lock()
            .expect("MockAIProvider: calls lock poisoned")
            .clone()
    }

    fn push(&self, response: Result<String, AIError>) {
        self.responses
            .lock()
            .expect("MockAIProvider: responses lock poisoned")
            .push_back(response);
    }

    /// Gets the next response, or an `Unavailable` error once the queue is empty.
    fn next_response(&self) -> Result<String, AIError> {
        self.responses
            .lock()
            .expect("MockAIProvider: responses lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(AIError::unavailable("no mock response queued")))
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        self.calls
            .lock()
            .expect("MockAIProvider: calls lock poisoned")
            .push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let content = self.next_response()?;
        Ok(CompletionResponse {
            content,
            usage: TokenUsage::new(10, 20),
            model: self.info.model.clone(),
            finish_reason: FinishReason::Stop,
        })
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use crate::ports::{MessageRole, RequestMetadata};
    use std::time::Instant;

    fn request() -> CompletionRequest {
        CompletionRequest::new(RequestMetadata::new(UserId::system(), "trace"))
            .with_message(MessageRole::User, "Draft")
    }

    #[tokio::test]
    async fn responses_are_consumed_in_order() {
        let provider = MockAIProvider::new()
            .with_response("first")
            .with_error(AIError::rate_limited(1))
            .with_response("third");

        assert_eq!(provider.complete(request()).await.unwrap().content, "first");
        assert!(matches!(
            provider.complete(request()).await,
            Err(AIError::RateLimited { .. })
        ));
        assert_eq!(provider.complete(request()).await.unwrap().content, "third");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn empty_queue_reports_unavailable() {
        let provider = MockAIProvider::new();
        let result = provider.complete(request()).await;
        assert!(matches!(result, Err(AIError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn delay_is_applied() {
        let provider = MockAIProvider::new()
            .with_response("slow")
            .with_delay(Duration::from_millis(30));

        let start = Instant::now();
        provider.complete(request()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn calls_are_recorded() {
        let provider = MockAIProvider::new().with_response("ok");
        provider.complete(request()).await.unwrap();

        let calls = provider.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].messages[0].content, "Draft");
        assert_eq!(provider.provider_info().name, "mock");
    }
}
