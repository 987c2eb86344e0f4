//! Scripted Briefing Generator
//!
//! Deterministic stand-in for the generation capability. Replies are
//! consumed in order; once the script runs out every call reports
//! `Unavailable`. Useful for tests and for running without credentials.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::ports::{BriefingGenerator, GeneratedDraft, GenerationError, GenerationRequest};

/// Generator that replays a fixed script.
#[derive(Debug, Default)]
pub struct ScriptedBriefingGenerator {
    script: Mutex<VecDeque<Result<GeneratedDraft, GenerationError>>>,
    delay: Duration,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBriefingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a draft.
    pub fn with_draft(mut self, draft: GeneratedDraft) -> Self {
        self.script.get_mut().push_back(Ok(draft));
        self
    }

    /// Queues a draft built from raw content.
    pub fn with_content(self, content: Value) -> Self {
        self.with_draft(GeneratedDraft::new(content))
    }

    /// Queues a failure.
    pub fn with_error(mut self, error: GenerationError) -> Self {
        self.script.get_mut().push_back(Err(error));
        self
    }

    /// Delays every reply, for exercising timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues a draft on a generator already shared behind an `Arc`.
    pub async fn push(&self, reply: Result<GeneratedDraft, GenerationError>) {
        self.script.lock().await.push_back(reply);
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Requests received so far, in order.
    pub async fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl BriefingGenerator for ScriptedBriefingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDraft, GenerationError> {
        self.calls.lock().await.push(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Unavailable("script exhausted".to_string())))
    }
}
