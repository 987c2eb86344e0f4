//! Caching Briefing Generator
//!
//! Wraps another generator and reuses its successful drafts for identical
//! requests within a TTL. Requests are keyed by
//! [`GenerationRequest::fingerprint`], which covers mode, instruction,
//! options, pack hash, prior content and any corrective note.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::ports::{BriefingGenerator, GeneratedDraft, GenerationError, GenerationRequest};

#[derive(Debug, Clone)]
struct CacheEntry {
    draft: GeneratedDraft,
    stored_at: Instant,
}

/// TTL + capacity bounded cache in front of a generator.
pub struct CachingGenerator {
    inner: Arc<dyn BriefingGenerator>,
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CachingGenerator {
    pub fn new(inner: Arc<dyn BriefingGenerator>, ttl: Duration, capacity: usize) -> Self {
        Self {
            inner,
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| now.duration_since(e.stored_at) < self.ttl)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn lookup(&self, key: &str) -> Option<GeneratedDraft> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() < self.ttl {
            return Some(entry.draft.clone());
        }
        entries.remove(key);
        None
    }

    async fn store(&self, key: String, draft: GeneratedDraft) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().await;
        let ttl = self.ttl;
        entries.retain(|_, e| e.stored_at.elapsed() < ttl);

        while entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.stored_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                }
                None => break,
            }
        }

        entries.insert(
            key,
            CacheEntry {
                draft,
                stored_at: Instant::now(),
            },
        );
    }
}

#[async_trait]
impl BriefingGenerator for CachingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDraft, GenerationError> {
        let key = request.fingerprint();
        if let Some(draft) = self.lookup(&key).await {
            tracing::debug!(mode = request.mode.as_str(), "Generation cache hit");
            return Ok(draft);
        }

        let draft = self.inner.generate(request).await?;
        self.store(key, draft.clone()).await;
        Ok(draft)
    }
}
