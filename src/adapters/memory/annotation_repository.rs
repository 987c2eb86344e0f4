//! In-Memory Annotation Repository Adapter
//!
//! Keeps chat messages and comments in insertion order and checks version
//! references against an in-memory version store.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::InMemoryVersionStore;
use crate::domain::briefing::{ChatMessage, Comment};
use crate::domain::foundation::BriefingId;
use crate::ports::{AnnotationError, AnnotationRepository};

/// In-memory chat and comment storage.
#[derive(Debug, Clone)]
pub struct InMemoryAnnotationRepository {
    versions: InMemoryVersionStore,
    chat: Arc<RwLock<Vec<ChatMessage>>>,
    comments: Arc<RwLock<Vec<Comment>>>,
}

impl InMemoryAnnotationRepository {
    /// Create a repository validating against `versions`
    pub fn new(versions: InMemoryVersionStore) -> Self {
        Self {
            versions,
            chat: Arc::new(RwLock::new(Vec::new())),
            comments: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl AnnotationRepository for InMemoryAnnotationRepository {
    async fn append_chat(&self, message: &ChatMessage) -> Result<(), AnnotationError> {
        if let Some(version_id) = message.version_id {
            if !self.versions.contains(message.briefing_id, version_id).await {
                return Err(AnnotationError::UnknownVersion(version_id.to_string()));
            }
        }
        self.chat.write().await.push(message.clone());
        Ok(())
    }

    async fn list_chat(&self, briefing_id: BriefingId) -> Result<Vec<ChatMessage>, AnnotationError> {
        let chat = self.chat.read().await;
        Ok(chat
            .iter()
            .filter(|m| m.briefing_id == briefing_id)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, comment: &Comment) -> Result<(), AnnotationError> {
        if !self.versions.contains(comment.briefing_id, comment.version_id).await {
            return Err(AnnotationError::UnknownVersion(comment.version_id.to_string()));
        }
        self.comments.write().await.push(comment.clone());
        Ok(())
    }

    async fn list_comments(&self, briefing_id: BriefingId) -> Result<Vec<Comment>, AnnotationError> {
        let comments = self.comments.read().await;
        Ok(comments
            .iter()
            .filter(|c| c.briefing_id == briefing_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::version_store::test_support::{briefing, new_version};
    use crate::domain::foundation::{UserId, VersionId};
    use crate::ports::VersionStore;

    #[tokio::test]
    async fn comment_on_existing_version_is_stored() {
        let versions = InMemoryVersionStore::new();
        let b = briefing();
        let v1 = versions.create(b.clone(), new_version(b.id, None)).await.unwrap();
        let repo = InMemoryAnnotationRepository::new(versions);

        let comment = Comment::new(b.id, v1.id, "summary", "Cite the base year", UserId::system()).unwrap();
        repo.add_comment(&comment).await.unwrap();

        assert_eq!(repo.list_comments(b.id).await.unwrap(), vec![comment]);
    }

    #[tokio::test]
    async fn comment_on_unknown_version_is_rejected() {
        let versions = InMemoryVersionStore::new();
        let b = briefing();
        versions.create(b.clone(), new_version(b.id, None)).await.unwrap();
        let repo = InMemoryAnnotationRepository::new(versions);

        let comment = Comment::new(b.id, VersionId::new(), "summary", "?", UserId::system()).unwrap();
        let result = repo.add_comment(&comment).await;

        assert!(matches!(result, Err(AnnotationError::UnknownVersion(_))));
        assert!(repo.list_comments(b.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_is_listed_in_order_per_briefing() {
        let versions = InMemoryVersionStore::new();
        let b = briefing();
        let v1 = versions.create(b.clone(), new_version(b.id, None)).await.unwrap();
        let repo = InMemoryAnnotationRepository::new(versions);

        repo.append_chat(&ChatMessage::user(b.id, "Draft", None, UserId::system())).await.unwrap();
        repo.append_chat(&ChatMessage::assistant(b.id, "Created", v1.id)).await.unwrap();
        repo.append_chat(&ChatMessage::user(BriefingId::new(), "Other", None, UserId::system()))
            .await
            .unwrap();

        let messages: Vec<_> = repo
            .list_chat(b.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.message)
            .collect();
        assert_eq!(messages, vec!["Draft", "Created"]);
    }
}
