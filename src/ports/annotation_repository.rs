//! Annotation Repository Port - Chat log and reviewer comments.
//!
//! Both kinds of record reference versions by id. Implementations must only
//! accept references to versions that exist for the same briefing.

use async_trait::async_trait;

use crate::domain::briefing::{ChatMessage, Comment};
use crate::domain::foundation::BriefingId;

/// Storage for chat messages and comments.
#[async_trait]
pub trait AnnotationRepository: Send + Sync {
    /// Appends a chat message.
    async fn append_chat(&self, message: &ChatMessage) -> Result<(), AnnotationError>;

    /// Lists chat messages in creation order.
    async fn list_chat(&self, briefing_id: BriefingId) -> Result<Vec<ChatMessage>, AnnotationError>;

    /// Stores a comment.
    async fn add_comment(&self, comment: &Comment) -> Result<(), AnnotationError>;

    /// Lists comments in creation order.
    async fn list_comments(&self, briefing_id: BriefingId) -> Result<Vec<Comment>, AnnotationError>;
}

/// Annotation repository errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationError {
    #[error("referenced version does not exist for this briefing: {0}")]
    UnknownVersion(String),

    #[error("storage error: {0}")]
    Storage(String),
}
