//! Chat log entries and reviewer comments attached to versions.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    BriefingId, ChatMessageId, CommentId, Timestamp, UserId, ValidationError, VersionId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One turn of the chat that drives edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub briefing_id: BriefingId,
    pub role: ChatRole,
    pub message: String,
    /// Version the message refers to: the target for user turns, the
    /// resulting version for assistant turns.
    pub version_id: Option<VersionId>,
    pub created_by: UserId,
    pub created_at: Timestamp,
}

impl ChatMessage {
    pub fn user(briefing_id: BriefingId, message: impl Into<String>, version_id: Option<VersionId>, created_by: UserId) -> Self {
        Self::new(briefing_id, ChatRole::User, message, version_id, created_by)
    }

    pub fn assistant(briefing_id: BriefingId, message: impl Into<String>, version_id: VersionId) -> Self {
        Self::new(
            briefing_id,
            ChatRole::Assistant,
            message,
            Some(version_id),
            UserId::system(),
        )
    }

    fn new(
        briefing_id: BriefingId,
        role: ChatRole,
        message: impl Into<String>,
        version_id: Option<VersionId>,
        created_by: UserId,
    ) -> Self {
        Self {
            id: ChatMessageId::new(),
            briefing_id,
            role,
            message: message.into(),
            version_id,
            created_by,
            created_at: Timestamp::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Open,
    Resolved,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Open => "open",
            CommentStatus::Resolved => "resolved",
        }
    }
}

/// Reviewer comment anchored to part of a specific version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub briefing_id: BriefingId,
    pub version_id: VersionId,
    /// Location in the document, typically a section or block id.
    pub anchor: String,
    pub text: String,
    pub status: CommentStatus,
    pub created_by: UserId,
    pub created_at: Timestamp,
}

impl Comment {
    /// Creates an open comment, rejecting blank anchor or text.
    pub fn new(
        briefing_id: BriefingId,
        version_id: VersionId,
        anchor: impl Into<String>,
        text: impl Into<String>,
        created_by: UserId,
    ) -> Result<Self, ValidationError> {
        let anchor = anchor.into();
        let text = text.into();
        if anchor.trim().is_empty() {
            return Err(ValidationError::empty_field("anchor"));
        }
        if text.trim().is_empty() {
            return Err(ValidationError::empty_field("comment_text"));
        }
        Ok(Self {
            id: CommentId::new(),
            briefing_id,
            version_id,
            anchor,
            text,
            status: CommentStatus::Open,
            created_by,
            created_at: Timestamp::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_requires_anchor_and_text() {
        let b = BriefingId::new();
        let v = VersionId::new();
        assert!(Comment::new(b, v, "", "hi", UserId::system()).is_err());
        assert!(Comment::new(b, v, "summary", " ", UserId::system()).is_err());

        let comment = Comment::new(b, v, "summary", "Check the base year", UserId::system()).unwrap();
        assert_eq!(comment.status, CommentStatus::Open);
    }

    #[test]
    fn assistant_messages_are_system_authored() {
        let msg = ChatMessage::assistant(BriefingId::new(), "Shortened", VersionId::new());
        assert_eq!(msg.role, ChatRole::Assistant);
        assert_eq!(msg.created_by, UserId::system());
        assert!(msg.version_id.is_some());
    }
}
