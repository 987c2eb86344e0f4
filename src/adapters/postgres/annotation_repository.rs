//! PostgreSQL implementation of AnnotationRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::briefing::{ChatMessage, ChatRole, Comment, CommentStatus};
use crate::domain::foundation::{
    BriefingId, ChatMessageId, CommentId, Timestamp, UserId, VersionId,
};
use crate::ports::{AnnotationError, AnnotationRepository};

/// PostgreSQL implementation of AnnotationRepository.
#[derive(Clone)]
pub struct PostgresAnnotationRepository {
    pool: PgPool,
}

impl PostgresAnnotationRepository {
    /// Creates a new PostgresAnnotationRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fails unless the version exists and belongs to the briefing.
    async fn ensure_version(
        &self,
        briefing_id: BriefingId,
        version_id: VersionId,
    ) -> Result<(), AnnotationError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM briefing_versions WHERE briefing_id = $1 AND id = $2",
        )
        .bind(briefing_id.as_uuid())
        .bind(version_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AnnotationError::Storage(format!("Failed to check version: {}", e)))?;

        if count == 0 {
            return Err(AnnotationError::UnknownVersion(version_id.to_string()));
        }
        Ok(())
    }
}

fn user_id(row: &PgRow) -> Result<UserId, AnnotationError> {
    let raw: String = row.get("created_by");
    UserId::new(raw).map_err(|e| AnnotationError::Storage(format!("Invalid stored user id: {}", e)))
}

fn row_to_chat(row: &PgRow) -> Result<ChatMessage, AnnotationError> {
    let role = match row.get::<String, _>("role").as_str() {
        "assistant" => ChatRole::Assistant,
        _ => ChatRole::User,
    };
    let version_id: Option<Uuid> = row.get("version_id");
    let created_at: DateTime<Utc> = row.get("created_at");

    Ok(ChatMessage {
        id: ChatMessageId::from_uuid(row.get("id")),
        briefing_id: BriefingId::from_uuid(row.get("briefing_id")),
        role,
        message: row.get("message"),
        version_id: version_id.map(VersionId::from_uuid),
        created_by: user_id(row)?,
        created_at: Timestamp::from_datetime(created_at),
    })
}

fn row_to_comment(row: &PgRow) -> Result<Comment, AnnotationError> {
    let status = match row.get::<String, _>("status").as_str() {
        "resolved" => CommentStatus::Resolved,
        _ => CommentStatus::Open,
    };
    let created_at: DateTime<Utc> = row.get("created_at");

    Ok(Comment {
        id: CommentId::from_uuid(row.get("id")),
        briefing_id: BriefingId::from_uuid(row.get("briefing_id")),
        version_id: VersionId::from_uuid(row.get("version_id")),
        anchor: row.get("anchor"),
        text: row.get("comment_text"),
        status,
        created_by: user_id(row)?,
        created_at: Timestamp::from_datetime(created_at),
    })
}

#[async_trait]
impl AnnotationRepository for PostgresAnnotationRepository {
    async fn append_chat(&self, message: &ChatMessage) -> Result<(), AnnotationError> {
        if let Some(version_id) = message.version_id {
            self.ensure_version(message.briefing_id, version_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO briefing_chat (id, briefing_id, role, message, version_id, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.briefing_id.as_uuid())
        .bind(message.role.as_str())
        .bind(&message.message)
        .bind(message.version_id.map(|id| *id.as_uuid()))
        .bind(message.created_by.as_str())
        .bind(message.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| AnnotationError::Storage(format!("Failed to insert chat message: {}", e)))?;

        Ok(())
    }

    async fn list_chat(&self, briefing_id: BriefingId) -> Result<Vec<ChatMessage>, AnnotationError> {
        let rows = sqlx::query(
            r#"
            SELECT id, briefing_id, role, message, version_id, created_by, created_at
            FROM briefing_chat
            WHERE briefing_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(briefing_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AnnotationError::Storage(format!("Failed to list chat: {}", e)))?;

        rows.iter().map(row_to_chat).collect()
    }

    async fn add_comment(&self, comment: &Comment) -> Result<(), AnnotationError> {
        self.ensure_version(comment.briefing_id, comment.version_id).await?;

        sqlx::query(
            r#"
            INSERT INTO briefing_comments (
                id, briefing_id, version_id, anchor, comment_text, status, created_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(comment.id.as_uuid())
        .bind(comment.briefing_id.as_uuid())
        .bind(comment.version_id.as_uuid())
        .bind(&comment.anchor)
        .bind(&comment.text)
        .bind(comment.status.as_str())
        .bind(comment.created_by.as_str())
        .bind(comment.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| AnnotationError::Storage(format!("Failed to insert comment: {}", e)))?;

        Ok(())
    }

    async fn list_comments(&self, briefing_id: BriefingId) -> Result<Vec<Comment>, AnnotationError> {
        let rows = sqlx::query(
            r#"
            SELECT id, briefing_id, version_id, anchor, comment_text, status, created_by, created_at
            FROM briefing_comments
            WHERE briefing_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(briefing_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AnnotationError::Storage(format!("Failed to list comments: {}", e)))?;

        rows.iter().map(row_to_comment).collect()
    }
}
