//! AddCommentHandler - Command handler for reviewer comments.
//!
//! A comment is pinned to one immutable version of one briefing; the
//! version must exist before the comment is stored.

use std::sync::Arc;

use crate::domain::briefing::{BriefingError, Comment};
use crate::domain::foundation::{BriefingId, CommandMetadata, VersionId};
use crate::ports::{AnnotationError, AnnotationRepository, VersionStore};

/// Command to comment on a version.
#[derive(Debug, Clone)]
pub struct AddCommentCommand {
    pub briefing_id: BriefingId,
    pub version_id: VersionId,
    /// Location in the document, e.g. a section or block id.
    pub anchor: String,
    pub text: String,
}

/// Handler for adding comments.
pub struct AddCommentHandler {
    versions: Arc<dyn VersionStore>,
    annotations: Arc<dyn AnnotationRepository>,
}

impl AddCommentHandler {
    pub fn new(
        versions: Arc<dyn VersionStore>,
        annotations: Arc<dyn AnnotationRepository>,
    ) -> Self {
        Self {
            versions,
            annotations,
        }
    }

    pub async fn handle(
        &self,
        cmd: AddCommentCommand,
        metadata: CommandMetadata,
    ) -> Result<Comment, BriefingError> {
        let not_found = BriefingError::VersionNotFound {
            briefing_id: cmd.briefing_id,
            version_id: cmd.version_id,
        };

        // 1. Validate
        let comment = Comment::new(
            cmd.briefing_id,
            cmd.version_id,
            cmd.anchor,
            cmd.text,
            metadata.user_id.clone(),
        )?;

        // 2. Version must belong to the briefing
        if self
            .versions
            .get(cmd.briefing_id, cmd.version_id)
            .await?
            .is_none()
        {
            return Err(not_found);
        }

        // 3. Persist
        match self.annotations.add_comment(&comment).await {
            Ok(()) => Ok(comment),
            Err(AnnotationError::UnknownVersion(_)) => Err(not_found),
            Err(err) => Err(err.into()),
        }
    }
}
