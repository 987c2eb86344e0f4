//! ListCommentsHandler - Query handler for reviewer comments.

use std::sync::Arc;

use crate::domain::briefing::{BriefingError, Comment};
use crate::domain::foundation::{BriefingId, CommandMetadata};
use crate::ports::{AnnotationRepository, VersionStore};

#[derive(Debug, Clone, Copy)]
pub struct ListCommentsQuery {
    pub briefing_id: BriefingId,
}

pub struct ListCommentsHandler {
    versions: Arc<dyn VersionStore>,
    annotations: Arc<dyn AnnotationRepository>,
}

impl ListCommentsHandler {
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
        query: ListCommentsQuery,
        _metadata: CommandMetadata,
    ) -> Result<Vec<Comment>, BriefingError> {
        if self.versions.get_briefing(query.briefing_id).await?.is_none() {
            return Err(BriefingError::BriefingNotFound(query.briefing_id));
        }
        Ok(self.annotations.list_comments(query.briefing_id).await?)
    }
}
