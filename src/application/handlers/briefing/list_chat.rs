//! ListChatHandler - Query handler for a briefing's chat log.

use std::sync::Arc;

use crate::domain::briefing::{BriefingError, ChatMessage};
use crate::domain::foundation::{BriefingId, CommandMetadata};
use crate::ports::{AnnotationRepository, VersionStore};

#[derive(Debug, Clone, Copy)]
pub struct ListChatQuery {
    pub briefing_id: BriefingId,
}

/// Handler for listing chat messages in creation order.
pub struct ListChatHandler {
    versions: Arc<dyn VersionStore>,
    annotations: Arc<dyn AnnotationRepository>,
}

impl ListChatHandler {
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
        query: ListChatQuery,
        _metadata: CommandMetadata,
    ) -> Result<Vec<ChatMessage>, BriefingError> {
        if self.versions.get_briefing(query.briefing_id).await?.is_none() {
            return Err(BriefingError::BriefingNotFound(query.briefing_id));
        }
        Ok(self.annotations.list_chat(query.briefing_id).await?)
    }
}
