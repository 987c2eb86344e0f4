//! ListVersionsHandler - Query handler for a briefing's version chain.

use std::sync::Arc;

use crate::domain::briefing::{BriefingError, VersionSummary};
use crate::domain::foundation::{BriefingId, CommandMetadata};
use crate::ports::VersionStore;

/// Query for version summaries of a briefing.
#[derive(Debug, Clone, Copy)]
pub struct ListVersionsQuery {
    pub briefing_id: BriefingId,
}

/// Handler for listing versions, ascending by version number.
pub struct ListVersionsHandler {
    versions: Arc<dyn VersionStore>,
}

impl ListVersionsHandler {
    pub fn new(versions: Arc<dyn VersionStore>) -> Self {
        Self { versions }
    }

    pub async fn handle(
        &self,
        query: ListVersionsQuery,
        _metadata: CommandMetadata,
    ) -> Result<Vec<VersionSummary>, BriefingError> {
        if self.versions.get_briefing(query.briefing_id).await?.is_none() {
            return Err(BriefingError::BriefingNotFound(query.briefing_id));
        }
        Ok(self.versions.list(query.briefing_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::version_store::test_support::{briefing, new_version};
    use crate::adapters::memory::InMemoryVersionStore;

    #[tokio::test]
    async fn lists_ascending() {
        let store = InMemoryVersionStore::new();
        let b = briefing();
        let v1 = store.create(b.clone(), new_version(b.id, None)).await.unwrap();
        store.commit(new_version(b.id, Some(v1.id))).await.unwrap();
        store.commit(new_version(b.id, Some(v1.id))).await.unwrap();
        let handler = ListVersionsHandler::new(Arc::new(store));

        let summaries = handler
            .handle(ListVersionsQuery { briefing_id: b.id }, CommandMetadata::test_fixture())
            .await
            .unwrap();

        let numbers: Vec<u32> = summaries.iter().map(|s| s.version_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn unknown_briefing_is_not_found() {
        let handler = ListVersionsHandler::new(Arc::new(InMemoryVersionStore::new()));
        let id = BriefingId::new();

        let result = handler
            .handle(ListVersionsQuery { briefing_id: id }, CommandMetadata::test_fixture())
            .await;

        assert_eq!(result, Err(BriefingError::BriefingNotFound(id)));
    }
}
