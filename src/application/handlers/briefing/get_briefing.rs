//! GetBriefingHandler - Query handler for a briefing and its version chain.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::briefing::{Briefing, BriefingError, VersionSummary};
use crate::domain::foundation::{BriefingId, CommandMetadata};
use crate::ports::VersionStore;

/// Query for a briefing's detail view.
#[derive(Debug, Clone, Copy)]
pub struct GetBriefingQuery {
    pub briefing_id: BriefingId,
}

/// Briefing record plus ordered version summaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BriefingDetail {
    pub briefing: Briefing,
    pub versions: Vec<VersionSummary>,
}

impl BriefingDetail {
    /// Summary of the version the latest pointer names.
    pub fn latest(&self) -> Option<&VersionSummary> {
        let latest = self.briefing.latest_version_id?;
        self.versions.iter().find(|v| v.id == latest)
    }
}

/// Handler for briefing detail.
pub struct GetBriefingHandler {
    versions: Arc<dyn VersionStore>,
}

impl GetBriefingHandler {
    pub fn new(versions: Arc<dyn VersionStore>) -> Self {
        Self { versions }
    }

    pub async fn handle(
        &self,
        query: GetBriefingQuery,
        _metadata: CommandMetadata,
    ) -> Result<BriefingDetail, BriefingError> {
        let briefing = self
            .versions
            .get_briefing(query.briefing_id)
            .await?
            .ok_or(BriefingError::BriefingNotFound(query.briefing_id))?;
        let versions = self.versions.list(query.briefing_id).await?;
        Ok(BriefingDetail { briefing, versions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::version_store::test_support::{briefing, new_version};
    use crate::adapters::memory::InMemoryVersionStore;

    #[tokio::test]
    async fn latest_is_highest_version() {
        let store = InMemoryVersionStore::new();
        let b = briefing();
        let v1 = store.create(b.clone(), new_version(b.id, None)).await.unwrap();
        let v2 = store.commit(new_version(b.id, Some(v1.id))).await.unwrap();
        let handler = GetBriefingHandler::new(Arc::new(store));

        let detail = handler
            .handle(GetBriefingQuery { briefing_id: b.id }, CommandMetadata::test_fixture())
            .await
            .unwrap();

        assert_eq!(detail.versions.len(), 2);
        assert_eq!(detail.latest().map(|v| v.id), Some(v2.id));
        assert_eq!(detail.latest().map(|v| v.version_number), Some(2));
    }

    #[tokio::test]
    async fn unknown_briefing_is_not_found() {
        let handler = GetBriefingHandler::new(Arc::new(InMemoryVersionStore::new()));
        let id = BriefingId::new();

        let result = handler
            .handle(GetBriefingQuery { briefing_id: id }, CommandMetadata::test_fixture())
            .await;

        assert_eq!(result, Err(BriefingError::BriefingNotFound(id)));
    }
}
