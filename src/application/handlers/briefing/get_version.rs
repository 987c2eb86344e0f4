//! GetVersionHandler - Query handler for a single immutable version.

use std::sync::Arc;

use crate::domain::briefing::{BriefingError, BriefingVersion};
use crate::domain::foundation::{BriefingId, CommandMetadata, VersionId};
use crate::ports::VersionStore;

/// Query for one version of a briefing.
#[derive(Debug, Clone, Copy)]
pub struct GetVersionQuery {
    pub briefing_id: BriefingId,
    pub version_id: VersionId,
}

/// Handler for loading versions.
pub struct GetVersionHandler {
    versions: Arc<dyn VersionStore>,
}

impl GetVersionHandler {
    pub fn new(versions: Arc<dyn VersionStore>) -> Self {
        Self { versions }
    }

    /// Fails with `VersionNotFound` when the version is absent or belongs
    /// to another briefing.
    pub async fn handle(
        &self,
        query: GetVersionQuery,
        _metadata: CommandMetadata,
    ) -> Result<BriefingVersion, BriefingError> {
        self.versions
            .get(query.briefing_id, query.version_id)
            .await?
            .ok_or(BriefingError::VersionNotFound {
                briefing_id: query.briefing_id,
                version_id: query.version_id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::version_store::test_support::{briefing, new_version};
    use crate::adapters::memory::InMemoryVersionStore;

    #[tokio::test]
    async fn loads_committed_version() {
        let store = InMemoryVersionStore::new();
        let b = briefing();
        let v1 = store.create(b.clone(), new_version(b.id, None)).await.unwrap();
        let handler = GetVersionHandler::new(Arc::new(store));

        let found = handler
            .handle(
                GetVersionQuery {
                    briefing_id: b.id,
                    version_id: v1.id,
                },
                CommandMetadata::test_fixture(),
            )
            .await
            .unwrap();

        assert_eq!(found, v1);
    }

    #[tokio::test]
    async fn version_of_other_briefing_is_not_found() {
        let store = InMemoryVersionStore::new();
        let a = briefing();
        let b = briefing();
        let v1 = store.create(a.clone(), new_version(a.id, None)).await.unwrap();
        store.create(b.clone(), new_version(b.id, None)).await.unwrap();
        let handler = GetVersionHandler::new(Arc::new(store));

        let result = handler
            .handle(
                GetVersionQuery {
                    briefing_id: b.id,
                    version_id: v1.id,
                },
                CommandMetadata::test_fixture(),
            )
            .await;

        assert_eq!(
            result,
            Err(BriefingError::VersionNotFound {
                briefing_id: b.id,
                version_id: v1.id
            })
        );
    }
}
