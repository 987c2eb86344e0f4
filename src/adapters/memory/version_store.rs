//! In-Memory Version Store Adapter
//!
//! Versions live in an arena keyed by id; each briefing keeps only an
//! ordered index of its version ids. The number assignment, insert and
//! latest-pointer update happen under one write lock, so concurrent commits
//! are serialized without holding anything across generation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::briefing::{Briefing, BriefingVersion, NewVersion, VersionSummary};
use crate::domain::foundation::{BriefingId, Timestamp, VersionId};
use crate::ports::{VersionStore, VersionStoreError};

#[derive(Debug)]
struct BriefingRecord {
    briefing: Briefing,
    /// Version ids in version-number order; index `i` holds number `i + 1`.
    chain: Vec<VersionId>,
}

#[derive(Debug, Default)]
struct Inner {
    briefings: HashMap<BriefingId, BriefingRecord>,
    versions: HashMap<VersionId, Arc<BriefingVersion>>,
    /// Commits left to fail with `Conflict` (for testing retries).
    injected_conflicts: u32,
}

impl Inner {
    fn append(
        &mut self,
        new: NewVersion,
    ) -> Result<BriefingVersion, VersionStoreError> {
        let briefing_id = new.briefing_id;
        let Some(record) = self.briefings.get_mut(&briefing_id) else {
            return Err(VersionStoreError::BriefingNotFound(briefing_id));
        };
        if self.versions.contains_key(&new.id) {
            return Err(VersionStoreError::Storage(format!(
                "version id {} already stored",
                new.id
            )));
        }

        let number = record.chain.len() as u32 + 1;
        let version = BriefingVersion::seal(new, number, Timestamp::now());

        record.chain.push(version.id);
        record.briefing.advance(&version);
        self.versions.insert(version.id, Arc::new(version.clone()));
        Ok(version)
    }
}

/// In-memory version store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVersionStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryVersionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` commits fail with `Conflict` (for testing)
    pub async fn inject_conflicts(&self, count: u32) {
        self.inner.write().await.injected_conflicts = count;
    }

    /// True when the version exists and belongs to the briefing.
    pub async fn contains(&self, briefing_id: BriefingId, version_id: VersionId) -> bool {
        let inner = self.inner.read().await;
        inner
            .versions
            .get(&version_id)
            .map(|v| v.briefing_id == briefing_id)
            .unwrap_or(false)
    }

    /// Get the total number of stored versions
    pub async fn version_count(&self) -> usize {
        self.inner.read().await.versions.len()
    }

    /// Get the number of stored briefings
    pub async fn briefing_count(&self) -> usize {
        self.inner.read().await.briefings.len()
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn create(
        &self,
        briefing: Briefing,
        first: NewVersion,
    ) -> Result<BriefingVersion, VersionStoreError> {
        let mut inner = self.inner.write().await;
        let id = briefing.id;
        if inner.briefings.contains_key(&id) {
            return Err(VersionStoreError::BriefingExists(id));
        }
        if first.briefing_id != id {
            return Err(VersionStoreError::Storage(format!(
                "first version belongs to {}, not {}",
                first.briefing_id, id
            )));
        }

        inner.briefings.insert(
            id,
            BriefingRecord {
                briefing,
                chain: Vec::new(),
            },
        );
        match inner.append(first) {
            Ok(version) => Ok(version),
            Err(e) => {
                inner.briefings.remove(&id);
                Err(e)
            }
        }
    }

    async fn commit(&self, version: NewVersion) -> Result<BriefingVersion, VersionStoreError> {
        let mut inner = self.inner.write().await;
        if inner.injected_conflicts > 0 {
            inner.injected_conflicts -= 1;
            return Err(VersionStoreError::Conflict(version.briefing_id));
        }
        inner.append(version)
    }

    async fn get_briefing(&self, id: BriefingId) -> Result<Option<Briefing>, VersionStoreError> {
        let inner = self.inner.read().await;
        Ok(inner.briefings.get(&id).map(|r| r.briefing.clone()))
    }

    async fn get(
        &self,
        briefing_id: BriefingId,
        version_id: VersionId,
    ) -> Result<Option<BriefingVersion>, VersionStoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .versions
            .get(&version_id)
            .filter(|v| v.briefing_id == briefing_id)
            .map(|v| v.as_ref().clone()))
    }

    async fn list(&self, briefing_id: BriefingId) -> Result<Vec<VersionSummary>, VersionStoreError> {
        let inner = self.inner.read().await;
        let Some(record) = inner.briefings.get(&briefing_id) else {
            return Ok(Vec::new());
        };
        Ok(record
            .chain
            .iter()
            .filter_map(|id| inner.versions.get(id))
            .map(|v| v.summary())
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::briefing::{
        BriefingContent, BriefingOptions, InputSpec, QualityBanner,
    };
    use crate::domain::data_pack::test_support::{monthly_series, pack_of};
    use crate::domain::foundation::UserId;
    use crate::domain::series::{SeriesSelector, SeriesSource};

    pub fn new_version(briefing_id: BriefingId, parent: Option<VersionId>) -> NewVersion {
        NewVersion {
            id: VersionId::new(),
            briefing_id,
            parent_version_id: parent,
            input_spec: InputSpec::create(
                "inflation",
                "Summarise",
                vec![SeriesSelector::new(SeriesSource::Ons, "L522")],
                BriefingOptions::default(),
            ),
            data_pack: pack_of(vec![monthly_series("cpi", &[Some(1.0)])]),
            content: BriefingContent::default(),
            banner: QualityBanner::from_checks(Vec::new()),
            change_summary: None,
            fallback_used: false,
            created_by: UserId::system(),
        }
    }

    pub fn briefing() -> Briefing {
        Briefing::new(BriefingId::new(), "Inflation briefing", "inflation", UserId::system())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn create_assigns_version_one_and_latest_pointer() {
        let store = InMemoryVersionStore::new();
        let b = briefing();

        let v1 = store.create(b.clone(), new_version(b.id, None)).await.unwrap();

        assert_eq!(v1.version_number, 1);
        let stored = store.get_briefing(b.id).await.unwrap().unwrap();
        assert_eq!(stored.latest_version_id, Some(v1.id));
    }

    #[tokio::test]
    async fn create_twice_is_rejected() {
        let store = InMemoryVersionStore::new();
        let b = briefing();
        store.create(b.clone(), new_version(b.id, None)).await.unwrap();

        let again = store.create(b.clone(), new_version(b.id, None)).await;

        assert_eq!(again, Err(VersionStoreError::BriefingExists(b.id)));
        assert_eq!(store.version_count().await, 1);
    }

    #[tokio::test]
    async fn commit_to_unknown_briefing_fails() {
        let store = InMemoryVersionStore::new();
        let id = BriefingId::new();

        let result = store.commit(new_version(id, None)).await;

        assert_eq!(result, Err(VersionStoreError::BriefingNotFound(id)));
    }

    #[tokio::test]
    async fn get_checks_briefing_ownership() {
        let store = InMemoryVersionStore::new();
        let a = briefing();
        let b = briefing();
        let va = store.create(a.clone(), new_version(a.id, None)).await.unwrap();
        store.create(b.clone(), new_version(b.id, None)).await.unwrap();

        assert!(store.get(a.id, va.id).await.unwrap().is_some());
        assert!(store.get(b.id, va.id).await.unwrap().is_none());
        assert!(store.contains(a.id, va.id).await);
        assert!(!store.contains(b.id, va.id).await);
    }

    #[tokio::test]
    async fn list_is_ascending_and_restartable() {
        let store = InMemoryVersionStore::new();
        let b = briefing();
        let v1 = store.create(b.clone(), new_version(b.id, None)).await.unwrap();
        store.commit(new_version(b.id, Some(v1.id))).await.unwrap();
        store.commit(new_version(b.id, Some(v1.id))).await.unwrap();

        let first = store.list(b.id).await.unwrap();
        let second = store.list(b.id).await.unwrap();

        let numbers: Vec<_> = first.iter().map(|s| s.version_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn injected_conflict_fails_once_without_writing() {
        let store = InMemoryVersionStore::new();
        let b = briefing();
        let v1 = store.create(b.clone(), new_version(b.id, None)).await.unwrap();
        store.inject_conflicts(1).await;

        let candidate = new_version(b.id, Some(v1.id));
        let first = store.commit(candidate.clone()).await;
        let second = store.commit(candidate).await.unwrap();

        assert_eq!(first, Err(VersionStoreError::Conflict(b.id)));
        assert_eq!(second.version_number, 2);
        assert_eq!(store.version_count().await, 2);
    }

    proptest! {
        #[test]
        fn concurrent_commits_are_gapless(commits in 1usize..12) {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(4)
                .build()
                .unwrap();
            rt.block_on(async {
                let store = InMemoryVersionStore::new();
                let b = briefing();
                let v1 = store.create(b.clone(), new_version(b.id, None)).await.unwrap();

                let handles: Vec<_> = (0..commits)
                    .map(|_| {
                        let store = store.clone();
                        let candidate = new_version(b.id, Some(v1.id));
                        tokio::spawn(async move { store.commit(candidate).await })
                    })
                    .collect();
                for handle in handles {
                    handle.await.unwrap().unwrap();
                }

                let summaries = store.list(b.id).await.unwrap();
                let numbers: Vec<u32> = summaries.iter().map(|s| s.version_number).collect();
                let expected: Vec<u32> = (1..=commits as u32 + 1).collect();
                assert_eq!(numbers, expected);

                let latest = store.get_briefing(b.id).await.unwrap().unwrap().latest_version_id;
                assert_eq!(latest, summaries.last().map(|s| s.id));
            });
        }
    }
}
