//! Series Store Port - Read access to persisted economic observations.
//!
//! The store is owned by the ingestion side of the system. This core only
//! resolves selectors to canonical series and reads their observations.

use async_trait::async_trait;

use crate::domain::series::{LookbackWindow, Observation, SeriesDescriptor, SeriesSelector};

/// Read-only access to canonical series and their observations.
#[async_trait]
pub trait SeriesStore: Send + Sync {
    /// Resolves a selector to its canonical series.
    ///
    /// Returns `Ok(None)` when nothing matches.
    async fn resolve_selector(
        &self,
        selector: &SeriesSelector,
    ) -> Result<Option<SeriesDescriptor>, SeriesStoreError>;

    /// Fetches observations for a resolved series within a window.
    ///
    /// Implementations may return observations in any order and may include
    /// duplicate periods; callers normalize the result.
    async fn fetch_observations(
        &self,
        series: &SeriesDescriptor,
        window: &LookbackWindow,
    ) -> Result<Vec<Observation>, SeriesStoreError>;
}

/// Series store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesStoreError {
    #[error("series store unavailable: {0}")]
    Unavailable(String),

    #[error("series store query failed: {0}")]
    Query(String),
}
