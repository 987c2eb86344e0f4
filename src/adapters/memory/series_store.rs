//! In-Memory Series Store Adapter
//!
//! Holds canonical series and their observations in memory.
//! Useful for testing, previews against fixtures, and development.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::series::{LookbackWindow, Observation, SeriesDescriptor, SeriesSelector};
use crate::ports::{SeriesStore, SeriesStoreError};

#[derive(Debug, Clone)]
struct StoredSeries {
    descriptor: SeriesDescriptor,
    observations: Vec<Observation>,
}

/// In-memory series store.
///
/// Observations are returned exactly as inserted (unordered, possibly with
/// duplicate periods) so callers exercise their own normalization.
#[derive(Debug, Clone, Default)]
pub struct InMemorySeriesStore {
    series: Arc<RwLock<Vec<StoredSeries>>>,
    unavailable: Arc<RwLock<bool>>,
}

impl InMemorySeriesStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a series, replacing any existing series with the same slug.
    pub async fn insert(&self, descriptor: SeriesDescriptor, observations: Vec<Observation>) {
        let mut series = self.series.write().await;
        series.retain(|s| s.descriptor.slug != descriptor.slug);
        series.push(StoredSeries {
            descriptor,
            observations,
        });
    }

    /// Appends observations to an existing series (simulates ingestion).
    pub async fn append_observations(&self, slug: &str, observations: Vec<Observation>) -> bool {
        let mut series = self.series.write().await;
        match series.iter_mut().find(|s| s.descriptor.slug == slug) {
            Some(stored) => {
                stored.observations.extend(observations);
                true
            }
            None => false,
        }
    }

    /// Makes every call fail with `Unavailable` (for testing)
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Get the number of stored series
    pub async fn series_count(&self) -> usize {
        self.series.read().await.len()
    }

    async fn ensure_available(&self) -> Result<(), SeriesStoreError> {
        if *self.unavailable.read().await {
            return Err(SeriesStoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

fn matches_selector(descriptor: &SeriesDescriptor, selector: &SeriesSelector) -> bool {
    if descriptor.source != selector.source {
        return false;
    }
    let id = selector.source_series_id.trim();
    let id_matches =
        descriptor.series_id.eq_ignore_ascii_case(id) || descriptor.slug.eq_ignore_ascii_case(id);
    let dataset_matches = match (&selector.dataset_id, &descriptor.dataset_id) {
        (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
        (Some(_), None) => false,
        (None, _) => true,
    };
    id_matches && dataset_matches
}

#[async_trait]
impl SeriesStore for InMemorySeriesStore {
    async fn resolve_selector(
        &self,
        selector: &SeriesSelector,
    ) -> Result<Option<SeriesDescriptor>, SeriesStoreError> {
        self.ensure_available().await?;
        let series = self.series.read().await;
        Ok(series
            .iter()
            .find(|s| matches_selector(&s.descriptor, selector))
            .map(|s| s.descriptor.clone()))
    }

    async fn fetch_observations(
        &self,
        series: &SeriesDescriptor,
        window: &LookbackWindow,
    ) -> Result<Vec<Observation>, SeriesStoreError> {
        self.ensure_available().await?;
        let stored = self.series.read().await;
        let Some(found) = stored.iter().find(|s| s.descriptor.slug == series.slug) else {
            return Ok(Vec::new());
        };
        let observations = match *window {
            LookbackWindow::Range { start, end } => found
                .observations
                .iter()
                .filter(|o| o.period >= start && o.period <= end)
                .copied()
                .collect(),
            LookbackWindow::Periods { .. } => found.observations.clone(),
        };
        Ok(observations)
    }
}
