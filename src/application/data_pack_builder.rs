//! DataPackBuilder - resolves selectors and bundles grounding data.
//!
//! Read-only against the series store. Selectors are resolved and fetched
//! concurrently; the assembled pack depends only on the selectors, the
//! options and the store contents, never on fetch timing.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{join_all, try_join_all};

use crate::domain::briefing::{BriefingError, BriefingOptions};
use crate::domain::data_pack::{DataPack, FreshnessTolerance, PackedSeries, SeriesMetadata};
use crate::domain::foundation::ValidationError;
use crate::domain::series::{SeriesDescriptor, SeriesSelector};
use crate::ports::{SeriesStore, SeriesStoreError};

impl From<SeriesStoreError> for BriefingError {
    fn from(err: SeriesStoreError) -> Self {
        BriefingError::Storage(err.to_string())
    }
}

/// Builds reproducible data packs from series selectors.
#[derive(Clone)]
pub struct DataPackBuilder {
    store: Arc<dyn SeriesStore>,
    tolerance: FreshnessTolerance,
}

impl DataPackBuilder {
    pub fn new(store: Arc<dyn SeriesStore>) -> Self {
        Self {
            store,
            tolerance: FreshnessTolerance::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: FreshnessTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Resolves every selector and assembles the pack.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for an invalid window or selector, or two
    ///   selectors claiming the same key for different series
    /// - `SeriesNotFound` for the first selector, in request order, that
    ///   does not resolve
    /// - `Storage` when the series store fails
    pub async fn build(
        &self,
        topic: &str,
        selectors: &[SeriesSelector],
        options: &BriefingOptions,
    ) -> Result<DataPack, BriefingError> {
        options.window.validate()?;
        for selector in selectors {
            selector.validate()?;
        }

        // Every lookup completes before errors are inspected, so the
        // reported selector is the first failing one in request order.
        let resolved = join_all(selectors.iter().map(|selector| async move {
            match self.store.resolve_selector(selector).await? {
                Some(descriptor) => Ok((selector, descriptor)),
                None => Err(BriefingError::SeriesNotFound(selector.label())),
            }
        }))
        .await
        .into_iter()
        .collect::<Result<Vec<_>, BriefingError>>()?;

        let mut limitations = Vec::new();
        let mut included: Vec<(&SeriesSelector, SeriesDescriptor, String)> = Vec::new();
        let mut claimed: HashMap<String, String> = HashMap::new();

        for (selector, descriptor) in resolved {
            if descriptor.source.is_comparison() && !options.include_comparisons {
                limitations.push(format!(
                    "{}: comparison series excluded because comparisons were not requested.",
                    selector.label()
                ));
                continue;
            }

            let key = selector
                .alias
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or(&descriptor.slug)
                .to_string();

            match claimed.get(&key) {
                Some(slug) if *slug == descriptor.slug => continue,
                Some(_) => {
                    return Err(ValidationError::invalid_format(
                        "selectors",
                        format!("series key '{}' is claimed by more than one series", key),
                    )
                    .into())
                }
                None => {
                    claimed.insert(key.clone(), descriptor.slug.clone());
                }
            }
            included.push((selector, descriptor, key));
        }

        let packed = try_join_all(included.into_iter().map(|(selector, descriptor, key)| async move {
            let raw = self
                .store
                .fetch_observations(&descriptor, &options.window)
                .await?;
            let observations = options.window.normalize(raw);
            let metadata = SeriesMetadata {
                series_key: key,
                source: descriptor.source,
                source_series_id: selector.source_series_id.trim().to_string(),
                series_id: descriptor.series_id,
                dataset_id: descriptor.dataset_id,
                name: descriptor.name,
                unit: descriptor.unit,
                frequency: descriptor.frequency,
                comparison: descriptor.source.is_comparison(),
                ingested_at: descriptor.ingested_at,
            };
            Ok::<_, BriefingError>(PackedSeries::new(
                metadata,
                observations,
                options.as_of,
                &self.tolerance,
            ))
        }))
        .await?;

        let pack = DataPack::assemble(
            topic.trim(),
            options.as_of,
            options.window,
            options.include_comparisons,
            packed,
            limitations,
        );

        tracing::debug!(
            topic = %pack.topic,
            series = pack.len(),
            status = ?pack.quality.status,
            data_pack_hash = %pack.data_pack_hash,
            "Data pack assembled"
        );
        Ok(pack)
    }
}
