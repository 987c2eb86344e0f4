//! Series selectors and the canonical series they resolve to.

use serde::{Deserialize, Serialize};

use super::{Frequency, SeriesSource};
use crate::domain::foundation::{Timestamp, ValidationError};

/// A caller's request for one series, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesSelector {
    pub source: SeriesSource,
    pub source_series_id: String,
    /// Dataset hint used when a series id is published in several datasets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    /// Overrides the series key used in the data pack and in citations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl SeriesSelector {
    /// Creates a selector without dataset hint or alias.
    pub fn new(source: SeriesSource, source_series_id: impl Into<String>) -> Self {
        Self {
            source,
            source_series_id: source_series_id.into(),
            dataset_id: None,
            alias: None,
        }
    }

    /// Sets the dataset hint.
    pub fn with_dataset(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = Some(dataset_id.into());
        self
    }

    /// Sets the series key alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Validates the selector fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source_series_id.trim().is_empty() {
            return Err(ValidationError::empty_field("source_series_id"));
        }
        if let Some(alias) = &self.alias {
            if alias.trim().is_empty() {
                return Err(ValidationError::empty_field("alias"));
            }
        }
        Ok(())
    }

    /// Human-readable `SOURCE:ID` label.
    pub fn label(&self) -> String {
        format!("{}:{}", self.source, self.source_series_id)
    }
}

/// Canonical series configuration held by the series store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesDescriptor {
    /// Stable slug; the default series key.
    pub slug: String,
    pub source: SeriesSource,
    /// Provider-side identifier of the canonical series.
    pub series_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub frequency: Frequency,
    /// When the store last ingested observations for this series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<Timestamp>,
}

impl SeriesDescriptor {
    /// Creates a descriptor with the minimum required fields.
    pub fn new(
        slug: impl Into<String>,
        source: SeriesSource,
        series_id: impl Into<String>,
        name: impl Into<String>,
        frequency: Frequency,
    ) -> Self {
        Self {
            slug: slug.into(),
            source,
            series_id: series_id.into(),
            dataset_id: None,
            name: name.into(),
            unit: None,
            frequency,
            ingested_at: None,
        }
    }

    /// Sets the unit of measure.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the dataset id.
    pub fn with_dataset(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = Some(dataset_id.into());
        self
    }

    /// Sets the ingestion timestamp.
    pub fn with_ingested_at(mut self, ingested_at: Timestamp) -> Self {
        self.ingested_at = Some(ingested_at);
        self
    }
}
