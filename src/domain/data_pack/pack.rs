//! The data pack: the grounding bundle handed to generation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::quality::{DataStatus, FreshnessTolerance, QualityCheck, SeriesQuality};
use super::stats::DerivedStats;
use crate::domain::foundation::Timestamp;
use crate::domain::series::{Frequency, LookbackWindow, Observation, SeriesSource};

// ════════════════════════════════════════════════════════════════════════════════
// SeriesMetadata
// ════════════════════════════════════════════════════════════════════════════════

/// Self-describing metadata for a packed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    /// Key used in the pack and in citations.
    pub series_key: String,
    pub source: SeriesSource,
    /// Identifier the caller selected.
    pub source_series_id: String,
    /// Canonical identifier the selector resolved to.
    pub series_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub frequency: Frequency,
    /// True for secondary/comparison series.
    pub comparison: bool,
    /// Store ingestion time; provenance only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<Timestamp>,
}

// ════════════════════════════════════════════════════════════════════════════════
// PackedSeries
// ════════════════════════════════════════════════════════════════════════════════

/// One series in a data pack, with its window-bounded observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedSeries {
    pub metadata: SeriesMetadata,
    /// Ascending by period, one entry per period.
    pub observations: Vec<Observation>,
    pub derived: DerivedStats,
    /// Requested but no observations fell inside the window.
    pub empty: bool,
    pub quality: SeriesQuality,
}

impl PackedSeries {
    /// Packs already-normalized observations, deriving stats and quality.
    pub fn new(
        metadata: SeriesMetadata,
        observations: Vec<Observation>,
        reference_date: Option<NaiveDate>,
        tolerance: &FreshnessTolerance,
    ) -> Self {
        let derived = DerivedStats::from_observations(&observations, metadata.frequency);
        let quality = SeriesQuality::assess(
            &metadata.series_key,
            &observations,
            metadata.frequency,
            reference_date,
            tolerance,
        );
        Self {
            empty: observations.is_empty(),
            metadata,
            observations,
            derived,
            quality,
        }
    }

    /// Returns the series key.
    pub fn key(&self) -> &str {
        &self.metadata.series_key
    }

    /// Returns the observation for a period, if any.
    pub fn observation(&self, period: NaiveDate) -> Option<&Observation> {
        self.observations
            .binary_search_by_key(&period, |obs| obs.period)
            .ok()
            .map(|idx| &self.observations[idx])
    }

    /// Most recent observation that carries a value.
    pub fn latest_valued(&self) -> Option<&Observation> {
        self.observations.iter().rev().find(|obs| obs.value.is_some())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// DataPack
// ════════════════════════════════════════════════════════════════════════════════

/// Aggregate quality of a data pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackQuality {
    pub status: DataStatus,
    pub checks: Vec<QualityCheck>,
}

/// Reproducible bundle of series metadata and observations.
///
/// Series are keyed in a `BTreeMap`, so serialization order depends only on
/// the series keys. Two packs built from the same selectors, window and store
/// state serialize to identical bytes and carry the same hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPack {
    pub topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
    pub window: LookbackWindow,
    pub include_comparisons: bool,
    pub series: BTreeMap<String, PackedSeries>,
    pub quality: PackQuality,
    pub data_limitations: Vec<String>,
    /// SHA-256 over every other field.
    pub data_pack_hash: String,
}

#[derive(Serialize)]
struct HashedFields<'a> {
    topic: &'a str,
    as_of: &'a Option<NaiveDate>,
    window: &'a LookbackWindow,
    include_comparisons: bool,
    series: &'a BTreeMap<String, PackedSeries>,
    quality: &'a PackQuality,
    data_limitations: &'a [String],
}

impl DataPack {
    /// Assembles a pack from packed series plus request-level limitations.
    ///
    /// Callers must ensure series keys are unique; a later series with the
    /// same key replaces an earlier one.
    pub fn assemble(
        topic: impl Into<String>,
        as_of: Option<NaiveDate>,
        window: LookbackWindow,
        include_comparisons: bool,
        packed: Vec<PackedSeries>,
        mut data_limitations: Vec<String>,
    ) -> Self {
        let series: BTreeMap<String, PackedSeries> = packed
            .into_iter()
            .map(|s| (s.metadata.series_key.clone(), s))
            .collect();

        for s in series.values() {
            data_limitations.extend(s.quality.limitations.iter().cloned());
        }

        let quality = Self::aggregate_quality(&series);

        let mut pack = Self {
            topic: topic.into(),
            as_of,
            window,
            include_comparisons,
            series,
            quality,
            data_limitations,
            data_pack_hash: String::new(),
        };
        pack.data_pack_hash = pack.compute_hash();
        pack
    }

    fn aggregate_quality(series: &BTreeMap<String, PackedSeries>) -> PackQuality {
        let status = if series.is_empty() {
            DataStatus::Red
        } else {
            series
                .values()
                .map(|s| s.quality.status)
                .max()
                .unwrap_or(DataStatus::Green)
        };
        let empty = series.values().filter(|s| s.empty).count();
        PackQuality {
            status,
            checks: vec![
                QualityCheck::new(
                    "coverage",
                    !series.is_empty(),
                    format!("{} series included.", series.len()),
                ),
                QualityCheck::new(
                    "empty_series",
                    empty == 0,
                    format!("{} series returned no observations.", empty),
                ),
            ],
        }
    }

    /// Computes the SHA-256 hash of the pack's hashed fields.
    pub fn compute_hash(&self) -> String {
        let fields = HashedFields {
            topic: &self.topic,
            as_of: &self.as_of,
            window: &self.window,
            include_comparisons: self.include_comparisons,
            series: &self.series,
            quality: &self.quality,
            data_limitations: &self.data_limitations,
        };
        // Plain data with string map keys always serializes.
        let bytes = serde_json::to_vec(&fields).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }

    /// True when the stored hash matches the pack contents.
    pub fn verify_hash(&self) -> bool {
        self.data_pack_hash == self.compute_hash()
    }

    /// Returns a packed series by key.
    pub fn get(&self, series_key: &str) -> Option<&PackedSeries> {
        self.series.get(series_key)
    }

    /// Returns true when the pack contains the key.
    pub fn contains(&self, series_key: &str) -> bool {
        self.series.contains_key(series_key)
    }

    /// Looks up the observation for a series and period.
    pub fn find_observation(&self, series_key: &str, period: NaiveDate) -> Option<&Observation> {
        self.get(series_key).and_then(|s| s.observation(period))
    }

    /// Keys of series that were requested but returned nothing.
    pub fn empty_series(&self) -> impl Iterator<Item = &str> {
        self.series.values().filter(|s| s.empty).map(|s| s.key())
    }

    /// Most recent period across every series.
    pub fn latest_period(&self) -> Option<NaiveDate> {
        self.series
            .values()
            .filter_map(|s| s.observations.last().map(|o| o.period))
            .max()
    }

    /// Number of series in the pack.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True when the pack has no series.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Builds a monthly ONS series with values for consecutive months of 2024.
    pub fn monthly_series(key: &str, values: &[Option<f64>]) -> PackedSeries {
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation {
                period: NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap(),
                value: *v,
            })
            .collect();
        PackedSeries::new(
            SeriesMetadata {
                series_key: key.to_string(),
                source: SeriesSource::Ons,
                source_series_id: key.to_uppercase(),
                series_id: key.to_uppercase(),
                dataset_id: None,
                name: format!("{} series", key),
                unit: Some("%".to_string()),
                frequency: Frequency::Monthly,
                comparison: false,
                ingested_at: None,
            },
            observations,
            None,
            &FreshnessTolerance::default(),
        )
    }

    /// Pack with the given series under topic "inflation".
    pub fn pack_of(series: Vec<PackedSeries>) -> DataPack {
        DataPack::assemble(
            "inflation",
            None,
            LookbackWindow::default(),
            true,
            series,
            Vec::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn date(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    #[test]
    fn find_observation_matches_exact_period() {
        let pack = pack_of(vec![monthly_series("cpi", &[Some(1.0), Some(2.5), None])]);

        assert_eq!(pack.find_observation("cpi", date(2)).unwrap().value, Some(2.5));
        assert_eq!(pack.find_observation("cpi", date(3)).unwrap().value, None);
        assert!(pack.find_observation("cpi", date(4)).is_none());
        assert!(pack.find_observation("gdp", date(1)).is_none());
    }

    #[test]
    fn empty_series_is_kept_and_flagged() {
        let pack = pack_of(vec![
            monthly_series("cpi", &[Some(1.0), Some(2.0), Some(3.0)]),
            monthly_series("gdp", &[]),
        ]);

        assert_eq!(pack.len(), 2);
        assert_eq!(pack.empty_series().collect::<Vec<_>>(), vec!["gdp"]);
        assert_eq!(pack.quality.status, DataStatus::Red);
        assert!(pack.data_limitations.iter().any(|l| l.starts_with("gdp:")));
    }

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        let a = pack_of(vec![monthly_series("cpi", &[Some(1.0), Some(2.0), Some(3.0)])]);
        let b = pack_of(vec![monthly_series("cpi", &[Some(1.0), Some(2.0), Some(3.0)])]);
        let c = pack_of(vec![monthly_series("cpi", &[Some(1.0), Some(2.0), Some(3.5)])]);

        assert_eq!(a.data_pack_hash.len(), 64);
        assert_eq!(a.data_pack_hash, b.data_pack_hash);
        assert_ne!(a.data_pack_hash, c.data_pack_hash);
        assert!(a.verify_hash());
    }

    #[test]
    fn serialization_is_independent_of_input_order() {
        let a = pack_of(vec![
            monthly_series("cpi", &[Some(1.0)]),
            monthly_series("gdp", &[Some(2.0)]),
        ]);
        let b = pack_of(vec![
            monthly_series("gdp", &[Some(2.0)]),
            monthly_series("cpi", &[Some(1.0)]),
        ]);

        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn tampered_pack_fails_verification() {
        let mut pack = pack_of(vec![monthly_series("cpi", &[Some(1.0)])]);
        pack.topic = "growth".to_string();
        assert!(!pack.verify_hash());
    }

    #[test]
    fn pack_round_trips_through_json() {
        let pack = pack_of(vec![monthly_series("cpi", &[Some(1.0), None, Some(0.1)])]);
        let json = serde_json::to_string(&pack).unwrap();
        let restored: DataPack = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, pack);
        assert!(restored.verify_hash());
    }

    #[test]
    fn latest_period_spans_all_series() {
        let pack = pack_of(vec![
            monthly_series("cpi", &[Some(1.0)]),
            monthly_series("gdp", &[Some(1.0), Some(2.0), Some(3.0)]),
        ]);
        assert_eq!(pack.latest_period(), Some(date(3)));
    }
}
