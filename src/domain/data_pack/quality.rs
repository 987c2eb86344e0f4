//! Per-series and pack-level data quality.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::series::{Frequency, Observation};

/// Fewer valued observations than this and deltas are not meaningful.
pub const MIN_OBSERVATIONS_FOR_DELTAS: usize = 3;

/// One named quality check and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

impl QualityCheck {
    pub fn new(name: impl Into<String>, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok,
            detail: detail.into(),
        }
    }

    pub fn passed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, true, detail)
    }

    pub fn failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(name, false, detail)
    }
}

/// Traffic-light status of a series or of a whole pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataStatus {
    Green,
    Amber,
    Red,
}

/// Staleness tolerances by publication frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessTolerance {
    pub monthly_days: i64,
    pub other_days: i64,
}

impl FreshnessTolerance {
    /// Returns the tolerance in days for a frequency.
    pub fn for_frequency(&self, frequency: Frequency) -> i64 {
        match frequency {
            Frequency::Monthly => self.monthly_days,
            Frequency::Quarterly | Frequency::Annual => self.other_days,
        }
    }

    /// True when `latest` is within tolerance of `reference`.
    pub fn is_fresh(&self, frequency: Frequency, latest: NaiveDate, reference: NaiveDate) -> bool {
        (reference - latest).num_days() <= self.for_frequency(frequency)
    }
}

impl Default for FreshnessTolerance {
    fn default() -> Self {
        Self {
            monthly_days: 40,
            other_days: 120,
        }
    }
}

/// Quality assessment for one packed series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesQuality {
    pub status: DataStatus,
    pub checks: Vec<QualityCheck>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub limitations: Vec<String>,
}

impl SeriesQuality {
    /// Assesses a normalized observation list.
    ///
    /// Freshness is only checked when a reference date is supplied, so the
    /// result never depends on the wall clock.
    pub fn assess(
        series_key: &str,
        observations: &[Observation],
        frequency: Frequency,
        reference_date: Option<NaiveDate>,
        tolerance: &FreshnessTolerance,
    ) -> Self {
        let Some(latest) = observations.last() else {
            return Self {
                status: DataStatus::Red,
                checks: vec![QualityCheck::failed(
                    "availability",
                    "No observations available.",
                )],
                limitations: vec![format!("{}: no observations available.", series_key)],
            };
        };

        let mut checks = vec![QualityCheck::passed(
            "availability",
            format!("{} observations", observations.len()),
        )];
        let mut limitations = Vec::new();

        if let Some(reference) = reference_date {
            let fresh = tolerance.is_fresh(frequency, latest.period, reference);
            checks.push(QualityCheck::new(
                "freshness",
                fresh,
                format!(
                    "Latest period {} ({})",
                    latest.period,
                    if fresh { "fresh" } else { "stale" }
                ),
            ));
            if !fresh {
                limitations.push(format!(
                    "{}: latest data is older than expected cadence.",
                    series_key
                ));
            }
        }

        let missing: Vec<String> = observations
            .iter()
            .filter(|obs| obs.value.is_none())
            .map(|obs| obs.period.to_string())
            .collect();
        checks.push(QualityCheck::new(
            "missing_values",
            missing.is_empty(),
            format!("{} missing points out of {}", missing.len(), observations.len()),
        ));
        if !missing.is_empty() {
            let shown: Vec<&str> = missing.iter().take(5).map(String::as_str).collect();
            limitations.push(format!(
                "{}: missing values for {}",
                series_key,
                shown.join(", ")
            ));
        }

        let valued = observations.len() - missing.len();
        let sufficient = valued >= MIN_OBSERVATIONS_FOR_DELTAS;
        checks.push(QualityCheck::new(
            "lookback",
            sufficient,
            format!("{} valued observations", valued),
        ));

        let status = if !sufficient {
            limitations.push(format!(
                "{}: insufficient lookback window to compute deltas.",
                series_key
            ));
            DataStatus::Red
        } else if checks.iter().any(|c| !c.ok) {
            DataStatus::Amber
        } else {
            DataStatus::Green
        };

        Self {
            status,
            checks,
            limitations,
        }
    }
}
