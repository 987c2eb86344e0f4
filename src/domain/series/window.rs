//! Observations and the lookback window that bounds them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// Largest number of periods a request may look back over.
pub const MAX_LOOKBACK_PERIODS: u32 = 240;

/// One data point of a series. `value` is `None` when the provider
/// published the period without a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(alias = "period_start")]
    pub period: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    /// Creates an observation with a value.
    pub fn new(period: NaiveDate, value: f64) -> Self {
        Self {
            period,
            value: Some(value),
        }
    }

    /// Creates an observation for a period published without a value.
    pub fn missing(period: NaiveDate) -> Self {
        Self {
            period,
            value: None,
        }
    }
}

/// Time window applied to every series in a data pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookbackWindow {
    /// The most recent `count` periods.
    Periods { count: u32 },
    /// All periods in `start..=end`.
    Range { start: NaiveDate, end: NaiveDate },
}

impl LookbackWindow {
    /// Creates a period-count window.
    pub fn periods(count: u32) -> Self {
        LookbackWindow::Periods { count }
    }

    /// Creates an explicit inclusive date range.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        LookbackWindow::Range { start, end }
    }

    /// Validates the window bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            LookbackWindow::Periods { count } => {
                if count == 0 || count > MAX_LOOKBACK_PERIODS {
                    return Err(ValidationError::out_of_range(
                        "lookback_periods",
                        1,
                        i64::from(MAX_LOOKBACK_PERIODS),
                        i64::from(count),
                    ));
                }
            }
            LookbackWindow::Range { start, end } => {
                if start > end {
                    return Err(ValidationError::invalid_format(
                        "window",
                        format!("start {} is after end {}", start, end),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Orders observations ascending by period, collapses duplicate periods
    /// (the last one in input order wins), and drops anything outside the
    /// window.
    pub fn normalize(&self, observations: Vec<Observation>) -> Vec<Observation> {
        let mut ordered = observations;
        // Stable sort keeps input order among equal periods.
        ordered.sort_by_key(|obs| obs.period);

        let mut deduped: Vec<Observation> = Vec::with_capacity(ordered.len());
        for obs in ordered {
            match deduped.last_mut() {
                Some(last) if last.period == obs.period => *last = obs,
                _ => deduped.push(obs),
            }
        }

        match *self {
            LookbackWindow::Periods { count } => {
                let keep = count as usize;
                if deduped.len() > keep {
                    deduped.split_off(deduped.len() - keep)
                } else {
                    deduped
                }
            }
            LookbackWindow::Range { start, end } => deduped
                .into_iter()
                .filter(|obs| obs.period >= start && obs.period <= end)
                .collect(),
        }
    }
}

impl Default for LookbackWindow {
    fn default() -> Self {
        LookbackWindow::Periods { count: 24 }
    }
}
