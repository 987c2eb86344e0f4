//! Derived statistics computed for each packed series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::series::{Frequency, Observation};

/// Summary statistics derived from a series' observations.
///
/// Only observations with a value take part. All deltas and averages are
/// rounded to four decimal places.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_period: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_value: Option<f64>,
    /// Change against the previous observation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_change: Option<f64>,
    /// Change against the observation one year earlier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yoy_change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling_3_avg: Option<f64>,
    /// Average over the last year of observations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling_year_avg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl DerivedStats {
    /// Computes statistics from observations already ordered by period.
    pub fn from_observations(observations: &[Observation], frequency: Frequency) -> Self {
        let valued: Vec<(NaiveDate, f64)> = observations
            .iter()
            .filter_map(|obs| obs.value.map(|v| (obs.period, v)))
            .collect();

        let Some(&(latest_period, latest_value)) = valued.last() else {
            return Self::default();
        };

        let n = valued.len();
        let per_year = frequency.periods_per_year();

        let period_change = (n >= 2).then(|| round4(latest_value - valued[n - 2].1));
        let yoy_change = (n > per_year).then(|| round4(latest_value - valued[n - 1 - per_year].1));
        let rolling_3_avg = (n >= 3).then(|| round4(mean(&valued[n - 3..])));
        let rolling_year_avg = (n >= per_year).then(|| round4(mean(&valued[n - per_year..])));

        let min = valued.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
        let max = valued.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);

        Self {
            latest_period: Some(latest_period),
            latest_value: Some(latest_value),
            period_change,
            yoy_change,
            rolling_3_avg,
            rolling_year_avg,
            min: Some(min),
            max: Some(max),
        }
    }
}

fn mean(window: &[(NaiveDate, f64)]) -> f64 {
    window.iter().map(|(_, v)| v).sum::<f64>() / window.len() as f64
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monthly(values: &[f64]) -> Vec<Observation> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let year = 2022 + (i / 12) as i32;
                let month = (i % 12) as u32 + 1;
                Observation::new(NaiveDate::from_ymd_opt(year, month, 1).unwrap(), *v)
            })
            .collect()
    }

    #[test]
    fn empty_series_has_no_stats() {
        let stats = DerivedStats::from_observations(&[], Frequency::Monthly);
        assert_eq!(stats, DerivedStats::default());
    }

    #[test]
    fn short_series_only_has_latest_and_extremes() {
        let stats = DerivedStats::from_observations(&monthly(&[2.0]), Frequency::Monthly);
        assert_eq!(stats.latest_value, Some(2.0));
        assert_eq!(stats.period_change, None);
        assert_eq!(stats.rolling_3_avg, None);
        assert_eq!(stats.min, Some(2.0));
        assert_eq!(stats.max, Some(2.0));
    }

    #[test]
    fn deltas_and_averages_are_rounded() {
        let stats = DerivedStats::from_observations(&monthly(&[1.0, 2.0, 4.0]), Frequency::Monthly);
        assert_eq!(stats.period_change, Some(2.0));
        assert_eq!(stats.rolling_3_avg, Some(2.3333));
        assert_eq!(stats.yoy_change, None);
    }

    #[test]
    fn yoy_change_uses_periods_per_year() {
        let values: Vec<f64> = (0..13).map(|i| i as f64).collect();
        let stats = DerivedStats::from_observations(&monthly(&values), Frequency::Monthly);
        assert_eq!(stats.yoy_change, Some(12.0));
        assert_eq!(stats.rolling_year_avg, Some(6.5));
    }

    #[test]
    fn missing_values_are_ignored() {
        let mut obs = monthly(&[1.0, 5.0]);
        obs.push(Observation::missing(NaiveDate::from_ymd_opt(2022, 3, 1).unwrap()));
        let stats = DerivedStats::from_observations(&obs, Frequency::Monthly);
        assert_eq!(stats.latest_value, Some(5.0));
        assert_eq!(stats.latest_period, NaiveDate::from_ymd_opt(2022, 2, 1));
    }
}
