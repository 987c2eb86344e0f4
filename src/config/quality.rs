//! Quality check configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::briefing::QualityConfig;
use crate::domain::data_pack::FreshnessTolerance;

/// Staleness tolerances and narrative section ids.
#[derive(Debug, Clone, Deserialize)]
pub struct QualitySettings {
    /// Days a monthly series may lag the reference date
    #[serde(default = "default_monthly_days")]
    pub monthly_staleness_days: i64,

    /// Days a quarterly or annual series may lag the reference date
    #[serde(default = "default_other_days")]
    pub other_staleness_days: i64,

    /// Section ids exempt from the coverage check
    #[serde(default = "default_narrative_sections")]
    pub narrative_sections: Vec<String>,
}

impl QualitySettings {
    pub fn freshness(&self) -> FreshnessTolerance {
        FreshnessTolerance {
            monthly_days: self.monthly_staleness_days,
            other_days: self.other_staleness_days,
        }
    }

    /// Converts into the validator's configuration.
    pub fn to_quality_config(&self) -> QualityConfig {
        QualityConfig {
            freshness: self.freshness(),
            narrative_sections: self.narrative_sections.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.monthly_staleness_days <= 0 {
            return Err(ValidationError::MustBePositive("quality.monthly_staleness_days"));
        }
        if self.other_staleness_days <= 0 {
            return Err(ValidationError::MustBePositive("quality.other_staleness_days"));
        }
        Ok(())
    }
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            monthly_staleness_days: default_monthly_days(),
            other_staleness_days: default_other_days(),
            narrative_sections: default_narrative_sections(),
        }
    }
}

fn default_monthly_days() -> i64 {
    40
}

fn default_other_days() -> i64 {
    120
}

fn default_narrative_sections() -> Vec<String> {
    QualityConfig::default().narrative_sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_validator_defaults() {
        assert_eq!(QualitySettings::default().to_quality_config(), QualityConfig::default());
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let config = QualitySettings {
            other_staleness_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
