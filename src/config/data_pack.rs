//! Data pack defaults

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::series::{LookbackWindow, MAX_LOOKBACK_PERIODS};

/// Lookback defaults applied when a request does not choose a window.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct DataPackConfig {
    #[serde(default = "default_lookback")]
    pub default_lookback_periods: u32,

    #[serde(default = "default_max_lookback")]
    pub max_lookback_periods: u32,
}

impl DataPackConfig {
    pub fn default_window(&self) -> LookbackWindow {
        LookbackWindow::periods(self.default_lookback_periods)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_lookback_periods == 0 {
            return Err(ValidationError::MustBePositive("data_pack.default_lookback_periods"));
        }
        if self.default_lookback_periods > self.max_lookback_periods
            || self.max_lookback_periods > MAX_LOOKBACK_PERIODS
        {
            return Err(ValidationError::LookbackOutOfRange {
                default: self.default_lookback_periods,
                max: self.max_lookback_periods,
            });
        }
        Ok(())
    }
}

impl Default for DataPackConfig {
    fn default() -> Self {
        Self {
            default_lookback_periods: default_lookback(),
            max_lookback_periods: default_max_lookback(),
        }
    }
}

fn default_lookback() -> u32 {
    24
}

fn default_max_lookback() -> u32 {
    MAX_LOOKBACK_PERIODS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_is_24_periods() {
        let config = DataPackConfig::default();
        assert_eq!(config.default_window(), LookbackWindow::periods(24));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_above_max_is_rejected() {
        let config = DataPackConfig {
            default_lookback_periods: 300,
            max_lookback_periods: 240,
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::LookbackOutOfRange { .. })
        ));
    }
}
