//! Statistical providers and series frequencies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Provider a series is published by.
///
/// ONS series are the primary grounding data; OECD series are used as
/// international comparisons and can be excluded per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeriesSource {
    #[serde(rename = "ONS", alias = "ons")]
    Ons,
    #[serde(rename = "OECD", alias = "oecd")]
    Oecd,
}

impl SeriesSource {
    /// Returns the canonical provider code.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesSource::Ons => "ONS",
            SeriesSource::Oecd => "OECD",
        }
    }

    /// Returns true for secondary/comparison providers.
    pub fn is_comparison(&self) -> bool {
        matches!(self, SeriesSource::Oecd)
    }
}

impl fmt::Display for SeriesSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONS" => Ok(SeriesSource::Ons),
            "OECD" => Ok(SeriesSource::Oecd),
            other => Err(ValidationError::invalid_format(
                "source",
                format!("unknown provider '{}'", other),
            )),
        }
    }
}

/// Publication frequency of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Frequency {
    #[default]
    #[serde(rename = "M")]
    Monthly,
    #[serde(rename = "Q")]
    Quarterly,
    #[serde(rename = "A")]
    Annual,
}

impl Frequency {
    /// Number of observations that make up one year.
    pub fn periods_per_year(&self) -> usize {
        match self {
            Frequency::Monthly => 12,
            Frequency::Quarterly => 4,
            Frequency::Annual => 1,
        }
    }

    /// Returns the single-letter frequency code.
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Monthly => "M",
            Frequency::Quarterly => "Q",
            Frequency::Annual => "A",
        }
    }

    /// Parses a frequency code, defaulting to monthly for unknown codes.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "Q" => Frequency::Quarterly,
            "A" | "Y" => Frequency::Annual,
            _ => Frequency::Monthly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_parses_case_insensitively() {
        assert_eq!("ons".parse::<SeriesSource>().unwrap(), SeriesSource::Ons);
        assert_eq!(" OECD ".parse::<SeriesSource>().unwrap(), SeriesSource::Oecd);
        assert!("BLS".parse::<SeriesSource>().is_err());
    }

    #[test]
    fn only_oecd_is_a_comparison_source() {
        assert!(!SeriesSource::Ons.is_comparison());
        assert!(SeriesSource::Oecd.is_comparison());
    }

    #[test]
    fn source_serializes_as_provider_code() {
        assert_eq!(serde_json::to_string(&SeriesSource::Ons).unwrap(), "\"ONS\"");
        let parsed: SeriesSource = serde_json::from_str("\"oecd\"").unwrap();
        assert_eq!(parsed, SeriesSource::Oecd);
    }

    #[test]
    fn frequency_codes() {
        assert_eq!(Frequency::from_code("q"), Frequency::Quarterly);
        assert_eq!(Frequency::from_code("A"), Frequency::Annual);
        assert_eq!(Frequency::from_code(""), Frequency::Monthly);
        assert_eq!(Frequency::Quarterly.periods_per_year(), 4);
        assert_eq!(serde_json::to_string(&Frequency::Monthly).unwrap(), "\"M\"");
    }
}
