//! Structural validation and the quality banner.

use std::convert::TryFrom;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::{Block, BlockPayload, BriefingContent, RawBlock};
use crate::domain::data_pack::{DataPack, FreshnessTolerance};

// ════════════════════════════════════════════════════════════════════════════════
// QualityBanner
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerStatus {
    Pass,
    Warn,
    Fail,
}

impl BannerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BannerStatus::Pass => "pass",
            BannerStatus::Warn => "warn",
            BannerStatus::Fail => "fail",
        }
    }
}

/// How a failed check affects the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckSeverity {
    /// Failure means `fail`.
    Critical,
    /// Failure means `warn`.
    Quality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerCheck {
    pub name: String,
    pub ok: bool,
    pub detail: String,
    pub severity: CheckSeverity,
}

impl BannerCheck {
    fn critical(name: &str, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            ok,
            detail: detail.into(),
            severity: CheckSeverity::Critical,
        }
    }

    fn quality(name: &str, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            ok,
            detail: detail.into(),
            severity: CheckSeverity::Quality,
        }
    }
}

/// Pass/warn/fail summary frozen into a version at validation time.
///
/// `checks` lists every check performed, passing or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityBanner {
    pub status: BannerStatus,
    pub summary: String,
    pub checks: Vec<BannerCheck>,
}

impl QualityBanner {
    /// Derives status and summary from a full check list.
    pub fn from_checks(checks: Vec<BannerCheck>) -> Self {
        fn failed(checks: &[BannerCheck], severity: CheckSeverity) -> Vec<&str> {
            checks
                .iter()
                .filter(|c| !c.ok && c.severity == severity)
                .map(|c| c.name.as_str())
                .collect()
        }
        let critical = failed(&checks, CheckSeverity::Critical);
        let quality = failed(&checks, CheckSeverity::Quality);

        let (status, summary) = if !critical.is_empty() {
            (
                BannerStatus::Fail,
                format!("Critical checks failed: {}.", critical.join(", ")),
            )
        } else if !quality.is_empty() {
            (
                BannerStatus::Warn,
                format!(
                    "{} of {} checks need attention: {}.",
                    quality.len(),
                    checks.len(),
                    quality.join(", ")
                ),
            )
        } else {
            (
                BannerStatus::Pass,
                format!("All {} checks passed.", checks.len()),
            )
        };

        Self {
            status,
            summary,
            checks,
        }
    }

    pub fn check(&self, name: &str) -> Option<&BannerCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Structural rejection
// ════════════════════════════════════════════════════════════════════════════════

/// Every structural problem found in a candidate document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralRejection {
    pub issues: Vec<String>,
}

impl std::fmt::Display for StructuralRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.issues.join("; "))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// ContentValidator
// ════════════════════════════════════════════════════════════════════════════════

/// Thresholds used by the quality checks.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityConfig {
    pub freshness: FreshnessTolerance,
    /// Section ids that are allowed to carry no data.
    pub narrative_sections: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            freshness: FreshnessTolerance::default(),
            narrative_sections: vec![
                "context".to_string(),
                "recommendations".to_string(),
                "next_steps".to_string(),
                "data_notes".to_string(),
            ],
        }
    }
}

/// What the validator knows about how the candidate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub reference_date: NaiveDate,
    pub fallback_used: bool,
}

/// Decodes candidate documents and grades accepted ones.
#[derive(Debug, Clone, Default)]
pub struct ContentValidator {
    config: QualityConfig,
}

impl ContentValidator {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Decodes a raw candidate into typed content.
    ///
    /// Every section and block is inspected; all problems are reported
    /// together rather than stopping at the first.
    pub fn parse(&self, candidate: &Value) -> Result<BriefingContent, StructuralRejection> {
        let mut issues = Vec::new();

        let Some(sections) = candidate.get("sections").and_then(Value::as_array) else {
            return Err(StructuralRejection {
                issues: vec!["document has no sections array".to_string()],
            });
        };

        for (s_idx, section) in sections.iter().enumerate() {
            for field in ["id", "title"] {
                if section.get(field).and_then(Value::as_str).is_none() {
                    issues.push(format!("sections[{}]: missing string field '{}'", s_idx, field));
                }
            }
            let Some(blocks) = section.get("blocks").and_then(Value::as_array) else {
                issues.push(format!("sections[{}]: missing blocks array", s_idx));
                continue;
            };
            for (b_idx, block) in blocks.iter().enumerate() {
                let decoded = serde_json::from_value::<RawBlock>(block.clone())
                    .map_err(|e| e.to_string())
                    .and_then(|raw| Block::try_from(raw).map_err(|e| e.to_string()));
                if let Err(reason) = decoded {
                    issues.push(format!("sections[{}].blocks[{}]: {}", s_idx, b_idx, reason));
                }
            }
        }

        if !issues.is_empty() {
            return Err(StructuralRejection { issues });
        }

        serde_json::from_value(candidate.clone()).map_err(|e| StructuralRejection {
            issues: vec![e.to_string()],
        })
    }

    /// Runs every check against resolved content and its data pack.
    pub fn assess(
        &self,
        content: &BriefingContent,
        pack: &DataPack,
        assessment: Assessment,
    ) -> QualityBanner {
        let mut checks = vec![Self::structure(content), Self::grounding(content, pack)];

        let populated = pack.series.values().filter(|s| !s.empty).count();
        checks.push(BannerCheck::critical(
            "data_available",
            populated > 0,
            format!("{} of {} series have observations", populated, pack.len()),
        ));

        checks.push(self.staleness(pack, assessment.reference_date));
        checks.push(self.coverage(content));
        checks.push(Self::citation_density(content));

        let empty: Vec<&str> = pack.empty_series().collect();
        checks.push(BannerCheck::quality(
            "empty_series",
            empty.is_empty(),
            if empty.is_empty() {
                "Every requested series returned observations".to_string()
            } else {
                format!("No observations in window for: {}", empty.join(", "))
            },
        ));

        let gappy: Vec<&str> = pack
            .series
            .values()
            .filter(|s| s.observations.iter().any(|o| o.value.is_none()))
            .map(|s| s.key())
            .collect();
        checks.push(BannerCheck::quality(
            "missing_values",
            gappy.is_empty(),
            if gappy.is_empty() {
                "No missing values".to_string()
            } else {
                format!("Missing values in: {}", gappy.join(", "))
            },
        ));

        checks.push(BannerCheck::quality(
            "generation",
            !assessment.fallback_used,
            if assessment.fallback_used {
                "Used deterministic fallback content"
            } else {
                "Generated content accepted"
            },
        ));

        QualityBanner::from_checks(checks)
    }

    fn structure(content: &BriefingContent) -> BannerCheck {
        let mut issues = Vec::new();
        for (s_idx, section) in content.sections.iter().enumerate() {
            for (b_idx, block) in section.blocks.iter().enumerate() {
                if let Err(err) = block.validate() {
                    issues.push(format!("sections[{}].blocks[{}]: {}", s_idx, b_idx, err));
                }
            }
        }

        BannerCheck::critical(
            "structure",
            issues.is_empty(),
            if issues.is_empty() {
                format!(
                    "{} sections, {} blocks with recognised types and valid payloads",
                    content.sections.len(),
                    content.block_count()
                )
            } else {
                issues.join("; ")
            },
        )
    }

    /// Every citation must carry a footnote whose tuple matches it and an
    /// observation in the pack holding exactly the cited value.
    fn grounding(content: &BriefingContent, pack: &DataPack) -> BannerCheck {
        let mut ungrounded = Vec::new();
        for citation in content.citations() {
            let footnoted = citation.footnote.and_then(|index| {
                content.footnotes.iter().find(|f| f.index == index)
            });
            let footnote_matches = footnoted.map_or(false, |f| {
                f.series_key == citation.series_key
                    && f.period == citation.period
                    && Some(f.value) == citation.value
            });
            let held = pack
                .find_observation(&citation.series_key, citation.period)
                .and_then(|o| o.value);
            let in_pack = matches!((citation.value, held), (Some(cited), Some(held)) if cited == held);

            if !(footnote_matches && in_pack) {
                ungrounded.push(format!("{} {}", citation.series_key, citation.period));
            }
        }

        let total = content.citations().count();
        BannerCheck::critical(
            "citations_grounded",
            ungrounded.is_empty(),
            if ungrounded.is_empty() {
                format!(
                    "{} citations resolved to {} footnotes",
                    total,
                    content.footnotes.len()
                )
            } else {
                format!("Unverified citations: {}", ungrounded.join(", "))
            },
        )
    }

    fn staleness(&self, pack: &DataPack, reference: NaiveDate) -> BannerCheck {
        let stale: Vec<String> = pack
            .series
            .values()
            .filter_map(|s| {
                let latest = s.observations.last()?.period;
                let fresh =
                    self.config
                        .freshness
                        .is_fresh(s.metadata.frequency, latest, reference);
                (!fresh).then(|| format!("{} ({})", s.key(), latest))
            })
            .collect();

        BannerCheck::quality(
            "staleness",
            stale.is_empty(),
            if stale.is_empty() {
                format!("All series current as of {}", reference)
            } else {
                format!("Stale relative to {}: {}", reference, stale.join(", "))
            },
        )
    }

    fn coverage(&self, content: &BriefingContent) -> BannerCheck {
        let uncovered: Vec<&str> = content
            .sections
            .iter()
            .filter(|s| !self.config.narrative_sections.iter().any(|n| n == &s.id))
            .filter(|s| {
                !s.blocks.iter().any(|b| {
                    !b.citations.is_empty() || matches!(b.payload, BlockPayload::ChartSpec { .. })
                })
            })
            .map(|s| s.id.as_str())
            .collect();

        BannerCheck::quality(
            "coverage",
            uncovered.is_empty(),
            if uncovered.is_empty() {
                "Every data section references the data pack".to_string()
            } else {
                format!("Sections without data references: {}", uncovered.join(", "))
            },
        )
    }

    fn citation_density(content: &BriefingContent) -> BannerCheck {
        let factual = |text: &str| text.chars().any(|c| c.is_ascii_digit() || c == '%');

        let mut uncited = 0usize;
        for block in content.blocks().filter(|b| b.citations.is_empty()) {
            let claims = match &block.payload {
                BlockPayload::Paragraph { text } => factual(text),
                BlockPayload::Bullets { items } => items.iter().any(|i| factual(i)),
                _ => false,
            };
            if claims {
                uncited += 1;
            }
        }

        BannerCheck::quality(
            "citation_density",
            uncited == 0,
            format!("{} numeric text blocks without citations", uncited),
        )
    }
}
