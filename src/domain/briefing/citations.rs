//! Citation grounding and footnote assignment.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use super::content::{BriefingContent, Footnote};
use crate::domain::data_pack::DataPack;

/// A citation that could not be verified against the data pack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GroundingError {
    #[error("citation at {location} references series '{series_key}' which is not in the data pack")]
    Ungrounded { series_key: String, location: String },

    #[error(
        "citation at {location} for '{series_key}' {period} cites {cited:?} but the data pack holds {stored:?}"
    )]
    Mismatch {
        series_key: String,
        period: NaiveDate,
        cited: Option<f64>,
        stored: Option<f64>,
        location: String,
    },
}

/// Footnote identity: series, period, exact value bits, note.
type FootnoteKey = (String, NaiveDate, u64, Option<String>);

/// Verifies citations against a data pack and numbers footnotes.
///
/// Blocks are walked in document order. The first citation of each unique
/// `(series_key, period, value, note)` tuple receives the next footnote
/// index; later citations of the same tuple share it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CitationResolver;

impl CitationResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves every citation, returning the content with footnotes
    /// assigned, or the first citation that fails to ground. Resolved
    /// citations and footnotes carry the pack's value bits.
    pub fn resolve(
        &self,
        mut content: BriefingContent,
        pack: &DataPack,
    ) -> Result<BriefingContent, GroundingError> {
        let mut indices: HashMap<FootnoteKey, u32> = HashMap::new();
        let mut footnotes: Vec<Footnote> = Vec::new();

        for (s_idx, section) in content.sections.iter_mut().enumerate() {
            for (b_idx, block) in section.blocks.iter_mut().enumerate() {
                for (c_idx, citation) in block.citations.iter_mut().enumerate() {
                    let location = format!(
                        "sections[{}].blocks[{}].citations[{}]",
                        s_idx, b_idx, c_idx
                    );

                    let Some(series) = pack.get(&citation.series_key) else {
                        return Err(GroundingError::Ungrounded {
                            series_key: citation.series_key.clone(),
                            location,
                        });
                    };

                    let stored = series.observation(citation.period).and_then(|o| o.value);
                    let value = match (citation.value, stored) {
                        (Some(cited), Some(held)) if cited == held => held,
                        (cited, stored) => {
                            return Err(GroundingError::Mismatch {
                                series_key: citation.series_key.clone(),
                                period: citation.period,
                                cited,
                                stored,
                                location,
                            });
                        }
                    };

                    citation.value = Some(value);
                    let key = (
                        citation.series_key.clone(),
                        citation.period,
                        value.to_bits(),
                        citation.note.clone(),
                    );
                    let index = match indices.get(&key) {
                        Some(index) => *index,
                        None => {
                            let index = footnotes.len() as u32 + 1;
                            let meta = &series.metadata;
                            footnotes.push(Footnote {
                                index,
                                series_key: citation.series_key.clone(),
                                period: citation.period,
                                value,
                                note: citation.note.clone(),
                                source: format!(
                                    "{} ({}:{}), {}",
                                    meta.name, meta.source, meta.series_id, citation.period
                                ),
                            });
                            indices.insert(key, index);
                            index
                        }
                    };
                    citation.footnote = Some(index);
                }
            }
        }

        content.footnotes = footnotes;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::briefing::content::{Block, Citation, Section};
    use crate::domain::data_pack::test_support::{monthly_series, pack_of};
    use proptest::prelude::*;

    fn d(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, 1).unwrap()
    }

    fn pack() -> DataPack {
        pack_of(vec![
            monthly_series("cpi", &[Some(4.0), Some(3.4), None]),
            monthly_series("gdp", &[Some(0.1), Some(0.2), Some(0.3)]),
        ])
    }

    fn doc(citations: Vec<Vec<Citation>>) -> BriefingContent {
        let blocks = citations
            .into_iter()
            .map(|cs| {
                let mut block = Block::paragraph("Figures moved.");
                block.citations = cs;
                block
            })
            .collect();
        BriefingContent {
            sections: vec![Section::new("summary", "Summary", blocks)],
            ..Default::default()
        }
    }

    #[test]
    fn absent_series_is_ungrounded() {
        let content = doc(vec![vec![Citation::new("X", d(1), 4.0)]]);

        let err = CitationResolver::new().resolve(content, &pack()).unwrap_err();

        assert!(matches!(err, GroundingError::Ungrounded { ref series_key, .. } if series_key == "X"));
    }

    #[test]
    fn near_miss_value_is_a_mismatch() {
        let content = doc(vec![vec![Citation::new("cpi", d(2), 3.4000001)]]);

        let err = CitationResolver::new().resolve(content, &pack()).unwrap_err();

        assert!(matches!(err, GroundingError::Mismatch { stored: Some(v), .. } if v == 3.4));
    }

    #[test]
    fn unknown_period_is_a_mismatch() {
        let content = doc(vec![vec![Citation::new("cpi", d(9), 4.0)]]);
        let err = CitationResolver::new().resolve(content, &pack()).unwrap_err();
        assert!(matches!(err, GroundingError::Mismatch { stored: None, .. }));
    }

    #[test]
    fn missing_observation_cannot_be_cited() {
        let mut citation = Citation::new("cpi", d(3), 0.0);
        citation.value = None;
        let err = CitationResolver::new()
            .resolve(doc(vec![vec![citation]]), &pack())
            .unwrap_err();
        assert!(matches!(err, GroundingError::Mismatch { cited: None, stored: None, .. }));
    }

    #[test]
    fn footnotes_are_first_seen_and_shared() {
        let content = doc(vec![
            vec![Citation::new("gdp", d(3), 0.3), Citation::new("cpi", d(1), 4.0)],
            vec![Citation::new("cpi", d(1), 4.0), Citation::new("gdp", d(1), 0.1)],
        ]);

        let resolved = CitationResolver::new().resolve(content, &pack()).unwrap();

        let indices: Vec<_> = resolved.citations().map(|c| c.footnote.unwrap()).collect();
        assert_eq!(indices, vec![1, 2, 2, 3]);
        assert_eq!(resolved.footnotes.len(), 3);
        assert_eq!(resolved.footnotes[0].series_key, "gdp");
        assert_eq!(resolved.footnotes[1].source, "cpi series (ONS:CPI), 2024-01-01");
    }

    #[test]
    fn different_note_gets_its_own_footnote() {
        let content = doc(vec![vec![
            Citation::new("cpi", d(1), 4.0),
            Citation::new("cpi", d(1), 4.0).with_note("peak"),
        ]]);

        let resolved = CitationResolver::new().resolve(content, &pack()).unwrap();

        assert_eq!(resolved.footnotes.len(), 2);
    }

    #[test]
    fn resolution_overwrites_stale_footnote_indices() {
        let mut citation = Citation::new("cpi", d(1), 4.0);
        citation.footnote = Some(7);

        let resolved = CitationResolver::new()
            .resolve(doc(vec![vec![citation]]), &pack())
            .unwrap();

        assert_eq!(resolved.citations().next().unwrap().footnote, Some(1));
    }

    #[test]
    fn signed_zero_takes_the_stored_bits() {
        let pack = pack_of(vec![monthly_series("trade", &[Some(0.0)])]);
        let content = doc(vec![
            vec![Citation::new("trade", d(1), -0.0)],
            vec![Citation::new("trade", d(1), 0.0)],
        ]);

        let resolved = CitationResolver::new().resolve(content, &pack).unwrap();

        assert_eq!(resolved.footnotes.len(), 1);
        assert_eq!(resolved.footnotes[0].value.to_bits(), 0.0f64.to_bits());
        assert!(resolved
            .citations()
            .all(|c| c.value.map(f64::to_bits) == Some(0.0f64.to_bits()) && c.footnote == Some(1)));
    }

    proptest! {
        #[test]
        fn footnote_numbering_is_reproducible(picks in proptest::collection::vec((0usize..2, 1u32..=3), 0..20)) {
            let pack = pack();
            let citations: Vec<Citation> = picks
                .iter()
                .map(|(s, m)| {
                    let key = if *s == 0 { "gdp" } else { "cpi" };
                    let value = pack.find_observation(key, d(*m)).and_then(|o| o.value);
                    (key, *m, value)
                })
                .filter_map(|(key, m, value)| value.map(|v| Citation::new(key, d(m), v)))
                .collect();

            let first = CitationResolver::new().resolve(doc(vec![citations.clone()]), &pack).unwrap();
            let second = CitationResolver::new().resolve(doc(vec![citations]), &pack).unwrap();

            prop_assert_eq!(&first, &second);
            let max = first.citations().filter_map(|c| c.footnote).max().unwrap_or(0);
            prop_assert_eq!(max as usize, first.footnotes.len());
        }
    }
}
