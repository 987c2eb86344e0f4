//! Deterministic documents used when generation cannot be used.

use serde_json::json;

use super::content::{Block, BlockPayload, BriefingContent, BriefingMeta, Citation, Section};
use crate::domain::data_pack::DataPack;

/// Section that carries fallback notices and data limitations.
pub const NOTES_SECTION_ID: &str = "data_notes";

/// Builds schema-valid documents whose only citations are the latest
/// observation of each packed series, which always ground.
pub struct FallbackDocument;

impl FallbackDocument {
    /// Data-only document listing the latest observation of every series.
    pub fn data_only(topic: &str, pack: &DataPack, reason: &str) -> BriefingContent {
        let mut rows = Vec::new();
        let mut citations = Vec::new();
        let mut markdown_rows = Vec::new();

        for series in pack.series.values() {
            let Some(obs) = series.latest_valued() else {
                continue;
            };
            let Some(value) = obs.value else {
                continue;
            };
            let unit = series.metadata.unit.clone().unwrap_or_default();
            rows.push(vec![
                json!(series.metadata.name),
                json!(obs.period.to_string()),
                json!(value),
                json!(unit),
            ]);
            citations.push(Citation::new(series.key(), obs.period, value));
            markdown_rows.push(format!(
                "| {} | {} | {} | {} |",
                series.metadata.name, obs.period, value, unit
            ));
        }

        let mut latest = Block::new(BlockPayload::Table {
            columns: vec![
                "Series".to_string(),
                "Latest period".to_string(),
                "Value".to_string(),
                "Unit".to_string(),
            ],
            rows,
        });
        latest.citations = citations;

        let title = format!("Data-only briefing: {}", topic.trim());
        let mut markdown = format!(
            "# {}\n\n| Series | Latest period | Value | Unit |\n|---|---|---|---|\n",
            title
        );
        for row in &markdown_rows {
            markdown.push_str(row);
            markdown.push('\n');
        }

        BriefingContent {
            briefing_meta: BriefingMeta {
                title: Some(title),
                topic: Some(topic.to_string()),
                as_of: pack.as_of.map(|d| d.to_string()),
                ..Default::default()
            },
            sections: vec![
                Section::new("latest_data", "Latest data", vec![latest]),
                Self::notes_section(pack, reason),
            ],
            recommended_charts: Vec::new(),
            export_markdown: Some(markdown),
            footnotes: Vec::new(),
        }
    }

    /// Keeps the prior document and records that the edit was not applied.
    ///
    /// Only valid when the prior document's pack is reused unchanged.
    pub fn unchanged_edit(prior: &BriefingContent, instruction: &str, reason: &str) -> BriefingContent {
        let mut content = prior.clone();
        let notice = Block::callout(
            "warning",
            format!(
                "The requested edit \"{}\" was not applied: {}. Content is unchanged from the previous version.",
                instruction.trim(),
                reason
            ),
        );
        match content.sections.iter_mut().find(|s| s.id == NOTES_SECTION_ID) {
            Some(section) => section.blocks.insert(0, notice),
            None => content
                .sections
                .push(Section::new(NOTES_SECTION_ID, "Data notes", vec![notice])),
        }
        content.footnotes.clear();
        content
    }

    /// Change summary recorded on a fallback version.
    pub fn change_summary(reason: &str) -> String {
        format!("Fallback content used: {}.", reason)
    }

    fn notes_section(pack: &DataPack, reason: &str) -> Section {
        let mut blocks = vec![Block::callout(
            "warning",
            format!(
                "Narrative generation was unavailable ({}). This document lists the latest grounded observations only.",
                reason
            ),
        )];
        if !pack.data_limitations.is_empty() {
            blocks.push(Block::new(BlockPayload::Bullets {
                items: pack.data_limitations.clone(),
            }));
        }
        Section::new(NOTES_SECTION_ID, "Data notes", blocks)
    }
}
