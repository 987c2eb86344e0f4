//! Render model: the typed section/block tree stored in each version.

use std::convert::TryFrom;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════════
// Citation & Footnote
// ════════════════════════════════════════════════════════════════════════════════

/// Reference from a block to one observation in the data pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub series_key: String,
    #[serde(rename = "period_start", alias = "period")]
    pub period: NaiveDate,
    /// `None` when the generator emitted a null value; never groundable.
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Footnote index assigned by citation resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footnote: Option<u32>,
}

impl Citation {
    pub fn new(series_key: impl Into<String>, period: NaiveDate, value: f64) -> Self {
        Self {
            series_key: series_key.into(),
            period,
            value: Some(value),
            note: None,
            footnote: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Numbered source note produced by citation resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footnote {
    pub index: u32,
    pub series_key: String,
    #[serde(rename = "period_start")]
    pub period: NaiveDate,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Human-readable source line, e.g. `CPI (ONS:L522), 2024-01-01`.
    pub source: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Block payloads
// ════════════════════════════════════════════════════════════════════════════════

/// Points of one series drawn in a chart block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub series_key: String,
    #[serde(default)]
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    #[serde(alias = "period_start")]
    pub period: NaiveDate,
    pub value: Option<f64>,
}

/// Typed payload of a block, one variant per recognised block type.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockPayload {
    Paragraph {
        text: String,
    },
    Bullets {
        items: Vec<String>,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    ChartSpec {
        title: Option<String>,
        unit: Option<String>,
        series: Vec<ChartSeries>,
    },
    Callout {
        tone: Option<String>,
        text: String,
    },
}

impl BlockPayload {
    /// Wire name of the block type.
    pub fn type_name(&self) -> &'static str {
        match self {
            BlockPayload::Paragraph { .. } => "paragraph",
            BlockPayload::Bullets { .. } => "bullets",
            BlockPayload::Table { .. } => "table",
            BlockPayload::ChartSpec { .. } => "chart_spec",
            BlockPayload::Callout { .. } => "callout",
        }
    }

    fn content_value(&self) -> Value {
        match self {
            BlockPayload::Paragraph { text } => json!({ "text": text }),
            BlockPayload::Bullets { items } => json!({ "items": items }),
            BlockPayload::Table { columns, rows } => json!({ "columns": columns, "rows": rows }),
            BlockPayload::ChartSpec {
                title,
                unit,
                series,
            } => {
                let mut value = json!({ "series": series });
                if let Some(title) = title {
                    value["title"] = json!(title);
                }
                if let Some(unit) = unit {
                    value["unit"] = json!(unit);
                }
                value
            }
            BlockPayload::Callout { tone, text } => match tone {
                Some(tone) => json!({ "tone": tone, "text": text }),
                None => json!({ "text": text }),
            },
        }
    }
}

/// Why a raw block could not be decoded into a typed block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("unknown block type '{0}'")]
    UnknownType(String),

    #[error("{kind} block payload is malformed: {reason}")]
    Malformed { kind: &'static str, reason: String },

    #[error("{kind} block violates its schema: {reason}")]
    Constraint { kind: &'static str, reason: String },
}

impl BlockError {
    fn constraint(kind: &'static str, reason: impl Into<String>) -> Self {
        BlockError::Constraint {
            kind,
            reason: reason.into(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Block
// ════════════════════════════════════════════════════════════════════════════════

/// Wire shape of a block: `{type, content, citations}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
}

/// One typed content block with optional citations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub struct Block {
    pub payload: BlockPayload,
    pub citations: Vec<Citation>,
}

impl Block {
    pub fn new(payload: BlockPayload) -> Self {
        Self {
            payload,
            citations: Vec::new(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockPayload::Paragraph { text: text.into() })
    }

    pub fn callout(tone: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(BlockPayload::Callout {
            tone: Some(tone.into()),
            text: text.into(),
        })
    }

    pub fn with_citation(mut self, citation: Citation) -> Self {
        self.citations.push(citation);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.payload.type_name()
    }

    /// Re-applies the payload schema of this block's type.
    pub fn validate(&self) -> Result<(), BlockError> {
        Block::try_from(RawBlock::from(self.clone())).map(|_| ())
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        RawBlock {
            kind: block.payload.type_name().to_string(),
            content: block.payload.content_value(),
            citations: block.citations,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextContent {
    Plain(String),
    Object { text: String },
}

impl TextContent {
    fn into_text(self) -> String {
        match self {
            TextContent::Plain(text) | TextContent::Object { text } => text,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BulletsContent {
    Plain(Vec<String>),
    Object { items: Vec<String> },
}

#[derive(Deserialize)]
struct TableContent {
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct ChartContent {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    series: Vec<ChartSeries>,
}

#[derive(Deserialize)]
struct CalloutContent {
    #[serde(default, alias = "variant")]
    tone: Option<String>,
    text: String,
}

fn decode<T: serde::de::DeserializeOwned>(kind: &'static str, content: Value) -> Result<T, BlockError> {
    serde_json::from_value(content).map_err(|e| BlockError::Malformed {
        kind,
        reason: e.to_string(),
    })
}

impl TryFrom<RawBlock> for Block {
    type Error = BlockError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let payload = match raw.kind.as_str() {
            "paragraph" => {
                let text = decode::<TextContent>("paragraph", raw.content)?.into_text();
                if text.trim().is_empty() {
                    return Err(BlockError::constraint("paragraph", "text is empty"));
                }
                BlockPayload::Paragraph { text }
            }
            "bullets" => {
                let items = match decode::<BulletsContent>("bullets", raw.content)? {
                    BulletsContent::Plain(items) | BulletsContent::Object { items } => items,
                };
                if items.is_empty() {
                    return Err(BlockError::constraint("bullets", "items are empty"));
                }
                if items.iter().any(|item| item.trim().is_empty()) {
                    return Err(BlockError::constraint("bullets", "an item is blank"));
                }
                BlockPayload::Bullets { items }
            }
            "table" => {
                let table = decode::<TableContent>("table", raw.content)?;
                if table.columns.is_empty() {
                    return Err(BlockError::constraint("table", "columns are empty"));
                }
                if let Some((idx, row)) = table
                    .rows
                    .iter()
                    .enumerate()
                    .find(|(_, row)| row.len() != table.columns.len())
                {
                    return Err(BlockError::constraint(
                        "table",
                        format!(
                            "row {} has {} cells, expected {}",
                            idx,
                            row.len(),
                            table.columns.len()
                        ),
                    ));
                }
                BlockPayload::Table {
                    columns: table.columns,
                    rows: table.rows,
                }
            }
            "chart_spec" => {
                let chart = decode::<ChartContent>("chart_spec", raw.content)?;
                if chart.series.is_empty() {
                    return Err(BlockError::constraint("chart_spec", "no series referenced"));
                }
                if chart.series.iter().all(|s| s.points.is_empty()) {
                    return Err(BlockError::constraint("chart_spec", "no series has any points"));
                }
                BlockPayload::ChartSpec {
                    title: chart.title,
                    unit: chart.unit,
                    series: chart.series,
                }
            }
            "callout" => {
                let callout = decode::<CalloutContent>("callout", raw.content)?;
                if callout.text.trim().is_empty() {
                    return Err(BlockError::constraint("callout", "text is empty"));
                }
                BlockPayload::Callout {
                    tone: callout.tone,
                    text: callout.text,
                }
            }
            other => return Err(BlockError::UnknownType(other.to_string())),
        };

        Ok(Block {
            payload,
            citations: raw.citations,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Document
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            blocks,
        }
    }
}

/// Document-level metadata echoed by the generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedRange {
    pub start: String,
    pub end: String,
}

/// Chart the generator recommends rendering alongside the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRecommendation {
    pub chart_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub series_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_range: Option<SuggestedRange>,
}

/// A complete render-model document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingContent {
    #[serde(default)]
    pub briefing_meta: BriefingMeta,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommended_charts: Vec<ChartRecommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footnotes: Vec<Footnote>,
}

impl BriefingContent {
    /// Iterates over every block in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| s.blocks.iter())
    }

    /// Iterates over every citation in document order.
    pub fn citations(&self) -> impl Iterator<Item = &Citation> {
        self.blocks().flat_map(|b| b.citations.iter())
    }

    pub fn block_count(&self) -> usize {
        self.blocks().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(value: Value) -> Result<Block, BlockError> {
        let raw: RawBlock = serde_json::from_value(value).unwrap();
        Block::try_from(raw)
    }

    #[test]
    fn paragraph_accepts_object_or_plain_text() {
        let a = raw(json!({"type": "paragraph", "content": {"text": "Inflation eased."}})).unwrap();
        let b = raw(json!({"type": "paragraph", "content": "Inflation eased."})).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.type_name(), "paragraph");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = raw(json!({"type": "video", "content": {}})).unwrap_err();
        assert_eq!(err, BlockError::UnknownType("video".to_string()));
    }

    #[test]
    fn table_requires_columns() {
        let err = raw(json!({"type": "table", "content": {"columns": [], "rows": []}})).unwrap_err();
        assert!(matches!(err, BlockError::Constraint { kind: "table", .. }));
    }

    #[test]
    fn table_rows_must_match_column_count() {
        let err = raw(json!({
            "type": "table",
            "content": {"columns": ["Period", "Value"], "rows": [["2024-01", 1.2], ["2024-02"]]}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("row 1 has 1 cells, expected 2"));
    }

    #[test]
    fn chart_requires_a_series_with_points() {
        let empty = raw(json!({"type": "chart_spec", "content": {"series": []}}));
        assert!(empty.is_err());

        let pointless = raw(json!({
            "type": "chart_spec",
            "content": {"series": [{"series_key": "cpi", "points": []}]}
        }));
        assert!(pointless.is_err());

        let ok = raw(json!({
            "type": "chart_spec",
            "content": {"series": [{"series_key": "cpi", "points": [{"period": "2024-01-01", "value": 2.0}]}]}
        }));
        assert!(ok.is_ok());
    }

    #[test]
    fn bullets_reject_empty_list() {
        assert!(raw(json!({"type": "bullets", "content": {"items": []}})).is_err());
        assert!(raw(json!({"type": "bullets", "content": ["a", "b"]})).is_ok());
    }

    #[test]
    fn malformed_payload_is_reported() {
        let err = raw(json!({"type": "callout", "content": {"tone": "risk"}})).unwrap_err();
        assert!(matches!(err, BlockError::Malformed { kind: "callout", .. }));
    }

    #[test]
    fn constructed_blocks_are_revalidated() {
        assert!(Block::paragraph("CPI rose.").validate().is_ok());
        assert!(Block::paragraph("  ").validate().is_err());
        assert!(Block::new(BlockPayload::Table {
            columns: vec!["a".into(), "b".into()],
            rows: vec![vec![json!(1)]],
        })
        .validate()
        .is_err());
    }

    #[test]
    fn block_serializes_to_wire_shape() {
        let block = Block::paragraph("CPI rose.").with_citation(Citation::new(
            "cpi",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            4.0,
        ));

        let value = serde_json::to_value(&block).unwrap();

        assert_eq!(value["type"], "paragraph");
        assert_eq!(value["content"]["text"], "CPI rose.");
        assert_eq!(value["citations"][0]["period_start"], "2024-01-01");
        let back: Block = serde_json::from_value(value).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn content_iterates_citations_in_document_order() {
        let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
        let content = BriefingContent {
            sections: vec![
                Section::new("a", "A", vec![Block::paragraph("x").with_citation(Citation::new("cpi", d(1), 1.0))]),
                Section::new("b", "B", vec![Block::paragraph("y").with_citation(Citation::new("gdp", d(2), 2.0))]),
            ],
            ..Default::default()
        };

        let keys: Vec<_> = content.citations().map(|c| c.series_key.as_str()).collect();
        assert_eq!(keys, vec!["cpi", "gdp"]);
        assert_eq!(content.block_count(), 2);
    }
}
