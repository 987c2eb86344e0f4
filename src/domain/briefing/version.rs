//! Briefing records and their immutable versions.

use serde::{Deserialize, Serialize};

use super::content::BriefingContent;
use super::input::InputSpec;
use super::validation::{BannerStatus, QualityBanner};
use crate::domain::data_pack::DataPack;
use crate::domain::foundation::{BriefingId, Timestamp, UserId, VersionId};

// ════════════════════════════════════════════════════════════════════════════════
// Briefing
// ════════════════════════════════════════════════════════════════════════════════

/// A briefing document. Holds only a pointer to its latest version; the
/// versions themselves live in the version store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Briefing {
    pub id: BriefingId,
    pub title: String,
    pub topic: String,
    pub created_by: UserId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub latest_version_id: Option<VersionId>,
}

impl Briefing {
    /// Creates a briefing with no versions yet.
    pub fn new(id: BriefingId, title: impl Into<String>, topic: impl Into<String>, created_by: UserId) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            title: title.into(),
            topic: topic.into(),
            created_by,
            created_at: now,
            updated_at: now,
            latest_version_id: None,
        }
    }

    /// Title from the generated metadata, else derived from the topic.
    pub fn title_for(topic: &str, content: &BriefingContent) -> String {
        if let Some(title) = content
            .briefing_meta
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            return title.to_string();
        }
        let mut chars = topic.trim().chars();
        match chars.next() {
            Some(first) => format!("{}{} briefing", first.to_uppercase(), chars.as_str()),
            None => "Untitled briefing".to_string(),
        }
    }

    /// Moves the latest pointer to a newly committed version.
    pub fn advance(&mut self, version: &BriefingVersion) {
        self.latest_version_id = Some(version.id);
        self.updated_at = version.created_at;
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Versions
// ════════════════════════════════════════════════════════════════════════════════

/// A validated candidate waiting for a version number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVersion {
    pub id: VersionId,
    pub briefing_id: BriefingId,
    pub parent_version_id: Option<VersionId>,
    pub input_spec: InputSpec,
    pub data_pack: DataPack,
    pub content: BriefingContent,
    pub banner: QualityBanner,
    pub change_summary: Option<String>,
    pub fallback_used: bool,
    pub created_by: UserId,
}

/// Immutable snapshot of a briefing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingVersion {
    pub id: VersionId,
    pub briefing_id: BriefingId,
    /// Starts at 1 and increases without gaps per briefing.
    pub version_number: u32,
    pub parent_version_id: Option<VersionId>,
    pub input_spec: InputSpec,
    pub data_pack: DataPack,
    pub content: BriefingContent,
    pub banner: QualityBanner,
    pub change_summary: Option<String>,
    pub fallback_used: bool,
    pub created_by: UserId,
    pub created_at: Timestamp,
}

impl BriefingVersion {
    /// Seals a candidate with its assigned number and commit time.
    pub fn seal(new: NewVersion, version_number: u32, created_at: Timestamp) -> Self {
        Self {
            id: new.id,
            briefing_id: new.briefing_id,
            version_number,
            parent_version_id: new.parent_version_id,
            input_spec: new.input_spec,
            data_pack: new.data_pack,
            content: new.content,
            banner: new.banner,
            change_summary: new.change_summary,
            fallback_used: new.fallback_used,
            created_by: new.created_by,
            created_at,
        }
    }

    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            id: self.id,
            briefing_id: self.briefing_id,
            version_number: self.version_number,
            parent_version_id: self.parent_version_id,
            change_summary: self.change_summary.clone(),
            banner_status: self.banner.status,
            fallback_used: self.fallback_used,
            data_pack_hash: self.data_pack.data_pack_hash.clone(),
            created_by: self.created_by.clone(),
            created_at: self.created_at,
        }
    }
}

/// Lightweight listing entry for a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub id: VersionId,
    pub briefing_id: BriefingId,
    pub version_number: u32,
    pub parent_version_id: Option<VersionId>,
    pub change_summary: Option<String>,
    pub banner_status: BannerStatus,
    pub fallback_used: bool,
    pub data_pack_hash: String,
    pub created_by: UserId,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::briefing::content::BriefingMeta;

    #[test]
    fn title_prefers_generated_metadata() {
        let content = BriefingContent {
            briefing_meta: BriefingMeta {
                title: Some("Prices ease again".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(Briefing::title_for("inflation", &content), "Prices ease again");
    }

    #[test]
    fn title_falls_back_to_topic() {
        let content = BriefingContent::default();
        assert_eq!(Briefing::title_for("inflation", &content), "Inflation briefing");
        assert_eq!(Briefing::title_for("  ", &content), "Untitled briefing");
    }

    #[test]
    fn new_briefing_has_no_latest_version() {
        let briefing = Briefing::new(BriefingId::new(), "t", "inflation", UserId::system());
        assert!(briefing.latest_version_id.is_none());
        assert_eq!(briefing.created_at, briefing.updated_at);
    }
}
