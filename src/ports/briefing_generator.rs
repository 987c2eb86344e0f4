//! Briefing Generator Port - The natural-language generation capability.
//!
//! Generation is treated as a black box: it receives the instruction, the
//! data pack and (for edits) the prior content, and returns an unvalidated
//! candidate document. Everything it returns is checked before storage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::briefing::{BriefingContent, BriefingOptions};
use crate::domain::data_pack::DataPack;

/// Produces candidate briefing documents.
#[async_trait]
pub trait BriefingGenerator: Send + Sync {
    /// Generates a candidate document for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDraft, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Create,
    Edit,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Create => "create",
            GenerationMode::Edit => "edit",
        }
    }
}

/// Everything the generator is allowed to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub topic: String,
    pub instruction: String,
    pub options: BriefingOptions,
    pub data_pack: DataPack,
    /// Current content of the version being edited.
    pub prior_content: Option<BriefingContent>,
    /// Extra instruction added on a corrective retry.
    pub corrective_note: Option<String>,
}

impl GenerationRequest {
    pub fn create(
        topic: impl Into<String>,
        instruction: impl Into<String>,
        options: BriefingOptions,
        data_pack: DataPack,
    ) -> Self {
        Self {
            mode: GenerationMode::Create,
            topic: topic.into(),
            instruction: instruction.into(),
            options,
            data_pack,
            prior_content: None,
            corrective_note: None,
        }
    }

    pub fn edit(
        topic: impl Into<String>,
        instruction: impl Into<String>,
        options: BriefingOptions,
        data_pack: DataPack,
        prior_content: BriefingContent,
    ) -> Self {
        Self {
            mode: GenerationMode::Edit,
            topic: topic.into(),
            instruction: instruction.into(),
            options,
            data_pack,
            prior_content: Some(prior_content),
            corrective_note: None,
        }
    }

    /// Returns a copy carrying a corrective note.
    pub fn with_corrective_note(&self, note: impl Into<String>) -> Self {
        let mut request = self.clone();
        request.corrective_note = Some(note.into());
        request
    }

    /// Stable fingerprint of the request, keyed on the pack hash rather
    /// than the full pack.
    pub fn fingerprint(&self) -> String {
        let payload = serde_json::json!({
            "topic": self.topic,
            "instruction": self.instruction,
            "options": self.options,
            "data_pack_hash": self.data_pack.data_pack_hash,
            "prior_content": self.prior_content,
            "corrective_note": self.corrective_note,
        });
        let mut hasher = Sha256::new();
        hasher.update(self.mode.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(payload.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// An unvalidated candidate returned by the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDraft {
    /// Raw render-model JSON.
    pub content: Value,
    pub change_summary: Option<String>,
}

impl GeneratedDraft {
    pub fn new(content: Value) -> Self {
        Self {
            content,
            change_summary: None,
        }
    }

    pub fn with_change_summary(mut self, summary: impl Into<String>) -> Self {
        self.change_summary = Some(summary.into());
        self
    }
}

/// Generation errors. All of them are recovered by the fallback document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation unavailable: {0}")]
    Unavailable(String),

    #[error("generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("generator returned malformed output: {0}")]
    Malformed(String),
}
