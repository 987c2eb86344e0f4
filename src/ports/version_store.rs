//! Version Store Port - The append-only version chain.
//!
//! # Contract
//!
//! - Version numbers per briefing are `1..=N` with no gaps or duplicates.
//! - `commit` reads the current maximum, inserts `max + 1` and moves the
//!   briefing's latest pointer as one indivisible unit per briefing.
//! - Readers only ever see committed versions; a version is never updated
//!   or deleted once written.

use async_trait::async_trait;

use crate::domain::briefing::{Briefing, BriefingVersion, NewVersion, VersionSummary};
use crate::domain::foundation::{BriefingId, VersionId};

/// Persistence for briefings and their immutable versions.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Inserts a new briefing together with its first version.
    ///
    /// The first version is numbered 1. Nothing is written on failure.
    async fn create(
        &self,
        briefing: Briefing,
        first: NewVersion,
    ) -> Result<BriefingVersion, VersionStoreError>;

    /// Appends a version to an existing briefing.
    ///
    /// # Errors
    ///
    /// - `BriefingNotFound` if the briefing does not exist
    /// - `Conflict` if a concurrent commit claimed the same number; the
    ///   caller may retry with the same candidate
    async fn commit(&self, version: NewVersion) -> Result<BriefingVersion, VersionStoreError>;

    /// Loads a briefing record.
    async fn get_briefing(&self, id: BriefingId) -> Result<Option<Briefing>, VersionStoreError>;

    /// Loads a version, only if it belongs to the briefing.
    async fn get(
        &self,
        briefing_id: BriefingId,
        version_id: VersionId,
    ) -> Result<Option<BriefingVersion>, VersionStoreError>;

    /// Lists version summaries ascending by version number.
    async fn list(&self, briefing_id: BriefingId) -> Result<Vec<VersionSummary>, VersionStoreError>;
}

/// Version store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionStoreError {
    #[error("briefing not found: {0}")]
    BriefingNotFound(BriefingId),

    #[error("briefing already exists: {0}")]
    BriefingExists(BriefingId),

    #[error("concurrent commit on briefing {0}")]
    Conflict(BriefingId),

    #[error("storage error: {0}")]
    Storage(String),
}

impl VersionStoreError {
    /// True when retrying the same commit may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, VersionStoreError::Conflict(_))
    }
}
