//! Revision pipeline configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::briefing::{EditPackPolicy, GroundingFailurePolicy};

/// How the orchestrator commits and recovers.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct RevisionConfig {
    /// Attempts at committing a validated candidate before giving up on
    /// repeated version conflicts
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,

    /// Outcome when citations still fail to ground after the corrective retry
    #[serde(default)]
    pub grounding_failure_policy: GroundingFailurePolicy,

    /// Pack policy for edits that do not choose one
    #[serde(default)]
    pub default_edit_pack_policy: EditPackPolicy,
}

impl RevisionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_commit_attempts == 0 {
            return Err(ValidationError::MustBePositive("revision.max_commit_attempts"));
        }
        Ok(())
    }
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: default_max_commit_attempts(),
            grounding_failure_policy: GroundingFailurePolicy::default(),
            default_edit_pack_policy: EditPackPolicy::default(),
        }
    }
}

fn default_max_commit_attempts() -> u32 {
    5
}
