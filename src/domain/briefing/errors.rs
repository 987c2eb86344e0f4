//! Errors surfaced by briefing operations.

use thiserror::Error;

use super::citations::GroundingError;
use super::validation::StructuralRejection;
use crate::domain::foundation::{BriefingId, ErrorCode, ValidationError, VersionId};

/// Every way a briefing operation can end without a result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BriefingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ValidationError),

    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    #[error("Briefing not found: {0}")]
    BriefingNotFound(BriefingId),

    #[error("Version {version_id} not found for briefing {briefing_id}")]
    VersionNotFound {
        briefing_id: BriefingId,
        version_id: VersionId,
    },

    #[error("Ungrounded citation: {0}")]
    UngroundedCitation(String),

    #[error("Citation mismatch: {0}")]
    CitationMismatch(String),

    #[error("Structural validation failed: {0}")]
    StructuralValidationFailure(String),

    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Version conflict on briefing {0}")]
    VersionConflict(BriefingId),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BriefingError {
    /// Stable code for the transport layer.
    pub fn code(&self) -> ErrorCode {
        match self {
            BriefingError::InvalidRequest(_) => ErrorCode::ValidationFailed,
            BriefingError::SeriesNotFound(_) => ErrorCode::SeriesNotFound,
            BriefingError::BriefingNotFound(_) => ErrorCode::BriefingNotFound,
            BriefingError::VersionNotFound { .. } => ErrorCode::VersionNotFound,
            BriefingError::UngroundedCitation(_) => ErrorCode::UngroundedCitation,
            BriefingError::CitationMismatch(_) => ErrorCode::CitationMismatch,
            BriefingError::StructuralValidationFailure(_) => {
                ErrorCode::StructuralValidationFailure
            }
            BriefingError::GenerationUnavailable(_) => ErrorCode::GenerationUnavailable,
            BriefingError::VersionConflict(_) => ErrorCode::VersionConflict,
            BriefingError::Storage(_) => ErrorCode::DatabaseError,
        }
    }

    /// True for failures the caller caused.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BriefingError::InvalidRequest(_)
                | BriefingError::SeriesNotFound(_)
                | BriefingError::BriefingNotFound(_)
                | BriefingError::VersionNotFound { .. }
        )
    }
}

impl From<GroundingError> for BriefingError {
    fn from(err: GroundingError) -> Self {
        match err {
            GroundingError::Ungrounded { .. } => BriefingError::UngroundedCitation(err.to_string()),
            GroundingError::Mismatch { .. } => BriefingError::CitationMismatch(err.to_string()),
        }
    }
}

impl From<StructuralRejection> for BriefingError {
    fn from(err: StructuralRejection) -> Self {
        BriefingError::StructuralValidationFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn grounding_errors_map_to_taxonomy() {
        let ungrounded: BriefingError = GroundingError::Ungrounded {
            series_key: "X".to_string(),
            location: "sections[0].blocks[0].citations[0]".to_string(),
        }
        .into();
        assert_eq!(ungrounded.code(), ErrorCode::UngroundedCitation);

        let mismatch: BriefingError = GroundingError::Mismatch {
            series_key: "cpi".to_string(),
            period: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            cited: Some(1.0),
            stored: Some(1.1),
            location: "sections[0].blocks[0].citations[0]".to_string(),
        }
        .into();
        assert_eq!(mismatch.code(), ErrorCode::CitationMismatch);
    }

    #[test]
    fn structural_rejection_lists_issues() {
        let err: BriefingError = StructuralRejection {
            issues: vec!["a".to_string(), "b".to_string()],
        }
        .into();
        assert_eq!(err.to_string(), "Structural validation failed: a; b");
        assert!(!err.is_client_error());
    }

    #[test]
    fn not_found_errors_are_client_errors() {
        let err = BriefingError::VersionNotFound {
            briefing_id: BriefingId::new(),
            version_id: VersionId::new(),
        };
        assert!(err.is_client_error());
        assert_eq!(err.code().to_string(), "VERSION_NOT_FOUND");
    }
}
