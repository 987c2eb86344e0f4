//! ReviseBriefingHandler - Command handler for chat edits.

use std::sync::Arc;

use crate::application::RevisionOrchestrator;
use crate::domain::briefing::{BriefingError, BriefingVersion, EditPackPolicy};
use crate::domain::foundation::{BriefingId, CommandMetadata, VersionId};

/// Command to revise a briefing from a chosen version.
#[derive(Debug, Clone)]
pub struct ReviseBriefingCommand {
    pub briefing_id: BriefingId,
    /// Version the edit applies to; need not be the latest. `None` edits
    /// the latest version.
    pub target_version_id: Option<VersionId>,
    pub instruction: String,
    /// Overrides the configured pack policy.
    pub pack_policy: Option<EditPackPolicy>,
}

/// Handler for revising briefings.
pub struct ReviseBriefingHandler {
    orchestrator: Arc<RevisionOrchestrator>,
}

impl ReviseBriefingHandler {
    pub fn new(orchestrator: Arc<RevisionOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub async fn handle(
        &self,
        cmd: ReviseBriefingCommand,
        metadata: CommandMetadata,
    ) -> Result<BriefingVersion, BriefingError> {
        self.orchestrator
            .revise(
                cmd.briefing_id,
                cmd.target_version_id,
                &cmd.instruction,
                cmd.pack_policy,
                &metadata,
            )
            .await
    }
}
