//! CreateBriefingHandler - Command handler for creating briefings.

use std::sync::Arc;

use crate::application::RevisionOrchestrator;
use crate::config::DataPackConfig;
use crate::domain::briefing::{Briefing, BriefingError, BriefingOptions, BriefingVersion, InputSpec};
use crate::domain::foundation::CommandMetadata;
use crate::domain::series::SeriesSelector;

use super::apply_lookback_limits;

/// Command to create a briefing from a topic, an instruction and series.
#[derive(Debug, Clone)]
pub struct CreateBriefingCommand {
    pub topic: String,
    pub instruction: String,
    pub selectors: Vec<SeriesSelector>,
    /// Defaults to the configured lookback when absent.
    pub options: Option<BriefingOptions>,
}

/// Result of a successful creation.
#[derive(Debug, Clone)]
pub struct CreateBriefingResult {
    pub briefing: Briefing,
    /// Always version number 1.
    pub version: BriefingVersion,
}

/// Handler for creating briefings.
pub struct CreateBriefingHandler {
    orchestrator: Arc<RevisionOrchestrator>,
    limits: DataPackConfig,
}

impl CreateBriefingHandler {
    pub fn new(orchestrator: Arc<RevisionOrchestrator>) -> Self {
        Self {
            orchestrator,
            limits: DataPackConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: DataPackConfig) -> Self {
        self.limits = limits;
        self
    }

    pub async fn handle(
        &self,
        cmd: CreateBriefingCommand,
        metadata: CommandMetadata,
    ) -> Result<CreateBriefingResult, BriefingError> {
        let options = apply_lookback_limits(&self.limits, cmd.options)?;
        let spec = InputSpec::create(cmd.topic, cmd.instruction, cmd.selectors, options);

        let created = self.orchestrator.create(spec, &metadata).await?;

        Ok(CreateBriefingResult {
            briefing: created.briefing,
            version: created.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::generation::ScriptedBriefingGenerator;
    use crate::application::handlers::briefing::test_support::{grounded_content, harness};
    use crate::domain::series::SeriesSource;
    use crate::ports::VersionStore;

    fn command(series_id: &str) -> CreateBriefingCommand {
        CreateBriefingCommand {
            topic: "growth".to_string(),
            instruction: "Brief the minister on GDP".to_string(),
            selectors: vec![SeriesSelector::new(SeriesSource::Ons, series_id)],
            options: None,
        }
    }

    #[tokio::test]
    async fn creates_version_one() {
        let h = harness(ScriptedBriefingGenerator::new().with_content(grounded_content())).await;
        let handler = CreateBriefingHandler::new(h.orchestrator.clone());

        let result = handler
            .handle(command("IHYQ"), CommandMetadata::test_fixture())
            .await
            .unwrap();

        assert_eq!(result.version.version_number, 1);
        assert_eq!(result.briefing.title, "Growth briefing");
        assert_eq!(result.version.created_by.as_str(), "test-analyst");
        let stored = h
            .versions
            .get_briefing(result.briefing.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.latest_version_id, Some(result.version.id));
    }

    #[tokio::test]
    async fn unknown_series_aborts_before_generation() {
        let h = harness(ScriptedBriefingGenerator::new().with_content(grounded_content())).await;
        let handler = CreateBriefingHandler::new(h.orchestrator.clone());

        let result = handler
            .handle(command("NOPE"), CommandMetadata::test_fixture())
            .await;

        assert_eq!(result.unwrap_err(), BriefingError::SeriesNotFound("ONS:NOPE".to_string()));
        assert_eq!(h.versions.briefing_count().await, 0);
    }

    #[tokio::test]
    async fn blank_instruction_is_invalid() {
        let h = harness(ScriptedBriefingGenerator::new()).await;
        let handler = CreateBriefingHandler::new(h.orchestrator.clone());
        let cmd = CreateBriefingCommand {
            instruction: "  ".to_string(),
            ..command("IHYQ")
        };

        let result = handler.handle(cmd, CommandMetadata::test_fixture()).await;

        assert!(matches!(result, Err(BriefingError::InvalidRequest(_))));
    }
}
