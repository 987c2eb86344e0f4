//! Briefing command and query handlers.

mod add_comment;
mod create_briefing;
mod get_briefing;
mod get_version;
mod list_chat;
mod list_comments;
mod list_versions;
mod preview_data_pack;
mod revise_briefing;

pub use add_comment::{AddCommentCommand, AddCommentHandler};
pub use create_briefing::{CreateBriefingCommand, CreateBriefingHandler, CreateBriefingResult};
pub use get_briefing::{BriefingDetail, GetBriefingHandler, GetBriefingQuery};
pub use get_version::{GetVersionHandler, GetVersionQuery};
pub use list_chat::{ListChatHandler, ListChatQuery};
pub use list_comments::{ListCommentsHandler, ListCommentsQuery};
pub use list_versions::{ListVersionsHandler, ListVersionsQuery};
pub use preview_data_pack::{PreviewDataPackHandler, PreviewDataPackQuery};
pub use revise_briefing::{ReviseBriefingCommand, ReviseBriefingHandler};

use crate::config::DataPackConfig;
use crate::domain::briefing::{BriefingError, BriefingOptions};
use crate::domain::foundation::ValidationError;
use crate::domain::series::LookbackWindow;

/// Fills in the configured default window and enforces the lookback cap.
fn apply_lookback_limits(
    limits: &DataPackConfig,
    options: Option<BriefingOptions>,
) -> Result<BriefingOptions, BriefingError> {
    let options =
        options.unwrap_or_else(|| BriefingOptions::default().with_window(limits.default_window()));
    if let LookbackWindow::Periods { count } = options.window {
        if count > limits.max_lookback_periods {
            return Err(ValidationError::out_of_range(
                "lookback_periods",
                1,
                i64::from(limits.max_lookback_periods),
                i64::from(count),
            )
            .into());
        }
    }
    Ok(options)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use serde_json::{json, Value};

    use crate::adapters::generation::ScriptedBriefingGenerator;
    use crate::adapters::memory::{
        InMemoryAnnotationRepository, InMemorySeriesStore, InMemoryVersionStore,
    };
    use crate::application::{DataPackBuilder, RevisionOrchestrator};
    use crate::domain::series::{Frequency, Observation, SeriesDescriptor, SeriesSource};

    pub struct Harness {
        pub series: Arc<InMemorySeriesStore>,
        pub versions: InMemoryVersionStore,
        pub annotations: Arc<InMemoryAnnotationRepository>,
        pub orchestrator: Arc<RevisionOrchestrator>,
    }

    pub fn grounded_content() -> Value {
        json!({
            "sections": [{
                "id": "summary",
                "title": "Summary",
                "blocks": [{
                    "type": "paragraph",
                    "content": "Output grew 0.6% in the latest quarter.",
                    "citations": [{"series_key": "gdp", "period": "2024-04-01", "value": 0.6}]
                }]
            }]
        })
    }

    pub async fn harness(generator: ScriptedBriefingGenerator) -> Harness {
        let series = Arc::new(InMemorySeriesStore::new());
        series
            .insert(
                SeriesDescriptor::new("gdp", SeriesSource::Ons, "IHYQ", "GDP quarterly growth", Frequency::Quarterly)
                    .with_unit("%"),
                vec![
                    Observation::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 0.7),
                    Observation::new(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), 0.6),
                ],
            )
            .await;
        let versions = InMemoryVersionStore::new();
        let annotations = Arc::new(InMemoryAnnotationRepository::new(versions.clone()));
        let orchestrator = Arc::new(RevisionOrchestrator::new(
            DataPackBuilder::new(series.clone()),
            Arc::new(generator),
            Arc::new(versions.clone()),
            annotations.clone(),
        ));
        Harness {
            series,
            versions,
            annotations,
            orchestrator,
        }
    }
}
