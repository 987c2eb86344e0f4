//! PreviewDataPackHandler - Query handler for previewing series availability.
//!
//! Builds the same pack a creation request would, without generation or
//! persistence.

use crate::application::DataPackBuilder;
use crate::config::DataPackConfig;
use crate::domain::briefing::{BriefingError, BriefingOptions};
use crate::domain::data_pack::DataPack;
use crate::domain::foundation::CommandMetadata;
use crate::domain::series::SeriesSelector;

use super::apply_lookback_limits;

/// Query to preview a data pack.
#[derive(Debug, Clone)]
pub struct PreviewDataPackQuery {
    pub topic: String,
    pub selectors: Vec<SeriesSelector>,
    /// Defaults to the configured lookback when absent.
    pub options: Option<BriefingOptions>,
}

/// Handler for data pack previews.
pub struct PreviewDataPackHandler {
    builder: DataPackBuilder,
    limits: DataPackConfig,
}

impl PreviewDataPackHandler {
    pub fn new(builder: DataPackBuilder) -> Self {
        Self {
            builder,
            limits: DataPackConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: DataPackConfig) -> Self {
        self.limits = limits;
        self
    }

    pub async fn handle(
        &self,
        query: PreviewDataPackQuery,
        metadata: CommandMetadata,
    ) -> Result<DataPack, BriefingError> {
        let options = apply_lookback_limits(&self.limits, query.options)?;

        tracing::debug!(
            user_id = %metadata.user_id,
            series = query.selectors.len(),
            "Previewing data pack"
        );
        self.builder
            .build(&query.topic, &query.selectors, &options)
            .await
    }
}
