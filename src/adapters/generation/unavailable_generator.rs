//! Generator used when no provider is configured.

use async_trait::async_trait;

use crate::ports::{BriefingGenerator, GeneratedDraft, GenerationError, GenerationRequest};

/// Always reports generation as unavailable, so every revision commits the
/// deterministic fallback document.
#[derive(Debug, Clone, Default)]
pub struct UnavailableGenerator {
    reason: String,
}

impl UnavailableGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl BriefingGenerator for UnavailableGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedDraft, GenerationError> {
        Err(GenerationError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::briefing::BriefingOptions;
    use crate::domain::data_pack::test_support::pack_of;

    #[tokio::test]
    async fn always_unavailable() {
        let generator = UnavailableGenerator::new("no generation provider configured");
        let request = GenerationRequest::create("t", "i", BriefingOptions::default(), pack_of(vec![]));

        assert_eq!(
            generator.generate(&request).await,
            Err(GenerationError::Unavailable(
                "no generation provider configured".to_string()
            ))
        );
    }
}
