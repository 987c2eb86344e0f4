//! Composition root - wires configuration to adapters and handlers.
//!
//! With a `database` section the PostgreSQL adapters are used; without one
//! everything runs in memory. With an OpenAI key the LLM generator (behind
//! the TTL cache when enabled) is used; without one every revision commits
//! the deterministic fallback document.

use std::sync::Arc;

use crate::adapters::ai::{OpenAIConfig, OpenAIProvider};
use crate::adapters::generation::{CachingGenerator, LlmBriefingGenerator, UnavailableGenerator};
use crate::adapters::memory::{InMemoryAnnotationRepository, InMemorySeriesStore, InMemoryVersionStore};
use crate::adapters::postgres::{
    self, PostgresAnnotationRepository, PostgresSeriesStore, PostgresVersionStore,
};
use crate::application::{
    AddCommentHandler, CreateBriefingHandler, DataPackBuilder, GetBriefingHandler,
    GetVersionHandler, ListChatHandler, ListCommentsHandler, ListVersionsHandler,
    PreviewDataPackHandler, ReviseBriefingHandler, RevisionOrchestrator, RevisionSettings,
};
use crate::config::{AppConfig, DataPackConfig, GenerationConfig, ValidationError};
use crate::domain::briefing::ContentValidator;
use crate::ports::{AIError, AnnotationRepository, BriefingGenerator, SeriesStore, VersionStore};

/// Errors while assembling the service graph.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("database unavailable: {0}")]
    Database(#[from] sqlx::Error),

    #[error("generation provider could not be built: {0}")]
    Provider(#[from] AIError),
}

/// Storage ports shared by every handler.
#[derive(Clone)]
pub struct Storage {
    pub series: Arc<dyn SeriesStore>,
    pub versions: Arc<dyn VersionStore>,
    pub annotations: Arc<dyn AnnotationRepository>,
}

impl Storage {
    /// Empty in-memory storage.
    pub fn in_memory() -> Self {
        let versions = InMemoryVersionStore::new();
        Self {
            series: Arc::new(InMemorySeriesStore::new()),
            annotations: Arc::new(InMemoryAnnotationRepository::new(versions.clone())),
            versions: Arc::new(versions),
        }
    }
}

/// Shared state from which handlers are created on demand.
#[derive(Clone)]
pub struct BriefingAppState {
    pub storage: Storage,
    pub orchestrator: Arc<RevisionOrchestrator>,
    pub builder: DataPackBuilder,
    pub limits: DataPackConfig,
}

impl BriefingAppState {
    /// Validates configuration, opens storage and builds the generator.
    pub async fn from_config(config: &AppConfig) -> Result<Self, BootstrapError> {
        config.validate()?;

        let storage = match &config.database {
            Some(database) => {
                let pool = postgres::connect(database).await?;
                Storage {
                    series: Arc::new(PostgresSeriesStore::new(pool.clone())),
                    versions: Arc::new(PostgresVersionStore::new(pool.clone())),
                    annotations: Arc::new(PostgresAnnotationRepository::new(pool)),
                }
            }
            None => {
                tracing::warn!("No database configured, using in-memory storage");
                Storage::in_memory()
            }
        };

        let generator = build_generator(&config.generation)?;
        Ok(Self::assemble(storage, generator, config))
    }

    /// Builds the state from already constructed ports.
    pub fn assemble(
        storage: Storage,
        generator: Arc<dyn BriefingGenerator>,
        config: &AppConfig,
    ) -> Self {
        let builder =
            DataPackBuilder::new(storage.series.clone()).with_tolerance(config.quality.freshness());
        let orchestrator = RevisionOrchestrator::new(
            builder.clone(),
            generator,
            storage.versions.clone(),
            storage.annotations.clone(),
        )
        .with_validator(ContentValidator::new(config.quality.to_quality_config()))
        .with_settings(RevisionSettings::from_config(
            &config.revision,
            &config.generation,
        ));

        Self {
            storage,
            orchestrator: Arc::new(orchestrator),
            builder,
            limits: config.data_pack,
        }
    }

    pub fn preview_data_pack_handler(&self) -> PreviewDataPackHandler {
        PreviewDataPackHandler::new(self.builder.clone()).with_limits(self.limits)
    }

    pub fn create_briefing_handler(&self) -> CreateBriefingHandler {
        CreateBriefingHandler::new(self.orchestrator.clone()).with_limits(self.limits)
    }

    pub fn revise_briefing_handler(&self) -> ReviseBriefingHandler {
        ReviseBriefingHandler::new(self.orchestrator.clone())
    }

    pub fn get_version_handler(&self) -> GetVersionHandler {
        GetVersionHandler::new(self.storage.versions.clone())
    }

    pub fn list_versions_handler(&self) -> ListVersionsHandler {
        ListVersionsHandler::new(self.storage.versions.clone())
    }

    pub fn get_briefing_handler(&self) -> GetBriefingHandler {
        GetBriefingHandler::new(self.storage.versions.clone())
    }

    pub fn add_comment_handler(&self) -> AddCommentHandler {
        AddCommentHandler::new(
            self.storage.versions.clone(),
            self.storage.annotations.clone(),
        )
    }

    pub fn list_chat_handler(&self) -> ListChatHandler {
        ListChatHandler::new(
            self.storage.versions.clone(),
            self.storage.annotations.clone(),
        )
    }

    pub fn list_comments_handler(&self) -> ListCommentsHandler {
        ListCommentsHandler::new(
            self.storage.versions.clone(),
            self.storage.annotations.clone(),
        )
    }
}

fn build_generator(config: &GenerationConfig) -> Result<Arc<dyn BriefingGenerator>, BootstrapError> {
    use secrecy::ExposeSecret;

    let key = match &config.openai_api_key {
        Some(key) if config.has_provider() => key,
        _ => {
            tracing::warn!("No generation provider configured, briefings will use fallback content");
            return Ok(Arc::new(UnavailableGenerator::new(
                "no generation provider configured",
            )));
        }
    };

    let provider = OpenAIProvider::new(
        OpenAIConfig::new(key.expose_secret().clone())
            .with_model(config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(config.timeout())
            .with_max_retries(config.max_retries),
    )?;
    let mut llm = LlmBriefingGenerator::new(Arc::new(provider));
    if let Some(max_tokens) = config.max_tokens {
        llm = llm.with_max_tokens(max_tokens);
    }

    tracing::info!(
        model = %config.model,
        cache = config.cache_enabled(),
        "Generation provider configured"
    );
    if config.cache_enabled() {
        Ok(Arc::new(CachingGenerator::new(
            Arc::new(llm),
            config.cache_ttl(),
            config.cache_capacity,
        )))
    } else {
        Ok(Arc::new(llm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[tokio::test]
    async fn defaults_build_in_memory_state() {
        let state = BriefingAppState::from_config(&AppConfig::default())
            .await
            .unwrap();

        assert_eq!(state.limits, DataPackConfig::default());
        assert_eq!(state.orchestrator.settings().max_commit_attempts, 5);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut config = AppConfig::default();
        config.revision.max_commit_attempts = 0;

        let result = BriefingAppState::from_config(&config).await;

        assert!(matches!(result, Err(BootstrapError::InvalidConfig(_))));
    }

    #[test]
    fn provider_key_selects_llm_generator() {
        let config = GenerationConfig {
            openai_api_key: Some(Secret::new("sk-test".to_string())),
            ..Default::default()
        };

        assert!(build_generator(&config).is_ok());
    }
}
