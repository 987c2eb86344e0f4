//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `ECON_BRIEFINGS` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use econ_briefings::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod data_pack;
mod database;
mod error;
mod generation;
mod logging;
mod quality;
mod revision;

pub use data_pack::DataPackConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use generation::GenerationConfig;
pub use logging::LoggingConfig;
pub use quality::QualitySettings;
pub use revision::RevisionConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section except `database` has usable defaults. Without a database
/// the in-memory adapters are used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection; absent means in-memory storage
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub revision: RevisionConfig,

    #[serde(default)]
    pub quality: QualitySettings,

    #[serde(default)]
    pub data_pack: DataPackConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `ECON_BRIEFINGS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `ECON_BRIEFINGS__DATABASE__URL=...` -> `database.url = ...`
    /// - `ECON_BRIEFINGS__GENERATION__TIMEOUT_SECS=30` -> `generation.timeout_secs = 30`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ECON_BRIEFINGS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.generation.validate()?;
        self.revision.validate()?;
        self.quality.validate()?;
        self.data_pack.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::briefing::GroundingFailurePolicy;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "ECON_BRIEFINGS__DATABASE__URL",
        "ECON_BRIEFINGS__GENERATION__TIMEOUT_SECS",
        "ECON_BRIEFINGS__REVISION__GROUNDING_FAILURE_POLICY",
        "ECON_BRIEFINGS__LOGGING__JSON",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = AppConfig::load().unwrap();

        assert!(config.database.is_none());
        assert_eq!(config.data_pack.default_lookback_periods, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_nested_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("ECON_BRIEFINGS__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("ECON_BRIEFINGS__GENERATION__TIMEOUT_SECS", "15");
        env::set_var("ECON_BRIEFINGS__REVISION__GROUNDING_FAILURE_POLICY", "fallback_to_stub");
        env::set_var("ECON_BRIEFINGS__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.database.as_ref().map(|d| d.url.as_str()),
            Some("postgresql://test@localhost/test")
        );
        assert_eq!(config.generation.timeout_secs, 15);
        assert_eq!(
            config.revision.grounding_failure_policy,
            GroundingFailurePolicy::FallbackToStub
        );
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_section_fails_validation() {
        let config = AppConfig {
            database: Some(DatabaseConfig {
                url: "mysql://nope".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidDatabaseUrl));
    }
}
