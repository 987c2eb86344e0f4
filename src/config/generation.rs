//! Generation capability configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Settings for the LLM-backed briefing generator.
///
/// Without an API key the application runs on the deterministic fallback
/// document only.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// OpenAI (or compatible) API key
    pub openai_api_key: Option<Secret<String>>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Hard bound on one generation call, including provider retries
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Provider-level retries on transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    pub max_tokens: Option<u32>,

    /// Reuse identical generation results for this long; 0 disables caching
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// True when a provider key is present.
    pub fn has_provider(&self) -> bool {
        use secrecy::ExposeSecret;
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_ttl_secs > 0 && self.cache_capacity > 0
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 {
            return Err(ValidationError::MustBePositive("generation.timeout_secs"));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("GENERATION__MODEL"));
        }
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            max_tokens: None,
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_cache_ttl() -> u64 {
    600
}

fn default_cache_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_without_provider() {
        let config = GenerationConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.cache_ttl(), Duration::from_secs(600));
        assert_eq!(config.cache_capacity, 64);
        assert!(config.cache_enabled());
        assert!(!config.has_provider());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_key_is_not_a_provider() {
        let config = GenerationConfig {
            openai_api_key: Some(Secret::new("  ".to_string())),
            ..Default::default()
        };
        assert!(!config.has_provider());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = GenerationConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MustBePositive("generation.timeout_secs"))
        );
    }

    #[test]
    fn zero_ttl_disables_cache() {
        let config = GenerationConfig {
            cache_ttl_secs: 0,
            ..Default::default()
        };
        assert!(!config.cache_enabled());
    }
}
