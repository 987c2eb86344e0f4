//! LLM-backed Briefing Generator
//!
//! Renders the generation request into a system prompt plus a single user
//! prompt carrying the data pack as JSON, asks the provider for a JSON
//! object, and hands the decoded value back unvalidated.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::foundation::UserId;
use crate::ports::{
    AIError, AIProvider, BriefingGenerator, CompletionRequest, GeneratedDraft, GenerationError,
    GenerationMode, GenerationRequest, MessageRole, RequestMetadata,
};

const SYSTEM_PROMPT: &str = "You draft concise ministerial briefings on economic policy. \
Use only the figures in the supplied data pack and never invent numbers or context. \
When information is missing, say so plainly and name the series that would be needed. \
Every quantitative claim carries citations naming the exact series_key, period_start and value \
from the data pack. Reply with one JSON object matching the requested schema and nothing else.";

const CONTENT_SCHEMA: &str = r#"{"briefing_meta":{"title":"string","topic":"string","as_of":"string","tone":"string","length":"string"},"sections":[{"id":"string","title":"string","blocks":[{"type":"paragraph|bullets|table|chart_spec|callout","content":{},"citations":[{"series_key":"string","period_start":"YYYY-MM-DD","value":0,"note":"string"}]}]}],"recommended_charts":[{"chart_id":"string","title":"string","unit":"string","series_keys":["string"],"suggested_range":{"start":"string","end":"string"}}],"export_markdown":"string"}"#;

/// Generator backed by an [`AIProvider`].
pub struct LlmBriefingGenerator {
    provider: Arc<dyn AIProvider>,
    max_tokens: Option<u32>,
}

impl LlmBriefingGenerator {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn user_prompt(request: &GenerationRequest) -> Result<String, GenerationError> {
        let pack = to_json(&request.data_pack)?;
        let mut prompt = match request.mode {
            GenerationMode::Create => format!(
                "Create a briefing using ONLY the data pack below.\n\n\
                 Request:\n{}\n\nOptions:\n{}\n\nTopic:\n{}\n\nData pack:\n{}\n\n\
                 Return JSON with this schema:\n{}\n",
                request.instruction,
                to_json(&request.options)?,
                request.topic,
                pack,
                CONTENT_SCHEMA,
            ),
            GenerationMode::Edit => format!(
                "Apply the requested edit to the briefing. Keep every quantitative statement \
                 grounded in the data pack. If the edit asks for content the data pack does not \
                 support, explain that in change_summary and add a note saying which data is missing.\n\n\
                 Edit request:\n{}\n\nCurrent briefing:\n{}\n\nData pack:\n{}\n\n\
                 Return JSON with this schema:\n{{\"change_summary\":\"string\",\"updated_briefing\":{}}}\n",
                request.instruction,
                to_json(&request.prior_content)?,
                pack,
                CONTENT_SCHEMA,
            ),
        };

        if let Some(note) = &request.corrective_note {
            prompt.push_str("\nCorrection required: ");
            prompt.push_str(note);
            prompt.push('\n');
        }
        Ok(prompt)
    }

    /// Decodes the model reply into a draft.
    fn parse_reply(mode: GenerationMode, reply: &str) -> Result<GeneratedDraft, GenerationError> {
        let value: Value = serde_json::from_str(strip_code_fence(reply))
            .map_err(|e| GenerationError::Malformed(format!("reply is not JSON: {}", e)))?;
        if !value.is_object() {
            return Err(GenerationError::Malformed(
                "reply is not a JSON object".to_string(),
            ));
        }

        match mode {
            GenerationMode::Create => Ok(GeneratedDraft::new(value)),
            GenerationMode::Edit => {
                let summary = value
                    .get("change_summary")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let content = match value.get("updated_briefing") {
                    Some(updated) => updated.clone(),
                    None => value,
                };
                let draft = GeneratedDraft::new(content);
                Ok(match summary {
                    Some(summary) => draft.with_change_summary(summary),
                    None => draft,
                })
            }
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, GenerationError> {
    serde_json::to_string(value).map_err(|e| GenerationError::Malformed(e.to_string()))
}

/// Drops a surrounding ```json fence when the model adds one anyway.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

impl From<AIError> for GenerationError {
    fn from(err: AIError) -> Self {
        match err {
            AIError::Timeout { timeout_secs } => GenerationError::Timeout {
                timeout_secs: u64::from(timeout_secs),
            },
            AIError::Parse(message) => GenerationError::Malformed(message),
            other => GenerationError::Unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl BriefingGenerator for LlmBriefingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedDraft, GenerationError> {
        let fingerprint = request.fingerprint();
        let metadata = RequestMetadata::new(UserId::system(), &fingerprint[..16]);

        let mut completion = CompletionRequest::new(metadata)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_message(MessageRole::User, Self::user_prompt(request)?)
            .with_temperature(0.0)
            .with_json_output();
        if let Some(max_tokens) = self.max_tokens {
            completion = completion.with_max_tokens(max_tokens);
        }

        let response = self.provider.complete(completion).await?;
        tracing::debug!(
            model = %response.model,
            mode = request.mode.as_str(),
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Generation completed"
        );

        Self::parse_reply(request.mode, &response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockAIProvider;
    use crate::domain::briefing::{BriefingContent, BriefingOptions};
    use crate::domain::data_pack::test_support::{monthly_series, pack_of};

    fn create_request() -> GenerationRequest {
        GenerationRequest::create(
            "inflation",
            "Summarise the latest CPI",
            BriefingOptions::default(),
            pack_of(vec![monthly_series("cpi", &[Some(2.0), Some(2.5)])]),
        )
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn edit_reply_unwraps_updated_briefing() {
        let reply = r#"{"change_summary":"Shortened","updated_briefing":{"sections":[]}}"#;
        let draft = LlmBriefingGenerator::parse_reply(GenerationMode::Edit, reply).unwrap();

        assert_eq!(draft.change_summary.as_deref(), Some("Shortened"));
        assert_eq!(draft.content, serde_json::json!({"sections": []}));
    }

    #[test]
    fn non_object_reply_is_malformed() {
        let result = LlmBriefingGenerator::parse_reply(GenerationMode::Create, "[1, 2]");
        assert!(matches!(result, Err(GenerationError::Malformed(_))));
    }

    #[test]
    fn prompt_includes_pack_and_corrective_note() {
        let request = create_request().with_corrective_note("remove unverifiable citations");
        let prompt = LlmBriefingGenerator::user_prompt(&request).unwrap();

        assert!(prompt.contains("Summarise the latest CPI"));
        assert!(prompt.contains("\"cpi\""));
        assert!(prompt.contains("remove unverifiable citations"));
    }

    #[test]
    fn edit_prompt_carries_prior_content() {
        let request = GenerationRequest::edit(
            "inflation",
            "Shorten",
            BriefingOptions::default(),
            pack_of(vec![monthly_series("cpi", &[Some(2.0)])]),
            BriefingContent::default(),
        );
        let prompt = LlmBriefingGenerator::user_prompt(&request).unwrap();

        assert!(prompt.contains("Current briefing"));
        assert!(prompt.contains("updated_briefing"));
    }

    #[tokio::test]
    async fn generate_requests_json_at_zero_temperature() {
        let provider = Arc::new(MockAIProvider::new().with_response(r#"{"sections":[]}"#));
        let generator = LlmBriefingGenerator::new(provider.clone()).with_max_tokens(2_000);

        let draft = generator.generate(&create_request()).await.unwrap();

        assert_eq!(draft.content["sections"], serde_json::json!([]));
        let calls = provider.get_calls();
        assert!(calls[0].json_output);
        assert_eq!(calls[0].temperature, Some(0.0));
        assert_eq!(calls[0].max_tokens, Some(2_000));
    }

    #[tokio::test]
    async fn provider_errors_map_to_generation_errors() {
        let provider = Arc::new(
            MockAIProvider::new()
                .with_error(AIError::Timeout { timeout_secs: 5 })
                .with_error(AIError::AuthenticationFailed),
        );
        let generator = LlmBriefingGenerator::new(provider);

        assert_eq!(
            generator.generate(&create_request()).await,
            Err(GenerationError::Timeout { timeout_secs: 5 })
        );
        assert!(matches!(
            generator.generate(&create_request()).await,
            Err(GenerationError::Unavailable(_))
        ));
    }
}
