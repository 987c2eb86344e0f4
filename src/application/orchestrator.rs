//! RevisionOrchestrator - drives one create or revise request to a
//! committed version or a clean rejection.
//!
//! # Pipeline
//!
//! 1. Resolve the parent version (edits only)
//! 2. Build or reuse the data pack
//! 3. Generate under a timeout; failures fall back to a deterministic document
//! 4. Decode structurally, then resolve citations with one corrective retry
//! 5. Assess quality and freeze the banner
//! 6. Commit, retrying on version-number conflicts
//!
//! No lock is held across generation. The only serialized step is the
//! store's commit, scoped to one briefing.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{GenerationConfig, RevisionConfig};
use crate::domain::briefing::{
    Assessment, Briefing, BriefingContent, BriefingError, BriefingVersion, ChatMessage,
    CitationResolver, ContentValidator, EditPackPolicy, FallbackDocument, GroundingFailurePolicy,
    InputSpec, NewVersion, RevisionKind,
};
use crate::domain::data_pack::DataPack;
use crate::domain::foundation::{BriefingId, CommandMetadata, Timestamp, ValidationError, VersionId};
use crate::ports::{
    AnnotationError, AnnotationRepository, BriefingGenerator, GeneratedDraft, GenerationRequest,
    VersionStore, VersionStoreError,
};

use super::DataPackBuilder;

const INITIAL_SUMMARY: &str = "Initial version created.";

impl From<VersionStoreError> for BriefingError {
    fn from(err: VersionStoreError) -> Self {
        match err {
            VersionStoreError::BriefingNotFound(id) => BriefingError::BriefingNotFound(id),
            VersionStoreError::Conflict(id) => BriefingError::VersionConflict(id),
            other => BriefingError::Storage(other.to_string()),
        }
    }
}

impl From<AnnotationError> for BriefingError {
    fn from(err: AnnotationError) -> Self {
        BriefingError::Storage(err.to_string())
    }
}

/// Tunables for the revision pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionSettings {
    pub generation_timeout: Duration,
    pub max_commit_attempts: u32,
    pub grounding_failure_policy: GroundingFailurePolicy,
    pub default_edit_pack_policy: EditPackPolicy,
}

impl RevisionSettings {
    pub fn from_config(revision: &RevisionConfig, generation: &GenerationConfig) -> Self {
        Self {
            generation_timeout: generation.timeout(),
            max_commit_attempts: revision.max_commit_attempts.max(1),
            grounding_failure_policy: revision.grounding_failure_policy,
            default_edit_pack_policy: revision.default_edit_pack_policy,
        }
    }
}

impl Default for RevisionSettings {
    fn default() -> Self {
        Self::from_config(&RevisionConfig::default(), &GenerationConfig::default())
    }
}

/// A newly created briefing and its first version.
#[derive(Debug, Clone)]
pub struct CreatedBriefing {
    pub briefing: Briefing,
    pub version: BriefingVersion,
}

/// What to produce when generation cannot be used.
#[derive(Clone, Copy)]
enum FallbackPlan<'a> {
    DataOnly { topic: &'a str },
    KeepPrior {
        prior: &'a BriefingContent,
        instruction: &'a str,
    },
}

/// Resolved content ready to be assessed and committed.
struct Candidate {
    content: BriefingContent,
    change_summary: Option<String>,
    fallback_reason: Option<String>,
}

impl Candidate {
    fn fallback_used(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Coordinates data packs, generation, validation and commits.
pub struct RevisionOrchestrator {
    builder: DataPackBuilder,
    generator: Arc<dyn BriefingGenerator>,
    versions: Arc<dyn VersionStore>,
    annotations: Arc<dyn AnnotationRepository>,
    resolver: CitationResolver,
    validator: ContentValidator,
    settings: RevisionSettings,
}

impl RevisionOrchestrator {
    pub fn new(
        builder: DataPackBuilder,
        generator: Arc<dyn BriefingGenerator>,
        versions: Arc<dyn VersionStore>,
        annotations: Arc<dyn AnnotationRepository>,
    ) -> Self {
        Self {
            builder,
            generator,
            versions,
            annotations,
            resolver: CitationResolver::new(),
            validator: ContentValidator::default(),
            settings: RevisionSettings::default(),
        }
    }

    pub fn with_validator(mut self, validator: ContentValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_settings(mut self, settings: RevisionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &RevisionSettings {
        &self.settings
    }

    /// Creates a briefing and commits version 1.
    ///
    /// # Errors
    ///
    /// Validation, unknown series, structural failures and unrecoverable
    /// grounding failures reject the request without writing anything.
    pub async fn create(
        &self,
        spec: InputSpec,
        metadata: &CommandMetadata,
    ) -> Result<CreatedBriefing, BriefingError> {
        spec.validate()?;
        let briefing_id = BriefingId::new();
        let correlation_id = metadata.correlation_id();

        tracing::info!(
            briefing_id = %briefing_id,
            correlation_id = %correlation_id,
            stage = "build_data_pack",
            series = spec.selectors.len(),
            "Creating briefing"
        );
        let pack = self
            .builder
            .build(&spec.topic, &spec.selectors, &spec.options)
            .await?;

        let request = GenerationRequest::create(
            spec.topic.clone(),
            spec.instruction.clone(),
            spec.options.clone(),
            pack.clone(),
        );
        let candidate = self
            .produce(briefing_id, &request, FallbackPlan::DataOnly { topic: &spec.topic })
            .await?;

        let title = Briefing::title_for(&spec.topic, &candidate.content);
        let briefing = Briefing::new(briefing_id, title, spec.topic.clone(), metadata.user_id.clone());
        let instruction = spec.instruction.clone();
        let new = self.seal_candidate(briefing_id, None, spec, pack, candidate, metadata);

        let version = self.versions.create(briefing.clone(), new).await?;
        let mut briefing = briefing;
        briefing.advance(&version);

        tracing::info!(
            briefing_id = %briefing_id,
            version_number = version.version_number,
            banner = version.banner.status.as_str(),
            fallback_used = version.fallback_used,
            stage = "committed",
            "Briefing created"
        );

        self.record_chat(briefing_id, &instruction, Some(version.id), &version, metadata)
            .await;
        Ok(CreatedBriefing { briefing, version })
    }

    /// Commits a new version derived from `target_version_id`, or from the
    /// briefing's latest version when no target is named.
    ///
    /// `pack_policy` falls back to the configured default when absent.
    ///
    /// # Errors
    ///
    /// - `BriefingNotFound` / `VersionNotFound` for an unknown target
    /// - `StructuralValidationFailure` when the candidate is malformed
    /// - `UngroundedCitation` / `CitationMismatch` after the corrective
    ///   retry when the grounding policy rejects
    /// - `VersionConflict` if every commit attempt lost a race
    pub async fn revise(
        &self,
        briefing_id: BriefingId,
        target_version_id: Option<VersionId>,
        instruction: &str,
        pack_policy: Option<EditPackPolicy>,
        metadata: &CommandMetadata,
    ) -> Result<BriefingVersion, BriefingError> {
        let briefing = self
            .versions
            .get_briefing(briefing_id)
            .await?
            .ok_or(BriefingError::BriefingNotFound(briefing_id))?;
        let target_version_id = target_version_id
            .or(briefing.latest_version_id)
            .ok_or_else(|| ValidationError::empty_field("target_version_id"))?;
        let parent = self
            .versions
            .get(briefing_id, target_version_id)
            .await?
            .ok_or(BriefingError::VersionNotFound {
                briefing_id,
                version_id: target_version_id,
            })?;

        let policy = pack_policy.unwrap_or(self.settings.default_edit_pack_policy);
        let spec = InputSpec::edit(&parent.input_spec, instruction, policy);
        spec.validate()?;

        tracing::info!(
            briefing_id = %briefing_id,
            parent_version = parent.version_number,
            correlation_id = %metadata.correlation_id(),
            stage = "build_data_pack",
            pack_policy = ?policy,
            "Revising briefing"
        );
        let pack = match policy {
            EditPackPolicy::ReuseParent => parent.data_pack.clone(),
            EditPackPolicy::Refresh => {
                self.builder
                    .build(&spec.topic, &spec.selectors, &spec.options)
                    .await?
            }
        };

        let request = GenerationRequest::edit(
            spec.topic.clone(),
            spec.instruction.clone(),
            spec.options.clone(),
            pack.clone(),
            parent.content.clone(),
        );
        let plan = match policy {
            EditPackPolicy::ReuseParent => FallbackPlan::KeepPrior {
                prior: &parent.content,
                instruction: &spec.instruction,
            },
            EditPackPolicy::Refresh => FallbackPlan::DataOnly { topic: &spec.topic },
        };
        let candidate = self.produce(briefing_id, &request, plan).await?;

        let new = self.seal_candidate(
            briefing_id,
            Some(parent.id),
            spec,
            pack,
            candidate,
            metadata,
        );
        let version = self.commit_with_retry(new).await?;

        tracing::info!(
            briefing_id = %briefing_id,
            version_number = version.version_number,
            banner = version.banner.status.as_str(),
            fallback_used = version.fallback_used,
            stage = "committed",
            "Briefing revised"
        );

        self.record_chat(briefing_id, instruction, Some(parent.id), &version, metadata)
            .await;
        Ok(version)
    }

    // ════════════════════════════════════════════════════════════════════════
    // Generate and validate
    // ════════════════════════════════════════════════════════════════════════

    async fn produce(
        &self,
        briefing_id: BriefingId,
        request: &GenerationRequest,
        plan: FallbackPlan<'_>,
    ) -> Result<Candidate, BriefingError> {
        let pack = &request.data_pack;

        let draft = match self.generate(briefing_id, request, 1).await {
            Ok(draft) => draft,
            Err(reason) => return self.fallback(plan, pack, reason),
        };
        let change_summary = draft.change_summary.clone();
        let content = self.decode(briefing_id, &draft)?;
        let first_failure = match self.resolver.resolve(content, pack) {
            Ok(resolved) => return Ok(Self::generated(resolved, change_summary)),
            Err(err) => err,
        };

        tracing::warn!(
            briefing_id = %briefing_id,
            stage = "resolve_citations",
            attempt = 1,
            error = %first_failure,
            "Citation failed to ground, retrying with corrective instruction"
        );
        let retry = request.with_corrective_note(format!(
            "Remove unverifiable citations. {}. Cite only (series_key, period, value) triples present in the data pack.",
            first_failure
        ));
        let draft = match self.generate(briefing_id, &retry, 2).await {
            Ok(draft) => draft,
            Err(reason) => return self.fallback(plan, pack, reason),
        };
        let change_summary = draft.change_summary.clone();
        let content = self.decode(briefing_id, &draft)?;

        match self.resolver.resolve(content, pack) {
            Ok(resolved) => Ok(Self::generated(resolved, change_summary)),
            Err(err) => match self.settings.grounding_failure_policy {
                GroundingFailurePolicy::Reject => {
                    tracing::warn!(
                        briefing_id = %briefing_id,
                        stage = "rejected",
                        error = %err,
                        "Citation still ungrounded after retry"
                    );
                    Err(err.into())
                }
                GroundingFailurePolicy::FallbackToStub => self.fallback(
                    plan,
                    pack,
                    format!("citations could not be grounded ({})", err),
                ),
            },
        }
    }

    async fn generate(
        &self,
        briefing_id: BriefingId,
        request: &GenerationRequest,
        attempt: u32,
    ) -> Result<GeneratedDraft, String> {
        let timeout = self.settings.generation_timeout;
        match tokio::time::timeout(timeout, self.generator.generate(request)).await {
            Ok(Ok(draft)) => Ok(draft),
            Ok(Err(err)) => {
                tracing::warn!(
                    briefing_id = %briefing_id,
                    stage = "generate",
                    attempt,
                    error = %err,
                    "Generation failed"
                );
                Err(err.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    briefing_id = %briefing_id,
                    stage = "generate",
                    attempt,
                    timeout_ms = timeout.as_millis() as u64,
                    "Generation timed out"
                );
                Err(format!("generation timed out after {}ms", timeout.as_millis()))
            }
        }
    }

    fn decode(
        &self,
        briefing_id: BriefingId,
        draft: &GeneratedDraft,
    ) -> Result<BriefingContent, BriefingError> {
        self.validator.parse(&draft.content).map_err(|rejection| {
            tracing::warn!(
                briefing_id = %briefing_id,
                stage = "rejected",
                issues = rejection.issues.len(),
                error = %rejection,
                "Candidate failed structural validation"
            );
            BriefingError::from(rejection)
        })
    }

    fn fallback(
        &self,
        plan: FallbackPlan<'_>,
        pack: &DataPack,
        reason: String,
    ) -> Result<Candidate, BriefingError> {
        let content = match plan {
            FallbackPlan::DataOnly { topic } => FallbackDocument::data_only(topic, pack, &reason),
            FallbackPlan::KeepPrior { prior, instruction } => {
                FallbackDocument::unchanged_edit(prior, instruction, &reason)
            }
        };
        tracing::warn!(stage = "fallback", reason = %reason, "Using fallback document");
        let content = self.resolver.resolve(content, pack)?;
        Ok(Candidate {
            content,
            change_summary: Some(FallbackDocument::change_summary(&reason)),
            fallback_reason: Some(reason),
        })
    }

    fn generated(content: BriefingContent, change_summary: Option<String>) -> Candidate {
        Candidate {
            content,
            change_summary: change_summary.filter(|s| !s.trim().is_empty()),
            fallback_reason: None,
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Commit
    // ════════════════════════════════════════════════════════════════════════

    fn seal_candidate(
        &self,
        briefing_id: BriefingId,
        parent_version_id: Option<VersionId>,
        spec: InputSpec,
        pack: DataPack,
        candidate: Candidate,
        metadata: &CommandMetadata,
    ) -> NewVersion {
        let reference_date = spec
            .options
            .as_of
            .unwrap_or_else(|| Timestamp::now().date());
        let banner = self.validator.assess(
            &candidate.content,
            &pack,
            Assessment {
                reference_date,
                fallback_used: candidate.fallback_used(),
            },
        );

        let change_summary = candidate.change_summary.clone().or_else(|| match spec.kind {
            RevisionKind::Create => Some(INITIAL_SUMMARY.to_string()),
            RevisionKind::Edit => Some(format!("Applied edit: {}", spec.instruction.trim())),
        });

        NewVersion {
            id: VersionId::new(),
            briefing_id,
            parent_version_id,
            fallback_used: candidate.fallback_used(),
            input_spec: spec,
            data_pack: pack,
            content: candidate.content,
            banner,
            change_summary,
            created_by: metadata.user_id.clone(),
        }
    }

    async fn commit_with_retry(&self, new: NewVersion) -> Result<BriefingVersion, BriefingError> {
        let briefing_id = new.briefing_id;
        let max_attempts = self.settings.max_commit_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.versions.commit(new.clone()).await {
                Ok(version) => return Ok(version),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        briefing_id = %briefing_id,
                        stage = "commit",
                        attempt,
                        error = %err,
                        "Version number conflict, retrying commit"
                    );
                    attempt += 1;
                    tokio::task::yield_now().await;
                }
                Err(err) => {
                    tracing::error!(
                        briefing_id = %briefing_id,
                        stage = "commit",
                        attempt,
                        error = %err,
                        "Commit failed"
                    );
                    return Err(err.into());
                }
            }
        }
    }

    async fn record_chat(
        &self,
        briefing_id: BriefingId,
        instruction: &str,
        target_version_id: Option<VersionId>,
        version: &BriefingVersion,
        metadata: &CommandMetadata,
    ) {
        let user = ChatMessage::user(
            briefing_id,
            instruction,
            target_version_id,
            metadata.user_id.clone(),
        );
        let assistant = ChatMessage::assistant(
            briefing_id,
            version
                .change_summary
                .clone()
                .unwrap_or_else(|| format!("Version {} created.", version.version_number)),
            version.id,
        );
        for message in [user, assistant] {
            if let Err(err) = self.annotations.append_chat(&message).await {
                tracing::warn!(
                    briefing_id = %briefing_id,
                    version_number = version.version_number,
                    error = %err,
                    "Failed to record chat message"
                );
            }
        }
    }
}
