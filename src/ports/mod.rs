//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Data Ports
//!
//! - `SeriesStore` - Read-only access to canonical series and observations
//! - `VersionStore` - Append-only version chain with atomic numbering
//! - `AnnotationRepository` - Chat messages and reviewer comments
//!
//! ## Generation Ports
//!
//! - `BriefingGenerator` - Produces candidate documents from a data pack
//! - `AIProvider` - Chat-completion provider used by the LLM generator

mod ai_provider;
mod annotation_repository;
mod briefing_generator;
mod series_store;
mod version_store;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use annotation_repository::{AnnotationError, AnnotationRepository};
pub use briefing_generator::{
    BriefingGenerator, GeneratedDraft, GenerationError, GenerationMode, GenerationRequest,
};
pub use series_store::{SeriesStore, SeriesStoreError};
pub use version_store::{VersionStore, VersionStoreError};
