//! Briefing domain - render model, grounding, validation and versions.
//!
//! A briefing is an append-only chain of immutable versions. Each version
//! freezes the request that produced it, the data pack it was grounded on,
//! the validated content and its quality banner.

mod annotations;
mod citations;
mod content;
mod errors;
mod fallback;
mod input;
mod validation;
mod version;

pub use annotations::{ChatMessage, ChatRole, Comment, CommentStatus};
pub use citations::{CitationResolver, GroundingError};
pub use content::{
    Block, BlockError, BlockPayload, BriefingContent, BriefingMeta, ChartPoint,
    ChartRecommendation, ChartSeries, Citation, Footnote, RawBlock, Section, SuggestedRange,
};
pub use errors::BriefingError;
pub use fallback::{FallbackDocument, NOTES_SECTION_ID};
pub use input::{
    BriefingOptions, EditPackPolicy, GroundingFailurePolicy, InputSpec, RevisionKind,
};
pub use validation::{
    Assessment, BannerCheck, BannerStatus, CheckSeverity, ContentValidator, QualityBanner,
    QualityConfig, StructuralRejection,
};
pub use version::{Briefing, BriefingVersion, NewVersion, VersionSummary};
