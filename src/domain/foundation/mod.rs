//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the briefing domain.

mod command;
mod errors;
mod ids;
mod timestamp;

pub use command::CommandMetadata;
pub use errors::{ErrorCode, ValidationError};
pub use ids::{BriefingId, ChatMessageId, CommentId, UserId, VersionId};
pub use timestamp::Timestamp;
