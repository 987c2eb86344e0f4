//! Briefing generator adapters.
//!
//! - `LlmBriefingGenerator` - prompts an `AIProvider` for a JSON document
//! - `CachingGenerator` - TTL cache keyed by request fingerprint
//! - `ScriptedBriefingGenerator` - deterministic replies for tests
//! - `UnavailableGenerator` - no provider configured; always falls back

mod caching_generator;
mod llm_generator;
mod scripted_generator;
mod unavailable_generator;

pub use caching_generator::CachingGenerator;
pub use llm_generator::LlmBriefingGenerator;
pub use scripted_generator::ScriptedBriefingGenerator;
pub use unavailable_generator::UnavailableGenerator;
