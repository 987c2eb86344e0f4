//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, command metadata)
//! - `series` - Series selectors, descriptors, observations and lookback windows
//! - `data_pack` - The reproducible grounding bundle and its quality assessment
//! - `briefing` - Render model, citation grounding, validation and the version chain

pub mod briefing;
pub mod data_pack;
pub mod foundation;
pub mod series;
