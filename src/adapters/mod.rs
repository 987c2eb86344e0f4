//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Chat-completion providers (OpenAI, mock)
//! - `generation` - Briefing generators built on a provider, a cache or a script
//! - `memory` - In-memory storage for tests and local runs
//! - `postgres` - PostgreSQL storage (sqlx)

pub mod ai;
pub mod generation;
pub mod memory;
pub mod postgres;
