//! In-memory adapters for tests, previews and local development.

mod annotation_repository;
mod series_store;
pub(crate) mod version_store;

pub use annotation_repository::InMemoryAnnotationRepository;
pub use series_store::InMemorySeriesStore;
pub use version_store::InMemoryVersionStore;
