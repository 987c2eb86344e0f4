//! Data pack domain - the reproducible grounding bundle.

mod pack;
mod quality;
mod stats;

pub use pack::{DataPack, PackQuality, PackedSeries, SeriesMetadata};
pub use quality::{
    DataStatus, FreshnessTolerance, QualityCheck, SeriesQuality, MIN_OBSERVATIONS_FOR_DELTAS,
};
pub use stats::DerivedStats;

#[cfg(test)]
pub(crate) use pack::test_support;
