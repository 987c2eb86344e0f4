//! Series vocabulary shared by the series store and data pack assembly.

mod selector;
mod source;
mod window;

pub use selector::{SeriesDescriptor, SeriesSelector};
pub use source::{Frequency, SeriesSource};
pub use window::{LookbackWindow, Observation, MAX_LOOKBACK_PERIODS};
