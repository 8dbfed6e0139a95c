//! Audio analysis

pub mod tempo;

pub use tempo::{DEFAULT_TEMPO_BPM, TempoEstimate, TempoEstimator};
