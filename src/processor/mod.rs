//! Audio processing pipeline

pub mod pipeline;

pub use pipeline::{Pipeline, reshape};

use crate::analysis::TempoEstimate;
use crate::core::AudioMetadata;
use std::time::Duration;

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct ProcessingReport {
    /// Length of the decoded input
    pub input_duration: Duration,
    /// Length of the written output
    pub output_duration: Duration,
    /// Tempo the stretch ratio was computed from
    pub tempo: TempoEstimate,
    /// Whether `tempo` was estimated rather than configured
    pub tempo_estimated: bool,
    /// Original tempo over target tempo
    pub stretch_ratio: f64,
    /// Applied pitch shift
    pub semitones: i32,
    /// Samples written to the output file
    pub samples_written: u32,
    /// Largest absolute output sample
    pub peak: u16,
}

/// Result of analyzing an input without processing it
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Probed stream information
    pub metadata: AudioMetadata,
    /// Length of the decoded audio
    pub decoded_duration: Duration,
    /// Source tempo
    pub tempo: TempoEstimate,
    /// Ratio processing would stretch by
    pub stretch_ratio: f64,
    /// Expected output length
    pub output_duration: Duration,
}
