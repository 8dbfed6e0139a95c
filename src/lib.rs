#![warn(missing_docs)]

//! # vocal-reshape: tempo and pitch reshaping for vocal stems
//!
//! Takes a vocal recording, time-stretches it to a target tempo, drops its pitch, and
//! writes a peak-normalized 16-bit WAV. Aimed at slowed, dark vocal styles
//! that sit around 60-75 BPM.
//!
//! ## Stages
//!
//! - **Load** - MP3, FLAC, WAV, OGG, AAC via Symphonia, folded to mono
//! - **Analyze** - spectral-flux tempo estimation
//! - **Transform** - phase-vocoder time-stretch, pitch shift by semitones
//! - **Export** - 16-bit quantization, peak normalization, atomic WAV write
//!
//! ## Quick Start
//!
//! ```ignore
//! use vocal_reshape::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::new("vocals.mp3", "processed_vocals.wav")
//!     .with_target_bpm(65.0)
//!     .with_semitones(-5);
//!
//! let report = Pipeline::new(config)?.run()?;
//! println!("{:.2} BPM -> ratio {:.3}", report.tempo.bpm, report.stretch_ratio);
//! ```

/// Tempo analysis
pub mod analysis;
/// Pipeline configuration
pub mod config;
/// Core audio types and structures
pub mod core;
/// Audio decoder implementations
pub mod decoder;
/// Audio encoder implementations
pub mod encoder;
/// Error types for audio operations
pub mod error;
/// Time-stretch, pitch-shift and channel filters
pub mod filter;
/// The end-to-end pipeline
pub mod processor;

pub use config::{ChannelPolicy, PipelineConfig};
pub use core::{AudioBuffer, AudioMetadata, BitDepth, Channels};
pub use error::{AudioError, AudioResult, ErrorKind};
pub use processor::{AnalysisReport, Pipeline, ProcessingReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
