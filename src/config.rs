//! Pipeline configuration

use crate::error::{AudioError, AudioResult};
use log::warn;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Default input file
pub const DEFAULT_INPUT: &str = "vocals.mp3";
/// Default output file
pub const DEFAULT_OUTPUT: &str = "processed_vocals.wav";
/// Default target tempo
pub const DEFAULT_TARGET_BPM: f64 = 65.0;
/// Default pitch shift, a fourth down
pub const DEFAULT_SEMITONES: i32 = -5;
/// Tempo range the reshaped vocals are usually aimed at
pub const RECOMMENDED_BPM: RangeInclusive<f64> = 60.0..=75.0;
/// Largest accepted pitch shift in either direction (two octaves)
pub const MAX_SEMITONES: i32 = 24;

/// What to do with input that has more than one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelPolicy {
    /// Average all channels into one
    #[default]
    Downmix,
    /// Fail with `InvalidChannels`
    Reject,
}

/// Parameters for one run of the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Audio file to read
    pub input: PathBuf,
    /// WAV file to write
    pub output: PathBuf,
    /// Tempo the output should have
    pub target_bpm: f64,
    /// Pitch shift in semitones, negative lowers the pitch
    pub semitones: i32,
    /// Multi-channel input handling
    pub channel_policy: ChannelPolicy,
    /// Distance below full scale for the normalized peak, in dB
    pub headroom_db: f64,
    /// Known tempo of the input; skips estimation when set
    pub source_bpm: Option<f64>,
}

impl PipelineConfig {
    /// Create a config with default tempo and pitch parameters
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Self {
        PipelineConfig {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            target_bpm: DEFAULT_TARGET_BPM,
            semitones: DEFAULT_SEMITONES,
            channel_policy: ChannelPolicy::default(),
            headroom_db: 0.0,
            source_bpm: None,
        }
    }

    /// Set target tempo
    pub fn with_target_bpm(mut self, bpm: f64) -> Self {
        self.target_bpm = bpm;
        self
    }

    /// Set pitch shift
    pub fn with_semitones(mut self, semitones: i32) -> Self {
        self.semitones = semitones;
        self
    }

    /// Set channel policy
    pub fn with_channel_policy(mut self, policy: ChannelPolicy) -> Self {
        self.channel_policy = policy;
        self
    }

    /// Set normalization headroom
    pub fn with_headroom_db(mut self, headroom_db: f64) -> Self {
        self.headroom_db = headroom_db;
        self
    }

    /// Use a known source tempo instead of estimating it
    pub fn with_source_bpm(mut self, bpm: f64) -> Self {
        self.source_bpm = Some(bpm);
        self
    }

    /// Reject parameters the pipeline cannot work with.
    ///
    /// Out-of-range but usable values (a target tempo outside
    /// [`RECOMMENDED_BPM`]) are only logged.
    pub fn validate(&self) -> AudioResult<()> {
        validate_bpm("target BPM", self.target_bpm)?;
        if let Some(bpm) = self.source_bpm {
            validate_bpm("source BPM", bpm)?;
        }

        if !RECOMMENDED_BPM.contains(&self.target_bpm) {
            warn!(
                "Target BPM {:.1} is outside the usual {:.0}-{:.0} range",
                self.target_bpm,
                RECOMMENDED_BPM.start(),
                RECOMMENDED_BPM.end()
            );
        }

        if self.semitones.abs() > MAX_SEMITONES {
            return Err(AudioError::ConfigError(format!(
                "Pitch shift must be within +/-{} semitones, got {}",
                MAX_SEMITONES, self.semitones
            )));
        }

        if !self.headroom_db.is_finite() || self.headroom_db < 0.0 {
            return Err(AudioError::ConfigError(format!(
                "Headroom must be a non-negative number of dB, got {}",
                self.headroom_db
            )));
        }

        if self.input == self.output {
            return Err(AudioError::ConfigError(
                "Output path must differ from the input path".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT, DEFAULT_OUTPUT)
    }
}

fn validate_bpm(name: &str, bpm: f64) -> AudioResult<()> {
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(AudioError::ConfigError(format!(
            "{} must be a positive number, got {}",
            name, bpm
        )));
    }
    Ok(())
}
