use std::path::PathBuf;
use thiserror::Error;

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;

/// Error types for the reshaping pipeline
#[derive(Error, Debug)]
pub enum AudioError {
    /// Input file does not exist
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Unsupported audio format
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Invalid audio metadata
    #[error("Invalid audio metadata: {0}")]
    InvalidMetadata(String),

    /// Decoding failed
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Time-stretch, pitch-shift or resampling failed
    #[error("Transform error: {0}")]
    TransformError(String),

    /// Writing the output file failed
    #[error("Write error: {0}")]
    WriteError(String),

    /// Invalid channel configuration
    #[error("Invalid channel configuration: expected {expected}, got {got}")]
    InvalidChannels {
        /// Expected number of channels
        expected: u32,
        /// Got number of channels
        got: u32,
    },

    /// Invalid sample rate
    #[error("Invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate
        rate: u32,
    },

    /// Buffer-related error
    #[error("Buffer error: {0}")]
    BufferError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Coarse classification of an [`AudioError`], one per pipeline failure point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input path does not resolve
    NotFound,
    /// The input could not be read or decoded
    Decode,
    /// A DSP stage failed
    Transform,
    /// The output could not be written
    Write,
    /// Parameters were rejected before any work started
    Config,
}

impl AudioError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AudioError::NotFound(_) => ErrorKind::NotFound,
            AudioError::UnsupportedFormat(_)
            | AudioError::InvalidMetadata(_)
            | AudioError::DecodeError(_) => ErrorKind::Decode,
            AudioError::TransformError(_)
            | AudioError::InvalidChannels { .. }
            | AudioError::InvalidSampleRate { .. }
            | AudioError::BufferError(_) => ErrorKind::Transform,
            AudioError::WriteError(_) => ErrorKind::Write,
            AudioError::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Process exit status for this error.
    ///
    /// Starts at 3: 1 is a generic failure and 2 is a clap usage error.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            ErrorKind::NotFound => 3,
            ErrorKind::Decode => 4,
            ErrorKind::Transform => 5,
            ErrorKind::Write => 6,
            ErrorKind::Config => 7,
        }
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AudioError::DecodeError(err.to_string())
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        AudioError::WriteError(err.to_string())
    }
}

impl From<rubato::ResamplerConstructionError> for AudioError {
    fn from(err: rubato::ResamplerConstructionError) -> Self {
        AudioError::TransformError(format!("resampler construction failed: {err}"))
    }
}

impl From<rubato::ResampleError> for AudioError {
    fn from(err: rubato::ResampleError) -> Self {
        AudioError::TransformError(format!("resampling failed: {err}"))
    }
}
