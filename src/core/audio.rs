use crate::error::{AudioError, AudioResult};
use std::fmt;
use std::time::Duration;

/// Channel layout of a decoded stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    /// One channel
    Mono,
    /// Two channels
    Stereo,
    /// Any other layout, by channel count
    Multi(u16),
}

impl Channels {
    /// Layout for `count` channels. Zero channels, or more than fit in a WAV
    /// header, is an error.
    pub fn from_count(count: u32) -> AudioResult<Self> {
        match count {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            n @ 3..=0xFFFF => Ok(Channels::Multi(n as u16)),
            n => Err(AudioError::InvalidChannels {
                expected: 1,
                got: n,
            }),
        }
    }

    /// Get the number of channels
    pub fn count(&self) -> u32 {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
            Channels::Multi(n) => *n as u32,
        }
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channels::Mono => f.write_str("mono"),
            Channels::Stereo => f.write_str("stereo"),
            Channels::Multi(n) => write!(f, "{n} channels"),
        }
    }
}

/// Integer PCM sample width, as reported by a decoder or written by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// 8-bit
    I8,
    /// 16-bit, the only width written out
    I16,
    /// 24-bit
    I24,
    /// 32-bit
    I32,
}

impl BitDepth {
    /// Map a decoder-reported bits-per-sample value
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(BitDepth::I8),
            16 => Some(BitDepth::I16),
            24 => Some(BitDepth::I24),
            32 => Some(BitDepth::I32),
            _ => None,
        }
    }

    /// Get bytes per sample
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            BitDepth::I8 => 1,
            BitDepth::I16 => 2,
            BitDepth::I24 => 3,
            BitDepth::I32 => 4,
        }
    }

    /// Get bits per sample
    pub fn bits(&self) -> u16 {
        self.bytes_per_sample() as u16 * 8
    }
}

/// Decoded audio held in memory.
///
/// Samples are interleaved f32 in roughly -1.0..=1.0. The sample count is
/// always a whole number of frames for the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: Channels,
}

impl AudioBuffer {
    /// Create a new audio buffer
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: Channels) -> AudioResult<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { rate: sample_rate });
        }

        if samples.len() % channels.count() as usize != 0 {
            return Err(AudioError::BufferError(format!(
                "{} samples do not split into {} frames",
                samples.len(),
                channels
            )));
        }

        Ok(AudioBuffer {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Create a mono buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> AudioResult<Self> {
        Self::new(samples, sample_rate, Channels::Mono)
    }

    /// Build a buffer with the same rate and layout as `self` around new samples
    pub fn with_samples(&self, samples: Vec<f32>) -> AudioResult<Self> {
        Self::new(samples, self.sample_rate, self.channels)
    }

    /// Get reference to the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Get sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get channel configuration
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Get number of samples per channel
    pub fn samples_per_channel(&self) -> usize {
        self.samples.len() / self.channels.count() as usize
    }

    /// Get duration of this buffer
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples_per_channel() as f64 / self.sample_rate as f64)
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Fail unless the buffer is mono
    pub fn require_mono(&self) -> AudioResult<()> {
        if self.channels != Channels::Mono {
            return Err(AudioError::InvalidChannels {
                expected: 1,
                got: self.channels.count(),
            });
        }
        Ok(())
    }
}

/// What the container and codec report about a stream before decoding
#[derive(Debug, Clone)]
pub struct AudioMetadata {
    /// Length reported by the container, if any
    pub duration: Option<Duration>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: Channels,
    /// Short codec name as Symphonia reports it ("mp3", "flac", "pcm_s16le")
    pub codec: String,
    /// Bit depth if known
    pub bit_depth: Option<BitDepth>,
}

impl AudioMetadata {
    /// Create new metadata
    pub fn new(sample_rate: u32, channels: Channels, codec: String) -> AudioResult<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { rate: sample_rate });
        }

        Ok(AudioMetadata {
            duration: None,
            sample_rate,
            channels,
            codec,
            bit_depth: None,
        })
    }

    /// Set duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set bit depth
    pub fn with_bit_depth(mut self, bit_depth: BitDepth) -> Self {
        self.bit_depth = Some(bit_depth);
        self
    }

    /// Get duration in seconds
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration.map(|d| d.as_secs_f64())
    }
}
