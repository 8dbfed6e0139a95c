use crate::core::{AudioBuffer, BitDepth, Channels};
use crate::error::{AudioError, AudioResult};
use std::time::Duration;

/// Largest positive 16-bit sample, the full-scale reference
pub const FULL_SCALE: i16 = i16::MAX;

/// Quantized 16-bit audio with its format metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PcmSegment {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: Channels,
}

impl PcmSegment {
    /// Wrap already-quantized samples
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: Channels) -> AudioResult<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { rate: sample_rate });
        }
        if samples.len() % channels.count() as usize != 0 {
            return Err(AudioError::BufferError(
                "Sample count not divisible by channel count".to_string(),
            ));
        }
        Ok(PcmSegment {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Quantize a float buffer to 16-bit.
    ///
    /// Samples are scaled by [`FULL_SCALE`] and truncated toward zero; values
    /// past +/-1.0 clip at the i16 limits instead of wrapping.
    pub fn quantize(buffer: &AudioBuffer) -> AudioResult<Self> {
        let samples = buffer
            .samples()
            .iter()
            .map(|&s| {
                let scaled = s * FULL_SCALE as f32;
                if scaled.is_nan() {
                    0
                } else {
                    // `as` saturates at the integer limits
                    scaled as i16
                }
            })
            .collect();
        Self::new(samples, buffer.sample_rate(), buffer.channels())
    }

    /// Peak-normalize so the loudest sample sits `headroom_db` below full scale.
    ///
    /// Silent segments are returned unchanged.
    pub fn normalize(&self, headroom_db: f64) -> PcmSegment {
        let peak = self.peak();
        if peak == 0 {
            return self.clone();
        }

        let target = FULL_SCALE as f64 * 10f64.powf(-headroom_db / 20.0);
        let gain = target / peak as f64;
        let samples = self
            .samples
            .iter()
            .map(|&s| {
                (s as f64 * gain)
                    .round()
                    .clamp(-(FULL_SCALE as f64), FULL_SCALE as f64) as i16
            })
            .collect();

        PcmSegment {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> u16 {
        self.samples
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// Get reference to the samples
    pub fn samples(&self) -> &[i16] {
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

    /// Sample format
    pub fn bit_depth(&self) -> BitDepth {
        BitDepth::I16
    }

    /// Bytes per sample
    pub fn sample_width(&self) -> usize {
        self.bit_depth().bytes_per_sample()
    }

    /// Get duration of this segment
    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() / self.channels.count() as usize;
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(samples: Vec<f32>) -> PcmSegment {
        PcmSegment::quantize(&AudioBuffer::mono(samples, 44100).unwrap()).unwrap()
    }

    #[test]
    fn test_quantize_scales_and_truncates() {
        let pcm = segment(vec![0.0, 1.0, -1.0, 0.5, -0.25]);
        assert_eq!(pcm.samples(), &[0, 32767, -32767, 16383, -8191]);
        assert_eq!(pcm.sample_width(), 2);
    }

    #[test]
    fn test_quantize_clips_instead_of_wrapping() {
        let pcm = segment(vec![1.5, -2.0, f32::NAN]);
        assert_eq!(pcm.samples(), &[32767, -32768, 0]);
    }

    #[test]
    fn test_normalize_reaches_full_scale() {
        let pcm = segment(vec![0.1, -0.25, 0.2]);
        let normalized = pcm.normalize(0.0);

        assert_eq!(normalized.peak(), FULL_SCALE as u16);
        assert_eq!(normalized.samples()[1], -32767);
        // relative dynamics preserved
        let ratio = normalized.samples()[0] as f64 / normalized.samples()[1] as f64;
        assert!((ratio + 0.4).abs() < 1e-3);
    }

    #[test]
    fn test_normalize_with_headroom() {
        let normalized = segment(vec![0.5, -0.1]).normalize(6.0);
        let expected = (32767.0 * 10f64.powf(-0.3)).round() as u16;
        assert!(normalized.peak().abs_diff(expected) <= 1);
    }

    #[test]
    fn test_normalize_clipped_input_never_exceeds_full_scale() {
        let normalized = segment(vec![-3.0, 0.2]).normalize(0.0);
        assert!(normalized.peak() <= FULL_SCALE as u16);
        assert_eq!(normalized.samples()[0], -32767);
    }

    #[test]
    fn test_normalize_silence_is_unchanged() {
        let pcm = segment(vec![0.0; 16]);
        assert_eq!(pcm.normalize(0.0), pcm);
    }

    #[test]
    fn test_duration() {
        let pcm = PcmSegment::new(vec![0; 22050], 44100, Channels::Mono).unwrap();
        assert_eq!(pcm.duration(), Duration::from_millis(500));
    }
}
