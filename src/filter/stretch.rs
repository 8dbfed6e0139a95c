use super::stft::Stft;
use crate::core::AudioBuffer;
use crate::error::{AudioError, AudioResult};
use rustfft::num_complex::Complex;
use std::f32::consts::PI;

const TWO_PI: f32 = 2.0 * PI;

/// Analysis frame size
pub const FFT_SIZE: usize = 2048;
/// Analysis hop (75% overlap)
pub const HOP_SIZE: usize = FFT_SIZE / 4;

/// Ratio that turns a track at `original_bpm` into one at `target_bpm`.
///
/// Values below 1.0 slow the audio down.
pub fn stretch_ratio(original_bpm: f64, target_bpm: f64) -> AudioResult<f64> {
    for (name, bpm) in [("original", original_bpm), ("target", target_bpm)] {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(AudioError::TransformError(format!(
                "{} tempo must be positive, got {}",
                name, bpm
            )));
        }
    }
    Ok(original_bpm / target_bpm)
}

/// Pitch-preserving time-stretch using a phase vocoder.
///
/// A ratio of `r` plays the audio `r` times faster: the output has
/// `round(len / r)` samples at the same sample rate.
#[derive(Debug, Clone)]
pub struct TimeStretch {
    ratio: f64,
}

impl TimeStretch {
    /// Create a time-stretcher
    pub fn new(ratio: f64) -> AudioResult<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(AudioError::TransformError(format!(
                "Stretch ratio must be positive, got {}",
                ratio
            )));
        }
        Ok(TimeStretch { ratio })
    }

    /// Get the stretch ratio
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Number of samples produced for `input_len` input samples
    pub fn output_len(&self, input_len: usize) -> usize {
        (input_len as f64 / self.ratio).round() as usize
    }

    /// Stretch a mono signal
    pub fn stretch(&self, input: &[f32]) -> Vec<f32> {
        let length = self.output_len(input.len());
        if input.is_empty() || length == 0 {
            return vec![0.0; length];
        }
        if self.ratio == 1.0 {
            return input.to_vec();
        }

        let stft = Stft::new(FFT_SIZE, HOP_SIZE);
        let frames = stft.analyze(input);
        let stretched = phase_vocoder(&frames, self.ratio, stft.hop_size(), stft.fft_size());
        stft.synthesize(&stretched, length)
    }
}

impl super::Filter for TimeStretch {
    fn process(&mut self, frame: &AudioBuffer) -> AudioResult<AudioBuffer> {
        frame.require_mono()?;
        frame.with_samples(self.stretch(frame.samples()))
    }
}

/// Resample a sequence of spectra in time by `rate`, keeping each bin's
/// instantaneous frequency.
fn phase_vocoder(
    frames: &[Vec<Complex<f32>>],
    rate: f64,
    hop_size: usize,
    fft_size: usize,
) -> Vec<Vec<Complex<f32>>> {
    let Some(first) = frames.first() else {
        return Vec::new();
    };
    let num_bins = first.len();

    // Expected phase advance per hop for each bin centre
    let advance: Vec<f32> = (0..num_bins)
        .map(|k| TWO_PI * k as f32 * hop_size as f32 / fft_size as f32)
        .collect();

    let silence = vec![Complex::new(0.0f32, 0.0); num_bins];
    let mut phase: Vec<f32> = first.iter().map(|c| c.arg()).collect();
    let mut output = Vec::with_capacity((frames.len() as f64 / rate).ceil() as usize + 1);

    let mut step = 0.0f64;
    while step < frames.len() as f64 {
        let index = step.floor() as usize;
        let alpha = (step - index as f64) as f32;
        let left = &frames[index];
        let right = frames.get(index + 1).unwrap_or(&silence);

        let frame = (0..num_bins)
            .map(|k| {
                let magnitude = (1.0 - alpha) * left[k].norm() + alpha * right[k].norm();
                Complex::from_polar(magnitude, phase[k])
            })
            .collect();
        output.push(frame);

        for k in 0..num_bins {
            let deviation = wrap_phase(right[k].arg() - left[k].arg() - advance[k]);
            phase[k] = wrap_phase(phase[k] + advance[k] + deviation);
        }

        step += rate;
    }

    output
}

/// Wrap a phase into [-pi, pi]
fn wrap_phase(phase: f32) -> f32 {
    phase - TWO_PI * (phase / TWO_PI).round()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (TWO_PI * freq * i as f32 / sample_rate).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_stretch_ratio() {
        assert!((stretch_ratio(120.0, 65.0).unwrap() - 1.846).abs() < 0.001);
        assert!(stretch_ratio(0.0, 65.0).is_err());
        assert!(stretch_ratio(120.0, f64::NAN).is_err());
    }

    #[test]
    fn test_invalid_ratio() {
        assert!(TimeStretch::new(0.0).is_err());
        assert!(TimeStretch::new(-1.0).is_err());
        assert!(TimeStretch::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_unit_ratio_is_pass_through() {
        let input = sine(440.0, 44100.0, 5000);
        let output = TimeStretch::new(1.0).unwrap().stretch(&input);
        assert_eq!(output, input);
    }

    #[test]
    fn test_output_length_scales_inversely() {
        let input = sine(440.0, 44100.0, 44100);

        let slower = TimeStretch::new(0.5).unwrap().stretch(&input);
        assert_eq!(slower.len(), 88200);

        let faster = TimeStretch::new(1.5).unwrap().stretch(&input);
        assert_eq!(faster.len(), 29400);
    }

    #[test]
    fn test_stretch_is_length_invertible() {
        let input = sine(220.0, 44100.0, 30001);
        for ratio in [0.8, 1.3, 1.846] {
            let there = TimeStretch::new(ratio).unwrap().stretch(&input);
            let back = TimeStretch::new(1.0 / ratio).unwrap().stretch(&there);
            assert!(back.len().abs_diff(input.len()) <= 1, "ratio {}", ratio);
        }
    }

    #[test]
    fn test_silence_stays_silent() {
        let output = TimeStretch::new(0.6).unwrap().stretch(&vec![0.0; 10000]);
        assert_eq!(output.len(), 16667);
        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_stretch_keeps_level_of_steady_tone() {
        let input = sine(440.0, 44100.0, 44100);
        let output = TimeStretch::new(0.75).unwrap().stretch(&input);

        let middle = &output[8192..output.len() - 8192];
        let peak = middle.iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.1, "peak {}", peak);
    }

    #[test]
    fn test_filter_rejects_stereo() {
        let frame = AudioBuffer::new(vec![0.0; 8], 44100, crate::core::Channels::Stereo).unwrap();
        assert!(TimeStretch::new(0.5).unwrap().process(&frame).is_err());
    }

    #[test]
    fn test_wrap_phase() {
        assert!((wrap_phase(3.0 * PI) - PI).abs() < 1e-4 || (wrap_phase(3.0 * PI) + PI).abs() < 1e-4);
        assert!((wrap_phase(0.5) - 0.5).abs() < 1e-6);
        assert!((wrap_phase(-TWO_PI - 0.25) + 0.25).abs() < 1e-4);
    }
}
