use super::resample::Resample;
use super::stretch::TimeStretch;
use crate::core::AudioBuffer;
use crate::error::AudioResult;

/// Duration-preserving pitch shift by whole semitones.
///
/// The signal is time-stretched by the pitch factor and then resampled back
/// to its original length, which moves every frequency by the same factor.
#[derive(Debug, Clone)]
pub struct PitchShift {
    semitones: i32,
}

impl PitchShift {
    /// Create a pitch shifter; negative values lower the pitch
    pub fn new(semitones: i32) -> Self {
        PitchShift { semitones }
    }

    /// Get the shift in semitones
    pub fn semitones(&self) -> i32 {
        self.semitones
    }

    /// Frequency multiplier, 2^(semitones/12)
    pub fn factor(&self) -> f64 {
        2.0f64.powf(self.semitones as f64 / 12.0)
    }

    /// Shift a mono signal, returning exactly `input.len()` samples
    pub fn shift(&self, input: &[f32]) -> AudioResult<Vec<f32>> {
        if self.semitones == 0 || input.is_empty() {
            return Ok(input.to_vec());
        }

        let factor = self.factor();
        let stretched = TimeStretch::new(1.0 / factor)?.stretch(input);
        let mut shifted = Resample::by_ratio(1.0 / factor)?.resample(&stretched)?;

        shifted.resize(input.len(), 0.0);
        Ok(shifted)
    }
}

impl super::Filter for PitchShift {
    fn process(&mut self, frame: &AudioBuffer) -> AudioResult<AudioBuffer> {
        frame.require_mono()?;
        frame.with_samples(self.shift(frame.samples())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;
    use rustfft::FftPlanner;
    use rustfft::num_complex::Complex;
    use std::f32::consts::PI;

    const RATE: f32 = 44100.0;

    fn sine(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / RATE).sin() * 0.5)
            .collect()
    }

    /// Strongest frequency in the middle of the signal, with parabolic
    /// interpolation between FFT bins
    fn dominant_frequency(signal: &[f32]) -> f32 {
        let n = 16384;
        let start = (signal.len() - n) / 2;
        let mut buffer: Vec<Complex<f32>> = signal[start..start + n]
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos());
                Complex::new(s * w, 0.0)
            })
            .collect();
        FftPlanner::<f32>::new().plan_fft_forward(n).process(&mut buffer);

        let magnitudes: Vec<f32> = buffer[..n / 2].iter().map(|c| c.norm()).collect();
        let peak = (1..n / 2 - 1)
            .max_by(|&a, &b| magnitudes[a].total_cmp(&magnitudes[b]))
            .unwrap();

        let (a, b, c) = (magnitudes[peak - 1], magnitudes[peak], magnitudes[peak + 1]);
        let offset = 0.5 * (a - c) / (a - 2.0 * b + c);
        (peak as f32 + offset) * RATE / n as f32
    }

    #[test]
    fn test_factor() {
        assert!((PitchShift::new(12).factor() - 2.0).abs() < 1e-12);
        assert!((PitchShift::new(-12).factor() - 0.5).abs() < 1e-12);
        assert!((PitchShift::new(-5).factor() - 0.7491535).abs() < 1e-6);
    }

    #[test]
    fn test_zero_semitones_is_pass_through() {
        let input = sine(440.0, 10000);
        assert_eq!(PitchShift::new(0).shift(&input).unwrap(), input);
    }

    #[test]
    fn test_shift_preserves_length() {
        let input = sine(440.0, 44100);
        for semitones in [-7, -5, 3, 12] {
            let output = PitchShift::new(semitones).shift(&input).unwrap();
            assert_eq!(output.len(), input.len());
        }
    }

    #[test]
    fn test_octave_up_doubles_frequency() {
        let input = sine(220.0, 88200);
        let output = PitchShift::new(12).shift(&input).unwrap();
        let freq = dominant_frequency(&output);
        assert!((freq - 440.0).abs() / 440.0 < 0.02, "got {} Hz", freq);
    }

    #[test]
    fn test_shift_down_five_semitones() {
        let input = sine(440.0, 88200);
        let output = PitchShift::new(-5).shift(&input).unwrap();
        let freq = dominant_frequency(&output);
        let expected = 440.0 * 0.749_153_5;
        assert!((freq - expected).abs() / expected < 0.02, "got {} Hz", freq);
    }

    #[test]
    fn test_shift_there_and_back() {
        let input = sine(440.0, 88200);
        let up = PitchShift::new(5).shift(&input).unwrap();
        let back = PitchShift::new(-5).shift(&up).unwrap();

        let original = dominant_frequency(&input);
        let restored = dominant_frequency(&back);
        assert!(
            (restored - original).abs() / original < 0.01,
            "{} Hz vs {} Hz",
            restored,
            original
        );
    }

    #[test]
    fn test_filter_keeps_rate() {
        let frame = AudioBuffer::mono(sine(300.0, 22050), 44100).unwrap();
        let output = PitchShift::new(-5).process(&frame).unwrap();
        assert_eq!(output.sample_rate(), 44100);
        assert_eq!(output.samples().len(), 22050);
    }
}
