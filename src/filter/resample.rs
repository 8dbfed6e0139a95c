use crate::error::{AudioError, AudioResult};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Input frames handed to the resampler per call
const CHUNK_SIZE: usize = 1024;

/// Band-limited resampler for mono signals, by an arbitrary ratio
#[derive(Debug, Clone)]
pub struct Resample {
    /// Output samples per input sample
    ratio: f64,
}

impl Resample {
    /// Create a resampler producing `ratio` output samples per input sample
    pub fn by_ratio(ratio: f64) -> AudioResult<Self> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(AudioError::TransformError(format!(
                "Resampling ratio must be positive, got {}",
                ratio
            )));
        }
        Ok(Resample { ratio })
    }

    /// Resample a mono signal to `round(len * ratio)` samples
    pub fn resample(&self, input: &[f32]) -> AudioResult<Vec<f32>> {
        let expected = (input.len() as f64 * self.ratio).round() as usize;
        if input.is_empty() || expected == 0 {
            return Ok(vec![0.0; expected]);
        }
        if self.ratio == 1.0 {
            return Ok(input.to_vec());
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };
        let mut resampler = SincFixedIn::<f32>::new(self.ratio, 1.0, params, CHUNK_SIZE, 1)?;

        let delay = resampler.output_delay();
        let mut output = Vec::with_capacity(expected + delay + CHUNK_SIZE);
        let mut position = 0;

        // Past the end of the input keep feeding silence to drain the filter delay
        while output.len() < expected + delay {
            let needed = resampler.input_frames_next();
            let mut chunk = vec![0.0f32; needed];
            if position < input.len() {
                let end = (position + needed).min(input.len());
                chunk[..end - position].copy_from_slice(&input[position..end]);
            }
            position += needed;

            let waves_in = vec![chunk];
            let waves_out = resampler.process(&waves_in, None)?;
            output.extend_from_slice(&waves_out[0]);
        }

        output.drain(..delay);
        output.truncate(expected);
        Ok(output)
    }
}
