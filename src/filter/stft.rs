//! Offline short-time Fourier transform used by the phase vocoder.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Window-sum values below this are treated as silence during resynthesis
const WINDOW_SUM_FLOOR: f32 = 1e-6;

/// Forward/inverse STFT with a Hann window and centered frames
pub struct Stft {
    fft_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Stft {
    /// Plan transforms for the given frame and hop sizes
    pub fn new(fft_size: usize, hop_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / fft_size as f32).cos()))
            .collect();

        Stft {
            fft_size,
            hop_size,
            window,
            forward: planner.plan_fft_forward(fft_size),
            inverse: planner.plan_fft_inverse(fft_size),
        }
    }

    /// FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Hop size
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Number of positive frequency bins (size/2 + 1)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Split a signal into windowed spectra.
    ///
    /// The signal is zero padded by half a frame on both sides so frame `t`
    /// is centered on sample `t * hop_size`.
    pub fn analyze(&self, signal: &[f32]) -> Vec<Vec<Complex<f32>>> {
        let pad = self.fft_size / 2;
        let mut padded = vec![0.0f32; pad];
        padded.extend_from_slice(signal);
        padded.resize(padded.len() + pad, 0.0);
        if padded.len() < self.fft_size {
            padded.resize(self.fft_size, 0.0);
        }

        let num_frames = 1 + (padded.len() - self.fft_size) / self.hop_size;
        let mut buffer = vec![Complex::new(0.0, 0.0); self.fft_size];

        (0..num_frames)
            .map(|t| {
                let start = t * self.hop_size;
                for (i, slot) in buffer.iter_mut().enumerate() {
                    *slot = Complex::new(padded[start + i] * self.window[i], 0.0);
                }
                self.forward.process(&mut buffer);
                buffer[..self.num_bins()].to_vec()
            })
            .collect()
    }

    /// Overlap-add spectra back into a signal of exactly `length` samples
    pub fn synthesize(&self, frames: &[Vec<Complex<f32>>], length: usize) -> Vec<f32> {
        if frames.is_empty() {
            return vec![0.0; length];
        }

        let n = self.fft_size;
        let total = n + self.hop_size * (frames.len() - 1);
        let mut output = vec![0.0f32; total];
        let mut window_sum = vec![0.0f32; total];
        let mut buffer = vec![Complex::new(0.0, 0.0); n];
        let scale = 1.0 / n as f32;

        for (t, frame) in frames.iter().enumerate() {
            // Rebuild the full spectrum from its positive half
            buffer[..self.num_bins()].copy_from_slice(&frame[..self.num_bins()]);
            for k in 1..n / 2 {
                buffer[n - k] = frame[k].conj();
            }
            self.inverse.process(&mut buffer);

            let start = t * self.hop_size;
            for i in 0..n {
                output[start + i] += buffer[i].re * scale * self.window[i];
                window_sum[start + i] += self.window[i] * self.window[i];
            }
        }

        for (sample, weight) in output.iter_mut().zip(&window_sum) {
            if *weight > WINDOW_SUM_FLOOR {
                *sample /= *weight;
            }
        }

        let pad = n / 2;
        let mut signal: Vec<f32> = output.into_iter().skip(pad).take(length).collect();
        signal.resize(length, 0.0);
        signal
    }
}
