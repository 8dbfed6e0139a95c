//! Tempo estimation from a spectral-flux onset envelope.
//!
//! The onset envelope rises wherever spectral energy increases (syllable
//! starts, plosives, drum hits). Its autocorrelation peaks at the beat
//! period; a log-normal prior around 120 BPM picks between octave-related
//! candidates such as 60 / 120 / 240.

use log::{debug, warn};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

/// Tempo assumed when the input carries no usable rhythm
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

const FFT_SIZE: usize = 2048;
const HOP_SIZE: usize = 512;
const MIN_BPM: f64 = 40.0;
const MAX_BPM: f64 = 240.0;
/// Centre of the tempo prior
const PRIOR_BPM: f64 = 120.0;
/// Spread of the tempo prior, in octaves
const PRIOR_OCTAVES: f64 = 1.0;
/// Onset envelopes with less total flux than this are treated as silent
const FLUX_FLOOR: f32 = 1e-6;

/// A tempo estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEstimate {
    /// Beats per minute
    pub bpm: f64,
    /// Normalized autocorrelation at the chosen period (0.0 - 1.0)
    pub confidence: f32,
}

/// Estimates the tempo of a mono signal
pub struct TempoEstimator {
    sample_rate: u32,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl TempoEstimator {
    /// Create an estimator for audio at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        let mut planner = FftPlanner::new();
        let window = (0..FFT_SIZE)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / FFT_SIZE as f32).cos()))
            .collect();

        Self {
            sample_rate,
            fft: planner.plan_fft_forward(FFT_SIZE),
            window,
        }
    }

    /// Estimate the tempo, or `None` if the signal is too short or has no onsets
    pub fn estimate(&self, samples: &[f32]) -> Option<TempoEstimate> {
        let onsets = self.onset_envelope(samples);
        let frames_per_second = self.sample_rate as f64 / HOP_SIZE as f64;

        let min_lag = ((frames_per_second * 60.0 / MAX_BPM).floor() as usize).max(1);
        let max_lag = (frames_per_second * 60.0 / MIN_BPM).ceil() as usize;

        // At least two periods of the fastest tempo must fit
        if onsets.len() < 2 * min_lag + 2 {
            debug!("Too little audio for tempo estimation ({} frames)", onsets.len());
            return None;
        }
        if onsets.iter().sum::<f32>() < FLUX_FLOOR {
            debug!("Onset envelope is flat, no tempo to estimate");
            return None;
        }

        let last_lag = max_lag.min(onsets.len() / 2 - 1);
        let scores: Vec<f64> = (0..=last_lag + 1)
            .map(|lag| {
                if lag < min_lag {
                    0.0
                } else {
                    let bpm = 60.0 * frames_per_second / lag as f64;
                    correlation_at_lag(&onsets, lag) as f64 * tempo_prior(bpm)
                }
            })
            .collect();

        let best_lag = (min_lag..=last_lag)
            .max_by(|&a, &b| scores[a].total_cmp(&scores[b]))?;
        if scores[best_lag] <= 0.0 {
            return None;
        }

        let lag = refine_peak(&scores, best_lag);
        let bpm = 60.0 * frames_per_second / lag;
        let confidence = correlation_at_lag(&onsets, best_lag).clamp(0.0, 1.0);

        debug!(
            "Tempo peak at lag {:.2} frames -> {:.2} BPM (confidence {:.2})",
            lag, bpm, confidence
        );

        Some(TempoEstimate { bpm, confidence })
    }

    /// Estimate the tempo, falling back to [`DEFAULT_TEMPO_BPM`]
    pub fn estimate_or_default(&self, samples: &[f32]) -> TempoEstimate {
        self.estimate(samples).unwrap_or_else(|| {
            warn!(
                "Could not estimate tempo, assuming {:.0} BPM",
                DEFAULT_TEMPO_BPM
            );
            TempoEstimate {
                bpm: DEFAULT_TEMPO_BPM,
                confidence: 0.0,
            }
        })
    }

    /// Half-wave rectified spectral flux per hop, scaled to a peak of 1.0
    fn onset_envelope(&self, samples: &[f32]) -> Vec<f32> {
        let mut envelope = Vec::new();
        let mut previous: Option<Vec<f32>> = None;
        let mut buffer = vec![Complex::new(0.0f32, 0.0); FFT_SIZE];

        let mut start = 0;
        while start + FFT_SIZE <= samples.len() {
            let frame = &samples[start..start + FFT_SIZE];
            for ((slot, &sample), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(sample * w, 0.0);
            }
            self.fft.process(&mut buffer);

            // Log compression keeps quiet syllables from vanishing next to loud ones
            let spectrum: Vec<f32> = buffer[..FFT_SIZE / 2]
                .iter()
                .map(|c| (1.0 + 100.0 * c.norm()).ln())
                .collect();

            if let Some(prev) = &previous {
                let flux: f32 = spectrum
                    .iter()
                    .zip(prev)
                    .map(|(curr, prev)| (curr - prev).max(0.0))
                    .sum();
                envelope.push(flux);
            }

            previous = Some(spectrum);
            start += HOP_SIZE;
        }

        let max = envelope.iter().copied().fold(0.0f32, f32::max);
        if max > 0.0 {
            for v in &mut envelope {
                *v /= max;
            }
        }

        envelope
    }
}

/// Normalized correlation of the envelope with itself shifted by `lag`
fn correlation_at_lag(envelope: &[f32], lag: usize) -> f32 {
    if lag == 0 || lag >= envelope.len() {
        return 0.0;
    }

    let mut correlation = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for i in 0..envelope.len() - lag {
        correlation += envelope[i] * envelope[i + lag];
        norm_a += envelope[i] * envelope[i];
        norm_b += envelope[i + lag] * envelope[i + lag];
    }

    let norm = (norm_a * norm_b).sqrt();
    if norm > 0.0 { correlation / norm } else { 0.0 }
}

/// Log-normal weight favouring tempos near [`PRIOR_BPM`]
fn tempo_prior(bpm: f64) -> f64 {
    let octaves = (bpm / PRIOR_BPM).log2() / PRIOR_OCTAVES;
    (-0.5 * octaves * octaves).exp()
}

/// Sub-frame position of the peak at `index`, by parabolic interpolation
fn refine_peak(scores: &[f64], index: usize) -> f64 {
    if index == 0 || index + 1 >= scores.len() {
        return index as f64;
    }
    let (a, b, c) = (scores[index - 1], scores[index], scores[index + 1]);
    let denominator = a - 2.0 * b + c;
    if denominator.abs() < f64::EPSILON {
        return index as f64;
    }
    let offset = (0.5 * (a - c) / denominator).clamp(-0.5, 0.5);
    index as f64 + offset
}
