use super::{AnalysisReport, ProcessingReport};
use crate::analysis::{TempoEstimate, TempoEstimator};
use crate::config::PipelineConfig;
use crate::core::AudioBuffer;
use crate::decoder;
use crate::encoder::{self, PcmSegment};
use crate::error::AudioResult;
use crate::filter::{Filter, PitchShift, TimeStretch, stretch_ratio};
use log::{debug, info};

/// Load -> estimate tempo -> stretch -> shift -> quantize/normalize -> write
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline, rejecting unusable parameters up front
    pub fn new(config: PipelineConfig) -> AudioResult<Self> {
        config.validate()?;
        Ok(Pipeline { config })
    }

    /// Run every stage and write the output file
    pub fn run(&self) -> AudioResult<ProcessingReport> {
        let config = &self.config;
        info!("Starting vocal processing...");

        let (buffer, _) = decoder::load(&config.input, config.channel_policy)?;
        info!(
            "Loaded audio file: {} with a sample rate of {} Hz ({:.2} s).",
            config.input.display(),
            buffer.sample_rate(),
            buffer.duration().as_secs_f64()
        );

        let (tempo, estimated) = self.source_tempo(&buffer);
        if estimated {
            info!("Estimated original tempo: {:.2} BPM.", tempo.bpm);
        } else {
            info!("Using given original tempo: {:.2} BPM.", tempo.bpm);
        }

        let ratio = stretch_ratio(tempo.bpm, config.target_bpm)?;
        debug!("Stretch ratio {:.4}", ratio);

        let reshaped = reshape(&buffer, ratio, config.semitones)?;
        info!(
            "Time-stretched audio to approximately {} BPM and pitch-shifted by {} semitones.",
            config.target_bpm, config.semitones
        );

        debug!("Peak before quantization {:.4}", reshaped.peak());

        let segment = PcmSegment::quantize(&reshaped)?.normalize(config.headroom_db);
        info!(
            "Exporting final processed vocal track to {}...",
            config.output.display()
        );
        let samples_written = encoder::write_wav(&config.output, &segment)?;
        info!("Vocal processing complete!");

        Ok(ProcessingReport {
            input_duration: buffer.duration(),
            output_duration: segment.duration(),
            tempo,
            tempo_estimated: estimated,
            stretch_ratio: ratio,
            semitones: config.semitones,
            samples_written,
            peak: segment.peak(),
        })
    }

    /// Probe and analyze the input without writing anything
    pub fn analyze(&self) -> AudioResult<AnalysisReport> {
        let config = &self.config;
        let (buffer, metadata) = decoder::load(&config.input, config.channel_policy)?;

        let (tempo, _) = self.source_tempo(&buffer);
        let ratio = stretch_ratio(tempo.bpm, config.target_bpm)?;

        Ok(AnalysisReport {
            metadata,
            decoded_duration: buffer.duration(),
            tempo,
            stretch_ratio: ratio,
            output_duration: buffer.duration().div_f64(ratio),
        })
    }

    /// The configured source tempo, or an estimate from the audio.
    ///
    /// The flag is true when the tempo was estimated.
    fn source_tempo(&self, buffer: &AudioBuffer) -> (TempoEstimate, bool) {
        match self.config.source_bpm {
            Some(bpm) => (
                TempoEstimate {
                    bpm,
                    confidence: 1.0,
                },
                false,
            ),
            None => {
                let estimate =
                    TempoEstimator::new(buffer.sample_rate()).estimate_or_default(buffer.samples());
                (estimate, true)
            }
        }
    }
}

/// Time-stretch by `ratio`, then pitch-shift by `semitones`
pub fn reshape(buffer: &AudioBuffer, ratio: f64, semitones: i32) -> AudioResult<AudioBuffer> {
    let stretched = TimeStretch::new(ratio)?.process(buffer)?;
    debug!(
        "Stretched {} -> {} samples",
        buffer.samples_per_channel(),
        stretched.samples_per_channel()
    );
    PitchShift::new(semitones).process(&stretched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChannelPolicy;
    use crate::error::AudioError;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::f32::consts::PI;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_mono(path: &Path, samples: &[f32], sample_rate: u32) {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample((s * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_reshape_identity() {
        let samples: Vec<f32> = (0..8000)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 16000.0).sin() * 0.7)
            .collect();
        let buffer = AudioBuffer::mono(samples, 16000).unwrap();

        let output = reshape(&buffer, 1.0, 0).unwrap();
        assert_eq!(output, buffer);
    }

    #[test]
    fn test_reshape_silence() {
        let buffer = AudioBuffer::mono(vec![0.0; 44100], 44100).unwrap();
        let output = reshape(&buffer, 0.5, -5).unwrap();

        assert_eq!(output.samples().len(), 88200);
        assert_eq!(output.sample_rate(), 44100);
        assert!(output.samples().iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn test_new_validates_config() {
        let config = PipelineConfig::new("in.wav", "out.wav").with_target_bpm(-1.0);
        assert!(matches!(Pipeline::new(config), Err(AudioError::ConfigError(_))));
    }

    #[test]
    fn test_source_bpm_override_skips_estimation() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        write_mono(&input, &vec![0.25; 22050], 22050);

        let config = PipelineConfig::new(&input, &output)
            .with_source_bpm(130.0)
            .with_target_bpm(65.0)
            .with_semitones(0);
        let report = Pipeline::new(config).unwrap().run().unwrap();

        assert!(!report.tempo_estimated);
        assert_eq!(report.stretch_ratio, 2.0);
        assert_eq!(report.samples_written, 11025);
    }

    #[test]
    fn test_analyze_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.wav");
        write_mono(&input, &vec![0.0; 44100], 44100);

        let config = PipelineConfig::new(&input, &output)
            .with_channel_policy(ChannelPolicy::Reject)
            .with_target_bpm(60.0);
        let report = Pipeline::new(config).unwrap().analyze().unwrap();

        assert_eq!(report.metadata.sample_rate, 44100);
        assert_eq!(report.tempo.confidence, 0.0);
        assert_eq!(report.stretch_ratio, 2.0);
        assert!(!output.exists());
    }
}
