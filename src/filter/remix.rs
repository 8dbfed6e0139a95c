use crate::core::{AudioBuffer, Channels};
use crate::error::{AudioError, AudioResult};

/// Folds an interleaved layout down to mono by averaging each frame
pub struct Remix {
    input_channels: Channels,
}

impl Remix {
    /// Remixer that folds `input_channels` down to mono
    pub fn to_mono(input_channels: Channels) -> Self {
        Remix { input_channels }
    }

    fn downmix(input: &[f32], channels: usize) -> Vec<f32> {
        input
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

impl super::Filter for Remix {
    fn process(&mut self, frame: &AudioBuffer) -> AudioResult<AudioBuffer> {
        if frame.channels() != self.input_channels {
            return Err(AudioError::InvalidChannels {
                expected: self.input_channels.count(),
                got: frame.channels().count(),
            });
        }

        let samples = match self.input_channels {
            Channels::Mono => frame.samples().to_vec(),
            layout => Self::downmix(frame.samples(), layout.count() as usize),
        };

        AudioBuffer::mono(samples, frame.sample_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    #[test]
    fn test_stereo_frames_are_averaged() {
        let output = Remix::downmix(&[0.0, 1.0, 0.5, -0.5, 0.8, 0.4], 2);
        assert_eq!(output.len(), 3);
        assert!((output[0] - 0.5).abs() < 1e-6);
        assert!(output[1].abs() < 1e-6);
        assert!((output[2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_mono_passes_through() {
        let frame = AudioBuffer::mono(vec![0.1, -0.2, 0.3], 22050).unwrap();
        let output = Remix::to_mono(Channels::Mono).process(&frame).unwrap();
        assert_eq!(output, frame);
    }

    #[test]
    fn test_remix_surround_to_mono() {
        let frame = AudioBuffer::new(vec![0.6; 12], 48000, Channels::Multi(6)).unwrap();
        let output = Remix::to_mono(Channels::Multi(6))
            .process(&frame)
            .unwrap();

        assert_eq!(output.channels(), Channels::Mono);
        assert_eq!(output.sample_rate(), 48000);
        assert_eq!(output.samples().len(), 2);
        assert!((output.samples()[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_remix_rejects_wrong_input_layout() {
        let frame = AudioBuffer::mono(vec![0.1, 0.2], 44100).unwrap();
        let result = Remix::to_mono(Channels::Stereo).process(&frame);
        assert!(matches!(
            result,
            Err(AudioError::InvalidChannels { expected: 2, got: 1 })
        ));
    }
}
