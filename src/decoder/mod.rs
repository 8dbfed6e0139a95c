//! Audio decoder implementations

pub mod symphonia;

pub use symphonia::SymphoniaDecoder;

use crate::config::ChannelPolicy;
use crate::core::{AudioBuffer, AudioMetadata, Channels};
use crate::error::{AudioError, AudioResult};
use crate::filter::{Filter, Remix};
use log::debug;
use std::path::Path;

/// Trait for audio decoders
pub trait Decoder: Send {
    /// Get next chunk of decoded audio from the stream
    fn decode_frame(&mut self) -> AudioResult<Option<AudioBuffer>>;

    /// Stream information probed when the decoder was opened
    fn metadata(&self) -> &AudioMetadata;
}

/// Create a decoder from a file path
pub fn from_file<P: AsRef<Path>>(path: P) -> AudioResult<Box<dyn Decoder>> {
    let path = path.as_ref();
    SymphoniaDecoder::from_file(path).map(|d| Box::new(d) as Box<dyn Decoder>)
}

/// Decode a whole file into one mono buffer at its native sample rate.
///
/// Also returns what the probe reported, so callers need not open the file
/// a second time.
pub fn load<P: AsRef<Path>>(
    path: P,
    policy: ChannelPolicy,
) -> AudioResult<(AudioBuffer, AudioMetadata)> {
    let mut decoder = from_file(path)?;
    let metadata = decoder.metadata().clone();
    let sample_rate = metadata.sample_rate;
    let channels = metadata.channels;

    let mut samples = Vec::new();
    while let Some(frame) = decoder.decode_frame()? {
        if frame.channels() != channels {
            return Err(AudioError::InvalidMetadata(format!(
                "Channel layout changed mid-stream from {} to {}",
                channels,
                frame.channels()
            )));
        }
        samples.extend_from_slice(frame.samples());
    }

    let buffer = AudioBuffer::new(samples, sample_rate, channels)?;
    debug!(
        "Decoded {} frames of {} audio",
        buffer.samples_per_channel(),
        channels
    );

    let mono = match (channels, policy) {
        (Channels::Mono, _) => buffer,
        (_, ChannelPolicy::Downmix) => Remix::to_mono(channels).process(&buffer)?,
        (other, ChannelPolicy::Reject) => {
            return Err(AudioError::InvalidChannels {
                expected: 1,
                got: other.count(),
            });
        }
    };

    Ok((mono, metadata))
}
