//! Audio encoder implementations

pub mod pcm;
pub mod wav;

pub use pcm::{FULL_SCALE, PcmSegment};
pub use wav::WavEncoder;

use crate::error::AudioResult;
use std::path::Path;

/// Trait for audio encoders
pub trait Encoder {
    /// Encode a quantized segment to output
    fn encode(&mut self, segment: &PcmSegment) -> AudioResult<()>;

    /// Finalize encoding (flush any remaining data)
    fn finalize(&mut self) -> AudioResult<()> {
        Ok(())
    }
}

/// Write a whole segment to a WAV file at `path`, replacing it atomically
pub fn write_wav<P: AsRef<Path>>(path: P, segment: &PcmSegment) -> AudioResult<u32> {
    let mut encoder = WavEncoder::new(path, segment.sample_rate(), segment.channels())?;
    encoder.encode(segment)?;
    let written = encoder.samples_written();
    encoder.finalize()?;
    Ok(written)
}
