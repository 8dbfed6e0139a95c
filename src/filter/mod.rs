//! Audio filter implementations

pub mod pitch;
pub mod remix;
pub mod resample;
pub mod stft;
pub mod stretch;

pub use pitch::PitchShift;
pub use remix::Remix;
pub use resample::Resample;
pub use stretch::{TimeStretch, stretch_ratio};

use crate::core::AudioBuffer;
use crate::error::AudioResult;

/// Trait for audio filters
pub trait Filter {
    /// Process a whole buffer through this filter, producing a new one
    fn process(&mut self, frame: &AudioBuffer) -> AudioResult<AudioBuffer>;
}
