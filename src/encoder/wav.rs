use super::pcm::PcmSegment;
use crate::core::{BitDepth, Channels};
use crate::error::{AudioError, AudioResult};
use hound::{SampleFormat, WavSpec, WavWriter};
use log::debug;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// 16-bit PCM WAV encoder.
///
/// Samples go to a temporary file next to the destination, which is renamed
/// over the destination by [`finalize`](super::Encoder::finalize). Dropping
/// the encoder before that removes the temporary file and leaves the
/// destination untouched.
pub struct WavEncoder {
    writer: Option<WavWriter<BufWriter<File>>>,
    staging: Option<NamedTempFile>,
    path: PathBuf,
    sample_rate: u32,
    channels: Channels,
}

impl WavEncoder {
    /// Create a new WAV encoder to file
    pub fn new<P: AsRef<Path>>(path: P, sample_rate: u32, channels: Channels) -> AudioResult<Self> {
        let path = path.as_ref().to_path_buf();
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { rate: sample_rate });
        }

        let spec = WavSpec {
            channels: channels.count() as u16,
            sample_rate,
            bits_per_sample: BitDepth::I16.bits(),
            sample_format: SampleFormat::Int,
        };

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let staging = staging_file(&directory, &path)?;
        let file = staging
            .reopen()
            .map_err(|e| AudioError::WriteError(e.to_string()))?;
        let writer = WavWriter::new(BufWriter::new(file), spec)?;

        debug!(
            "Staging {} in {}",
            path.display(),
            staging.path().display()
        );

        Ok(WavEncoder {
            writer: Some(writer),
            staging: Some(staging),
            path,
            sample_rate,
            channels,
        })
    }

    /// Get the number of samples written
    pub fn samples_written(&self) -> u32 {
        self.writer.as_ref().map(|w| w.len()).unwrap_or(0)
    }
}

/// Temporary file in `directory` that ends up with the permissions a plainly
/// created `destination` would have. An existing destination keeps its own.
fn staging_file(directory: &Path, destination: &Path) -> AudioResult<NamedTempFile> {
    let mut builder = Builder::new();
    builder.prefix(".vocal-reshape-").suffix(".wav.tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // open(2) masks this with the umask, same as File::create
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    let staging = builder.tempfile_in(directory).map_err(|e| {
        AudioError::WriteError(format!(
            "cannot create temporary file in {}: {}",
            directory.display(),
            e
        ))
    })?;

    if let Ok(existing) = fs::metadata(destination) {
        fs::set_permissions(staging.path(), existing.permissions()).map_err(|e| {
            AudioError::WriteError(format!(
                "cannot copy permissions of {}: {}",
                destination.display(),
                e
            ))
        })?;
    }

    Ok(staging)
}

impl super::Encoder for WavEncoder {
    fn encode(&mut self, segment: &PcmSegment) -> AudioResult<()> {
        if segment.sample_rate() != self.sample_rate {
            return Err(AudioError::InvalidSampleRate {
                rate: segment.sample_rate(),
            });
        }

        if segment.channels() != self.channels {
            return Err(AudioError::InvalidChannels {
                expected: self.channels.count(),
                got: segment.channels().count(),
            });
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| AudioError::WriteError("Encoder already finalized".to_string()))?;

        for &sample in segment.samples() {
            writer.write_sample(sample)?;
        }

        Ok(())
    }

    fn finalize(&mut self) -> AudioResult<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize()?;
        }
        if let Some(staging) = self.staging.take() {
            staging.persist(&self.path).map_err(|e| {
                AudioError::WriteError(format!("cannot move output to {}: {}", self.path.display(), e))
            })?;
        }
        Ok(())
    }
}
