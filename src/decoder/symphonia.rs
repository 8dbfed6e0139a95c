use crate::core::{AudioBuffer, AudioMetadata, BitDepth, Channels};
use crate::error::{AudioError, AudioResult};
use log::debug;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Symphonia-based audio decoder
pub struct SymphoniaDecoder {
    /// Container reader for the audio source
    reader: Box<dyn FormatReader>,
    /// Codec decoder for the selected track
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
    /// Track being decoded
    track_id: u32,
    /// Probed stream information
    metadata: AudioMetadata,
    /// Whether decoding is finished
    finished: bool,
}

impl SymphoniaDecoder {
    /// Create decoder from file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> AudioResult<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AudioError::NotFound(path.to_path_buf()),
            _ => AudioError::DecodeError(format!("cannot open {}: {}", path.display(), e)),
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Extension is only a hint, the probe still sniffs the content
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::InvalidMetadata("No audio track found".to_string()))?;

        let track_id = track.id;
        let codec_params = &track.codec_params;

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| AudioError::InvalidMetadata("Unknown sample rate".to_string()))?;

        let channels = match codec_params.channels {
            Some(channels) => Channels::from_count(channels.count() as u32)?,
            None => {
                return Err(AudioError::InvalidMetadata(
                    "Unknown channel count".to_string(),
                ));
            }
        };

        let codec = symphonia::default::get_codecs()
            .get_codec(codec_params.codec)
            .map(|descriptor| descriptor.short_name.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let mut metadata = AudioMetadata::new(sample_rate, channels, codec)?;
        if let Some(frames) = codec_params.n_frames {
            metadata = metadata
                .with_duration(Duration::from_secs_f64(frames as f64 / sample_rate as f64));
        }
        if let Some(bit_depth) = codec_params.bits_per_sample.and_then(BitDepth::from_bits) {
            metadata = metadata.with_bit_depth(bit_depth);
        }

        let decoder = symphonia::default::get_codecs()
            .make(codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;

        debug!(
            "Opened {} ({}, {} Hz, {})",
            path.display(),
            metadata.codec,
            sample_rate,
            channels
        );

        Ok(SymphoniaDecoder {
            reader,
            decoder,
            track_id,
            metadata,
            finished: false,
        })
    }

}

impl super::Decoder for SymphoniaDecoder {
    fn decode_frame(&mut self) -> AudioResult<Option<AudioBuffer>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.finished = true;
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packet, keep going with the next one
                    debug!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let channels = Channels::from_count(spec.channels.count() as u32)?;
            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            let buffer = AudioBuffer::new(
                sample_buf.samples().to_vec(),
                self.metadata.sample_rate,
                channels,
            )?;

            return Ok(Some(buffer));
        }
    }

    fn metadata(&self) -> &AudioMetadata {
        &self.metadata
    }
}
