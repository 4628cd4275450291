//! Host audio decoders
//!
//! The bridge never decodes compressed audio itself: it hands the encoded
//! bytes to an [`AudioDecoder`] and waits for the completion callback.
//! [`SymphoniaDecoder`] is the bundled implementation, decoding WAV, FLAC and
//! MP3 on the rayon thread pool.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{PeaksError, PeaksResult};

use super::DecodedAudio;

/// Completion callback for a single decode request
pub type DecodeCallback = Box<dyn FnOnce(PeaksResult<DecodedAudio>) + Send + 'static>;

/// Asynchronous decoder for encoded audio
///
/// Implementations must invoke `on_complete` exactly once, either with the
/// decoded PCM or with the failure. There is no cancellation and no retry.
pub trait AudioDecoder: Send + Sync {
    fn decode_audio_data(&self, encoded: Vec<u8>, on_complete: DecodeCallback);
}

/// [`AudioDecoder`] backed by symphonia
///
/// Every request is decoded on its own rayon task, so concurrent requests
/// are independent of each other.
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    extension_hint: Option<String>,
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that hints the container format by file extension (`"wav"`,
    /// `"flac"`, `"mp3"`)
    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension_hint: Some(extension.into()),
        }
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode_audio_data(&self, encoded: Vec<u8>, on_complete: DecodeCallback) {
        let hint = self.extension_hint.clone();
        rayon::spawn(move || {
            on_complete(decode_bytes(encoded, hint.as_deref()));
        });
    }
}

/// Decode an in-memory audio file into per-channel samples
pub fn decode_bytes(encoded: Vec<u8>, extension: Option<&str>) -> PeaksResult<DecodedAudio> {
    let start = std::time::Instant::now();
    let byte_len = encoded.len();
    let mss = MediaSourceStream::new(Box::new(Cursor::new(encoded)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PeaksError::Decode(format!("Failed to probe format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PeaksError::Decode("No audio track found".to_string()))?
        .clone();

    let mut sample_rate = track.codec_params.sample_rate;
    let mut channel_count = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PeaksError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                log::warn!(
                    "decode_bytes: Stream reset required after {} samples, stopping early",
                    samples.len()
                );
                break;
            }
            Err(e) => return Err(PeaksError::Decode(format!("Error reading packet: {}", e))),
        };

        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("decode_bytes: Skipping corrupt packet: {}", e);
                continue;
            }
            Err(e) => return Err(PeaksError::Decode(format!("Decode error: {}", e))),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channel_count.get_or_insert(spec.channels.count());

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    let sample_rate =
        sample_rate.ok_or_else(|| PeaksError::Decode("No sample rate in track".to_string()))?;
    let channel_count =
        channel_count.ok_or_else(|| PeaksError::Decode("No channel layout in track".to_string()))?;

    let audio = DecodedAudio::from_interleaved(&samples, channel_count, sample_rate)?;
    log::debug!(
        "decode_bytes: {} bytes -> {} frames x {} channels @ {} Hz in {:?}",
        byte_len,
        audio.length(),
        audio.channel_count(),
        sample_rate,
        start.elapsed()
    );
    Ok(audio)
}
