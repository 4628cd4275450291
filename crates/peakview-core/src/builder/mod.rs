//! Audio decode bridge
//!
//! Turns decoded PCM into 8-bit peak pairs in the binary layout and wraps the
//! result in a [`Waveform`]. For every block of `scale` consecutive samples the
//! channels are averaged, multiplied by `scale_adjuster * amplitude_scale`,
//! floored, and the block's running min/max is clamped into `[-128, 127]`.
//! A trailing block with fewer than `scale` samples is dropped.
//!
//! Decoding itself is delegated to an [`AudioDecoder`]; [`build_waveform`] is
//! fire-and-forget with a completion callback and [`build_waveform_async`]
//! wraps the same flow in a oneshot channel.

mod decoder;

pub use decoder::{decode_bytes, AudioDecoder, DecodeCallback, SymphoniaDecoder};

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::{PeaksError, PeaksResult};
use crate::format::{binary, Adapter, BinaryAdapter, PEAK_MAX, PEAK_MIN};
use crate::waveform::Waveform;

// ─────────────────────────────────────────────────────────────────────────────
// Decoded audio
// ─────────────────────────────────────────────────────────────────────────────

/// PCM samples handed back by a host decoder
///
/// Samples are nominally in `[-1.0, 1.0]`. All channels have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    channels: Vec<Vec<f32>>,
    length: usize,
    sample_rate: u32,
}

impl DecodedAudio {
    /// Wrap per-channel sample arrays
    ///
    /// Fails if there are no channels, the channels differ in length, or the
    /// sample rate is zero.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> PeaksResult<Self> {
        let length = match channels.first() {
            Some(first) => first.len(),
            None => return Err(PeaksError::Decode("Decoded audio has no channels".to_string())),
        };
        if channels.iter().any(|channel| channel.len() != length) {
            return Err(PeaksError::Decode(
                "Decoded channels differ in length".to_string(),
            ));
        }
        if sample_rate == 0 {
            return Err(PeaksError::Decode("Decoded audio has sample rate 0".to_string()));
        }
        Ok(Self {
            channels,
            length,
            sample_rate,
        })
    }

    /// Split interleaved frames into per-channel arrays
    ///
    /// An incomplete trailing frame is ignored.
    pub fn from_interleaved(
        samples: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> PeaksResult<Self> {
        if channel_count == 0 {
            return Err(PeaksError::Decode("Decoded audio has no channels".to_string()));
        }
        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(channels, sample_rate)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.length as f64 / self.sample_rate as f64
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Build options
// ─────────────────────────────────────────────────────────────────────────────

/// Peak building parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Samples per block
    /// Default: 512
    pub scale: u32,

    /// Extra gain applied before quantizing
    /// Default: 1.0
    pub amplitude_scale: f64,

    /// Multiplier mapping `[-1, 1]` onto the 8-bit range
    /// Default: 127.0
    pub scale_adjuster: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            scale: 512,
            amplitude_scale: 1.0,
            scale_adjuster: f64::from(PEAK_MAX),
        }
    }
}

impl BuildOptions {
    pub fn with_scale(scale: u32) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> PeaksResult<()> {
        if self.scale == 0 {
            return Err(PeaksError::InvalidConfig("scale 0".to_string()));
        }
        if !self.amplitude_scale.is_finite() {
            return Err(PeaksError::InvalidConfig(format!(
                "amplitude_scale {}",
                self.amplitude_scale
            )));
        }
        if !self.scale_adjuster.is_finite() || self.scale_adjuster <= 0.0 {
            return Err(PeaksError::InvalidConfig(format!(
                "scale_adjuster {}",
                self.scale_adjuster
            )));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Peak building
// ─────────────────────────────────────────────────────────────────────────────

/// Interleaved min/max peaks for `audio`, one pair per full block of
/// `options.scale` samples
pub fn build_peaks(audio: &DecodedAudio, options: &BuildOptions) -> Vec<i8> {
    let scale = options.scale.max(1) as usize;
    let blocks = audio.length / scale;
    let gain = options.scale_adjuster * options.amplitude_scale / audio.channel_count() as f64;
    let floor = i32::from(PEAK_MIN);
    let ceil = i32::from(PEAK_MAX);

    let mut peaks = Vec::with_capacity(blocks * 2);
    for block in 0..blocks {
        let mut min = ceil;
        let mut max = floor;
        for i in block * scale..(block + 1) * scale {
            let sum: f64 = audio.channels.iter().map(|c| f64::from(c[i])).sum();
            let value = (sum * gain).floor();
            let value = if value.is_nan() {
                0
            } else {
                value.clamp(f64::from(floor), f64::from(ceil)) as i32
            };
            min = min.min(value);
            max = max.max(value);
        }
        peaks.push(min as i8);
        peaks.push(max as i8);
    }
    peaks
}

/// Peaks for `audio` encoded in the binary layout
pub fn build_binary(audio: &DecodedAudio, options: &BuildOptions) -> Vec<u8> {
    binary::encode(audio.sample_rate, options.scale, &build_peaks(audio, options))
}

/// Build a [`Waveform`] over a binary adapter from decoded audio
pub fn waveform_from_audio(audio: &DecodedAudio, options: &BuildOptions) -> PeaksResult<Waveform> {
    options.validate()?;
    let start = Instant::now();
    let adapter = BinaryAdapter::from_bytes(build_binary(audio, options))?;
    let waveform = Waveform::new(Adapter::Binary(adapter));
    log::info!(
        "Built {} blocks at scale {} from {:.2}s of audio ({} channels) in {:?}",
        waveform.length(),
        options.scale,
        audio.duration(),
        audio.channel_count(),
        start.elapsed()
    );
    Ok(waveform)
}

// ─────────────────────────────────────────────────────────────────────────────
// Async entry points
// ─────────────────────────────────────────────────────────────────────────────

/// Decode `encoded` with `decoder` and build a waveform from the result
///
/// Returns immediately; `callback` runs exactly once on whichever thread the
/// decoder completes on. Invalid options are reported through the callback
/// before the decoder is invoked. A decode failure is passed through as-is
/// and no partial waveform is produced.
pub fn build_waveform<F>(decoder: &dyn AudioDecoder, encoded: Vec<u8>, options: BuildOptions, callback: F)
where
    F: FnOnce(PeaksResult<Waveform>) + Send + 'static,
{
    if let Err(e) = options.validate() {
        log::error!("build_waveform: {}", e);
        callback(Err(e));
        return;
    }

    log::debug!(
        "build_waveform: Decoding {} bytes at scale {}",
        encoded.len(),
        options.scale
    );
    decoder.decode_audio_data(
        encoded,
        Box::new(move |decoded| {
            let result = decoded.and_then(|audio| waveform_from_audio(&audio, &options));
            if let Err(ref e) = result {
                log::error!("build_waveform: {}", e);
            }
            callback(result);
        }),
    );
}

/// [`build_waveform`] delivering the result through a oneshot channel
pub fn build_waveform_async(
    decoder: &dyn AudioDecoder,
    encoded: Vec<u8>,
    options: BuildOptions,
) -> oneshot::Receiver<PeaksResult<Waveform>> {
    let (tx, rx) = oneshot::channel();
    build_waveform(decoder, encoded, options, move |result| {
        // Receiver may have been dropped; nothing to report to
        let _ = tx.send(result);
    });
    rx
}
