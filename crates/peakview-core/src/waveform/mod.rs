//! Waveform core: one adapter plus a movable viewing window
//!
//! A [`Waveform`] owns exactly one [`Adapter`] and one [`Window`]. The adapter
//! is never mutated; [`Waveform::resample`] builds a brand-new waveform around a
//! freshly decimated adapter. Everything windowed (`min`, `max`, marker views)
//! is computed from the current window on each call.

mod resample;

pub use resample::{Resample, ResampleOptions, ResampleTarget};

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{PeaksError, PeaksResult};
use crate::format::{
    binary, Adapter, BinaryAdapter, ObjectAdapter, ObjectPayload, Payload, WaveformAdapter,
};
use crate::markers::{MarkerId, Point, Segment};

/// Half-open range of block indices `[start, end)` currently in view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: usize,
    end: usize,
}

impl Window {
    /// Window over the whole of a waveform with `length` blocks
    pub fn full(length: usize) -> Self {
        Self { start: 0, end: length }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of blocks in view
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether block `index` is in view
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    /// Clip `[start, end)` against this window
    ///
    /// Returns `None` when the two ranges do not overlap.
    pub fn intersect(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if start < self.end && end > self.start {
            Some((start.max(self.start), end.min(self.end)))
        } else {
            None
        }
    }
}

/// Decimated peak data with a viewing window and marker registries
#[derive(Debug, Clone)]
pub struct Waveform {
    adapter: Adapter,
    window: Window,
    pub(crate) segments: BTreeMap<MarkerId, Segment>,
    pub(crate) points: BTreeMap<MarkerId, Point>,
}

impl Waveform {
    /// Wrap an adapter; the window covers the full adapter range
    pub fn new(adapter: Adapter) -> Self {
        let window = Window::full(adapter.length());
        Self {
            adapter,
            window,
            segments: BTreeMap::new(),
            points: BTreeMap::new(),
        }
    }

    /// Detect the payload layout and wrap the resulting adapter
    pub fn from_payload(payload: Payload<'_>) -> PeaksResult<Self> {
        Ok(Self::new(Adapter::detect(payload)?))
    }

    /// Load a `.dat` (binary) or `.json` (object) peak file
    ///
    /// Other extensions are detected from the file contents.
    pub fn from_file<P: AsRef<Path>>(path: P) -> PeaksResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let adapter = match extension.as_deref() {
            Some("dat") => Adapter::Binary(BinaryAdapter::from_bytes(bytes)?),
            Some("json") => {
                let text = std::str::from_utf8(&bytes).map_err(|e| {
                    PeaksError::NoCompatibleAdapter(format!("JSON payload is not UTF-8: {}", e))
                })?;
                Adapter::Object(ObjectAdapter::from_json_str(text)?)
            }
            _ => Adapter::sniff_bytes(&bytes)?,
        };

        log::debug!(
            "Loaded {} peak data from {:?}: {} blocks at scale {}",
            adapter.kind(),
            path,
            adapter.length(),
            adapter.scale()
        );

        Ok(Self::new(adapter))
    }

    /// The wrapped adapter
    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn sample_rate(&self) -> u32 {
        self.adapter.sample_rate()
    }

    /// Audio samples per block
    pub fn scale(&self) -> u32 {
        self.adapter.scale()
    }

    /// Number of blocks
    pub fn length(&self) -> usize {
        self.adapter.length()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Window
    // ─────────────────────────────────────────────────────────────────────

    pub fn window(&self) -> Window {
        self.window
    }

    /// Move the viewing window to `[start, end)`
    ///
    /// `end` is clamped to the waveform length. Fails without touching the
    /// current window if `end <= start` or `start >= length`.
    pub fn set_offset(&mut self, start: usize, end: usize) -> PeaksResult<()> {
        let length = self.length();
        if end <= start || start >= length {
            return Err(PeaksError::InvalidOffset { start, end, length });
        }

        self.window = Window {
            start,
            end: end.min(length),
        };
        Ok(())
    }

    pub fn offset_start(&self) -> usize {
        self.window.start
    }

    pub fn offset_end(&self) -> usize {
        self.window.end
    }

    pub fn offset_length(&self) -> usize {
        self.window.len()
    }

    /// Whether block `index` lies inside the current window
    pub fn in_offset(&self, index: usize) -> bool {
        self.window.contains(index)
    }

    /// Minima of every block in the current window
    pub fn min(&self) -> Vec<i8> {
        self.offset_values(self.window.start, self.window.end, 0)
    }

    /// Maxima of every block in the current window
    pub fn max(&self) -> Vec<i8> {
        self.offset_values(self.window.start, self.window.end, 1)
    }

    /// De-interleave one side (0 = min, 1 = max) of blocks `[start, end)`
    pub(crate) fn offset_values(&self, start: usize, end: usize, side: usize) -> Vec<i8> {
        self.adapter.peaks()[start * 2..end * 2]
            .iter()
            .skip(side)
            .step_by(2)
            .copied()
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Raw access
    // ─────────────────────────────────────────────────────────────────────

    /// Peak value at flat index `index`, ignoring the window
    pub fn at(&self, index: usize) -> i8 {
        self.adapter.at(index)
    }

    /// Minimum of block `index`
    pub fn min_sample(&self, index: usize) -> i8 {
        self.adapter.at(index * 2)
    }

    /// Maximum of block `index`
    pub fn max_sample(&self, index: usize) -> i8 {
        self.adapter.at(index * 2 + 1)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Time conversions
    // ─────────────────────────────────────────────────────────────────────

    /// Total duration in seconds, independent of the window
    pub fn duration(&self) -> f64 {
        self.length() as f64 * self.seconds_per_pixel()
    }

    /// Duration of the current window in seconds
    pub fn offset_duration(&self) -> f64 {
        self.window.len() as f64 * self.seconds_per_pixel()
    }

    /// Blocks per second of audio
    pub fn pixels_per_second(&self) -> f64 {
        self.sample_rate() as f64 / self.scale() as f64
    }

    /// Seconds of audio per block
    pub fn seconds_per_pixel(&self) -> f64 {
        self.scale() as f64 / self.sample_rate() as f64
    }

    /// Block index containing time `seconds` (negative times map to 0)
    pub fn at_time(&self, seconds: f64) -> usize {
        let index = (seconds * self.sample_rate() as f64 / self.scale() as f64).floor();
        if index.is_finite() && index > 0.0 {
            index as usize
        } else {
            0
        }
    }

    /// Start time in seconds of block `index`
    pub fn time(&self, index: usize) -> f64 {
        index as f64 * self.seconds_per_pixel()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Encoding
    // ─────────────────────────────────────────────────────────────────────

    /// Encode the full peak data in the binary layout
    pub fn to_binary(&self) -> Vec<u8> {
        binary::encode(self.sample_rate(), self.scale(), self.adapter.peaks())
    }

    /// Full peak data in the object layout
    pub fn to_object(&self) -> ObjectPayload {
        ObjectAdapter::new(
            self.adapter.version(),
            self.sample_rate(),
            self.scale(),
            self.adapter.peaks().to_vec(),
        )
        .to_payload()
    }

    /// Full peak data as object-layout JSON text
    pub fn to_json(&self) -> PeaksResult<String> {
        Ok(serde_json::to_string(&self.to_object())?)
    }
}
