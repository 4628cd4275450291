//! Object / JSON peak layout

use serde::{Deserialize, Serialize};

use crate::error::{PeaksError, PeaksResult};

use super::{quantize_peak, BitDepth, WaveformAdapter, FORMAT_VERSION};

/// Serialized form of the object layout
///
/// `data` holds `length * 2` numbers, interleaved min/max.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bits: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    pub sample_rate: u32,
    pub samples_per_pixel: u32,
    pub length: usize,
    pub data: Vec<f64>,
}

/// Peak data decoded from the object layout
///
/// Values are rounded and clamped into the 8-bit range on construction.
#[derive(Debug, Clone)]
pub struct ObjectAdapter {
    version: u32,
    sample_rate: u32,
    scale: u32,
    data: Vec<i8>,
}

impl ObjectAdapter {
    /// Build an adapter from 8-bit peaks
    ///
    /// Fails on a zero sample rate or scale, or an odd number of values.
    pub fn from_peaks(version: u32, sample_rate: u32, scale: u32, data: Vec<i8>) -> PeaksResult<Self> {
        if sample_rate == 0 {
            return Err(PeaksError::InvalidHeader("sample rate 0".to_string()));
        }
        if scale == 0 {
            return Err(PeaksError::InvalidHeader("scale 0".to_string()));
        }
        if data.len() % 2 != 0 {
            return Err(PeaksError::InvalidHeader(format!(
                "{} peak values do not form min/max pairs",
                data.len()
            )));
        }
        Ok(Self::new(version, sample_rate, scale, data))
    }

    /// Unchecked constructor for peaks produced inside the crate
    pub(crate) fn new(version: u32, sample_rate: u32, scale: u32, data: Vec<i8>) -> Self {
        debug_assert!(data.len() % 2 == 0, "peaks must be min/max pairs");
        Self {
            version,
            sample_rate,
            scale,
            data,
        }
    }

    /// Decode a parsed JSON value
    pub fn from_value(value: serde_json::Value) -> PeaksResult<Self> {
        let payload: ObjectPayload = serde_json::from_value(value)?;
        Self::from_payload(payload)
    }

    /// Parse and decode JSON text
    pub fn from_json_str(text: &str) -> PeaksResult<Self> {
        let payload: ObjectPayload = serde_json::from_str(text)?;
        Self::from_payload(payload)
    }

    /// Validate a deserialized payload
    pub fn from_payload(payload: ObjectPayload) -> PeaksResult<Self> {
        let version = payload.version.unwrap_or(FORMAT_VERSION);
        if version == 0 || version > 2 {
            return Err(PeaksError::UnsupportedVersion(version));
        }
        if let Some(channels) = payload.channels {
            if channels != 1 {
                return Err(PeaksError::InvalidHeader(format!(
                    "{} channels, only single-channel peaks are supported",
                    channels
                )));
            }
        }
        if let Some(bits) = payload.bits {
            let depth = BitDepth::from_bits(bits)?;
            if depth != BitDepth::Eight {
                return Err(PeaksError::UnsupportedBitDepth(depth.bits()));
            }
        }
        if payload.sample_rate == 0 {
            return Err(PeaksError::InvalidHeader("sample rate 0".to_string()));
        }
        if payload.samples_per_pixel == 0 {
            return Err(PeaksError::InvalidHeader("samples_per_pixel 0".to_string()));
        }
        let expected = payload.length * 2;
        if payload.data.len() != expected {
            return Err(PeaksError::LengthMismatch {
                expected,
                found: payload.data.len(),
            });
        }

        Ok(Self {
            version,
            sample_rate: payload.sample_rate,
            scale: payload.samples_per_pixel,
            data: payload.data.iter().map(|&v| quantize_peak(v)).collect(),
        })
    }

    /// Serializable form of this adapter's data
    pub fn to_payload(&self) -> ObjectPayload {
        ObjectPayload {
            version: Some(self.version),
            bits: Some(8),
            channels: None,
            sample_rate: self.sample_rate,
            samples_per_pixel: self.scale,
            length: self.data.len() / 2,
            data: self.data.iter().map(|&v| v as f64).collect(),
        }
    }
}

impl WaveformAdapter for ObjectAdapter {
    fn version(&self) -> u32 {
        self.version
    }

    fn bit_depth(&self) -> BitDepth {
        BitDepth::Eight
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn scale(&self) -> u32 {
        self.scale
    }

    fn length(&self) -> usize {
        self.data.len() / 2
    }

    fn peaks(&self) -> &[i8] {
        &self.data
    }
}
