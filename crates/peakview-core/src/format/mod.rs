//! Wire formats for peak data
//!
//! Two interchangeable layouts decode into the same read interface:
//!
//! - **Binary** (`.dat`): a 20-byte little-endian header followed by signed
//!   8-bit min/max pairs. See [`binary`].
//! - **Object** (`.json`): `{ version?, bits?, sample_rate, samples_per_pixel,
//!   length, data }`. See [`object`].
//!
//! The variant is chosen explicitly by [`Adapter::detect`] from a tagged
//! [`Payload`]; a payload that fits neither layout is a
//! [`PeaksError::NoCompatibleAdapter`].

pub mod binary;
pub mod object;

pub use binary::{BinaryAdapter, BinaryHeader, HEADER_SIZE};
pub use object::{ObjectAdapter, ObjectPayload};

use crate::error::{PeaksError, PeaksResult};

/// Wire format version written by the encoders
pub const FORMAT_VERSION: u32 = 1;

/// Lowest peak value representable in the 8-bit encoding
pub const PEAK_MIN: i8 = i8::MIN;

/// Highest peak value representable in the 8-bit encoding
pub const PEAK_MAX: i8 = i8::MAX;

/// Peak sample width declared by a payload
///
/// Sixteen-bit peaks are recognised so they can be reported, but neither
/// adapter accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    /// Number of bits per peak value
    pub fn bits(&self) -> u8 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// Map an object payload's `bits` field
    pub fn from_bits(bits: u8) -> PeaksResult<Self> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            other => Err(PeaksError::UnsupportedBitDepth(other)),
        }
    }
}

/// Uniform read interface over decoded peak data
///
/// Flat index `2k` is the minimum of block `k`, `2k + 1` its maximum.
pub trait WaveformAdapter {
    /// Wire format version of the source payload
    fn version(&self) -> u32;

    /// Declared peak width
    fn bit_depth(&self) -> BitDepth;

    /// Audio sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Audio samples represented by one block
    fn scale(&self) -> u32;

    /// Number of blocks (min/max pairs)
    fn length(&self) -> usize;

    /// All peak values, interleaved min/max
    fn peaks(&self) -> &[i8];

    /// Peak value at a flat index
    ///
    /// # Panics
    ///
    /// Panics if `index >= length() * 2`.
    fn at(&self, index: usize) -> i8 {
        self.peaks()[index]
    }

    /// Whether the payload declared 8-bit peaks
    fn is_eight_bit(&self) -> bool {
        self.bit_depth() == BitDepth::Eight
    }
}

/// Raw wire data handed to [`Adapter::detect`]
#[derive(Debug, Clone)]
pub enum Payload<'a> {
    /// Binary buffer (`.dat` file contents, decode bridge output)
    Bytes(&'a [u8]),
    /// JSON text that must be parsed first
    Text(&'a str),
    /// Already-parsed JSON value
    Value(serde_json::Value),
}

/// One of the two supported peak-data layouts
#[derive(Debug, Clone)]
pub enum Adapter {
    Binary(BinaryAdapter),
    Object(ObjectAdapter),
}

impl Adapter {
    /// Select and build the adapter matching a payload
    pub fn detect(payload: Payload<'_>) -> PeaksResult<Self> {
        match payload {
            Payload::Bytes(bytes) => {
                log::debug!("Adapter detection: {} byte binary payload", bytes.len());
                Ok(Adapter::Binary(BinaryAdapter::from_bytes(bytes.to_vec())?))
            }
            Payload::Text(text) => {
                let value: serde_json::Value = serde_json::from_str(text)?;
                Self::detect(Payload::Value(value))
            }
            Payload::Value(value) => {
                if value.get("sample_rate").is_none() {
                    return Err(PeaksError::NoCompatibleAdapter(format!(
                        "expected a byte buffer or an object with `sample_rate`, got {}",
                        json_kind(&value)
                    )));
                }
                log::debug!("Adapter detection: object payload");
                Ok(Adapter::Object(ObjectAdapter::from_value(value)?))
            }
        }
    }

    /// Detect the layout of raw file contents
    ///
    /// Contents starting with `{` (after whitespace) are treated as JSON text,
    /// anything else as the binary layout.
    pub fn sniff_bytes(bytes: &[u8]) -> PeaksResult<Self> {
        let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
        if first == Some(&b'{') {
            let text = std::str::from_utf8(bytes).map_err(|e| {
                PeaksError::NoCompatibleAdapter(format!("JSON payload is not UTF-8: {}", e))
            })?;
            Self::detect(Payload::Text(text))
        } else {
            Self::detect(Payload::Bytes(bytes))
        }
    }

    /// Short name of the layout, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Adapter::Binary(_) => "binary",
            Adapter::Object(_) => "object",
        }
    }

    fn inner(&self) -> &dyn WaveformAdapter {
        match self {
            Adapter::Binary(adapter) => adapter,
            Adapter::Object(adapter) => adapter,
        }
    }
}

impl WaveformAdapter for Adapter {
    fn version(&self) -> u32 {
        self.inner().version()
    }

    fn bit_depth(&self) -> BitDepth {
        self.inner().bit_depth()
    }

    fn sample_rate(&self) -> u32 {
        self.inner().sample_rate()
    }

    fn scale(&self) -> u32 {
        self.inner().scale()
    }

    fn length(&self) -> usize {
        self.inner().length()
    }

    fn peaks(&self) -> &[i8] {
        self.inner().peaks()
    }
}

/// Round and clamp a numeric peak value into the 8-bit range
pub fn quantize_peak(value: f64) -> i8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(PEAK_MIN as f64, PEAK_MAX as f64) as i8
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object without `sample_rate`",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_binary() {
        let bytes = binary::encode(44100, 512, &[-3, 4, -10, 12]);
        let adapter = Adapter::detect(Payload::Bytes(&bytes)).unwrap();
        assert_eq!(adapter.kind(), "binary");
        assert_eq!(adapter.length(), 2);
        assert_eq!(adapter.at(2), -10);
    }

    #[test]
    fn test_detect_object_value() {
        let value = json!({
            "sample_rate": 48000,
            "samples_per_pixel": 256,
            "length": 1,
            "data": [-5, 7]
        });
        let adapter = Adapter::detect(Payload::Value(value)).unwrap();
        assert_eq!(adapter.kind(), "object");
        assert_eq!(adapter.sample_rate(), 48000);
        assert_eq!(adapter.scale(), 256);
        assert_eq!(adapter.at(1), 7);
    }

    #[test]
    fn test_detect_object_text() {
        let text = r#"{"version":1,"bits":8,"sample_rate":44100,"samples_per_pixel":512,"length":2,"data":[0,1,-2,3]}"#;
        let adapter = Adapter::detect(Payload::Text(text)).unwrap();
        assert_eq!(adapter.kind(), "object");
        assert_eq!(adapter.peaks(), &[0, 1, -2, 3]);
    }

    #[test]
    fn test_detect_rejects_unknown_shapes() {
        let err = Adapter::detect(Payload::Value(json!({ "rate": 44100 }))).unwrap_err();
        assert!(matches!(err, PeaksError::NoCompatibleAdapter(_)));

        let err = Adapter::detect(Payload::Value(json!(42))).unwrap_err();
        assert!(matches!(err, PeaksError::NoCompatibleAdapter(_)));

        let err = Adapter::detect(Payload::Text("[1, 2, 3]")).unwrap_err();
        assert!(matches!(err, PeaksError::NoCompatibleAdapter(_)));
    }

    #[test]
    fn test_detect_text_must_be_json() {
        let err = Adapter::detect(Payload::Text("not json")).unwrap_err();
        assert!(matches!(err, PeaksError::Json(_)));
    }

    #[test]
    fn test_sniff_bytes() {
        let text = br#"  {"sample_rate":8000,"samples_per_pixel":80,"length":1,"data":[-1,1]}"#;
        assert_eq!(Adapter::sniff_bytes(text).unwrap().kind(), "object");

        let bytes = binary::encode(8000, 80, &[-1, 1]);
        assert_eq!(Adapter::sniff_bytes(&bytes).unwrap().kind(), "binary");
    }

    #[test]
    fn test_quantize_peak() {
        assert_eq!(quantize_peak(12.4), 12);
        assert_eq!(quantize_peak(-12.5), -13);
        assert_eq!(quantize_peak(300.0), 127);
        assert_eq!(quantize_peak(-300.0), -128);
        assert_eq!(quantize_peak(f64::NAN), 0);
    }
}
