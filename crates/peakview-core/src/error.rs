//! Error types for the peak-data engine
//!
//! Every failure is local and synchronous (apart from the host decoder, whose
//! failure is delivered through the build callback). A failed operation never
//! leaves partial state behind: the previous waveform, window and markers stay
//! exactly as they were.

use thiserror::Error;

/// Errors that can occur while decoding, windowing or resampling peak data
#[derive(Debug, Error)]
pub enum PeaksError {
    /// Window bounds rejected by `set_offset`
    #[error("Invalid offset [{start}, {end}) for waveform of {length} blocks")]
    InvalidOffset {
        start: usize,
        end: usize,
        length: usize,
    },

    /// Payload matches neither the binary nor the object layout
    #[error("No compatible adapter: {0}")]
    NoCompatibleAdapter(String),

    /// Binary payload shorter than its header claims
    #[error("Truncated peak data: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    /// Header field out of range (zero sample rate, zero scale, ...)
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Wire format version we cannot read
    #[error("Unsupported waveform data version: {0}")]
    UnsupportedVersion(u32),

    /// Only 8-bit peaks are supported
    #[error("Unsupported peak bit depth: {0}")]
    UnsupportedBitDepth(u8),

    /// Object payload whose `data` does not hold `length * 2` values
    #[error("Peak data length mismatch: expected {expected} values, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// Target scale finer than the source resolution
    #[error("Zoom level {requested} too low, minimum: {minimum}")]
    ZoomLevelTooLow { requested: u32, minimum: u32 },

    /// Malformed resample request
    #[error("Invalid resample request: {0}")]
    InvalidResample(String),

    /// Segment bounds rejected by `set_segment`
    #[error("Invalid segment [{start}, {end})")]
    InvalidSegment { start: usize, end: usize },

    /// Point rejected by `set_point`
    #[error("Invalid point: {0}")]
    InvalidPoint(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Host audio decoder failure
    #[error("Audio decode failed: {0}")]
    Decode(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while reading peak files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for peak-data operations
pub type PeaksResult<T> = Result<T, PeaksError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PeaksError::InvalidOffset {
            start: 40,
            end: 20,
            length: 150,
        };
        assert!(err.to_string().contains("[40, 20)"));
        assert!(err.to_string().contains("150"));

        let err = PeaksError::ZoomLevelTooLow {
            requested: 256,
            minimum: 512,
        };
        assert_eq!(err.to_string(), "Zoom level 256 too low, minimum: 512");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: PeaksError = parse_err.into();
        assert!(matches!(err, PeaksError::Json(_)));
    }
}
