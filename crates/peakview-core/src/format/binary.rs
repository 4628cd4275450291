//! Binary peak layout (version 1)
//!
//! ```text
//! offset  size        field
//!  0      4           version (int32 LE)
//!  4      4           8-bit flag (uint32 LE, nonzero = 8-bit)
//!  8      4           sample rate (int32 LE)
//! 12      4           scale, samples per block (int32 LE)
//! 16      4           length, block count (uint32 LE)
//! 20      length * 2  signed 8-bit min/max pairs
//! ```

use crate::error::{PeaksError, PeaksResult};

use super::{BitDepth, WaveformAdapter, FORMAT_VERSION};

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 20;

/// Decoded binary header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    pub version: u32,
    pub bit_depth: BitDepth,
    pub sample_rate: u32,
    pub scale: u32,
    pub length: usize,
}

impl BinaryHeader {
    /// Parse the 20-byte header at the start of `bytes`
    pub fn parse(bytes: &[u8]) -> PeaksResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(PeaksError::Truncated {
                expected: HEADER_SIZE,
                found: bytes.len(),
            });
        }

        let version = read_i32(bytes, 0);
        let flag = read_u32(bytes, 4);
        let sample_rate = read_i32(bytes, 8);
        let scale = read_i32(bytes, 12);
        let length = read_u32(bytes, 16);

        if version < 1 {
            return Err(PeaksError::InvalidHeader(format!("version {}", version)));
        }
        if sample_rate <= 0 {
            return Err(PeaksError::InvalidHeader(format!(
                "sample rate {}",
                sample_rate
            )));
        }
        if scale <= 0 {
            return Err(PeaksError::InvalidHeader(format!("scale {}", scale)));
        }

        Ok(Self {
            version: version as u32,
            bit_depth: if flag != 0 {
                BitDepth::Eight
            } else {
                BitDepth::Sixteen
            },
            sample_rate: sample_rate as u32,
            scale: scale as u32,
            length: length as usize,
        })
    }

    /// Total payload size implied by this header
    pub fn payload_size(&self) -> usize {
        HEADER_SIZE + self.length * 2
    }
}

/// Peak data backed by a binary buffer
#[derive(Debug, Clone)]
pub struct BinaryAdapter {
    header: BinaryHeader,
    bytes: Vec<u8>,
}

impl BinaryAdapter {
    /// Validate a binary buffer and take ownership of it
    ///
    /// Bytes past the declared payload are ignored.
    pub fn from_bytes(bytes: Vec<u8>) -> PeaksResult<Self> {
        let header = BinaryHeader::parse(&bytes)?;

        if header.version != FORMAT_VERSION {
            return Err(PeaksError::UnsupportedVersion(header.version));
        }
        if header.bit_depth != BitDepth::Eight {
            return Err(PeaksError::UnsupportedBitDepth(header.bit_depth.bits()));
        }
        if bytes.len() < header.payload_size() {
            return Err(PeaksError::Truncated {
                expected: header.payload_size(),
                found: bytes.len(),
            });
        }

        Ok(Self { header, bytes })
    }

    /// Parsed header
    pub fn header(&self) -> &BinaryHeader {
        &self.header
    }

    /// Underlying buffer, header included
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.header.payload_size()]
    }
}

impl WaveformAdapter for BinaryAdapter {
    fn version(&self) -> u32 {
        self.header.version
    }

    fn bit_depth(&self) -> BitDepth {
        self.header.bit_depth
    }

    fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    fn scale(&self) -> u32 {
        self.header.scale
    }

    fn length(&self) -> usize {
        self.header.length
    }

    fn peaks(&self) -> &[i8] {
        bytemuck::cast_slice(&self.bytes[HEADER_SIZE..self.header.payload_size()])
    }
}

/// Encode interleaved 8-bit peaks as a version 1 binary buffer
///
/// `peaks` must hold whole min/max pairs.
pub fn encode(sample_rate: u32, scale: u32, peaks: &[i8]) -> Vec<u8> {
    debug_assert!(peaks.len() % 2 == 0, "peaks must be min/max pairs");

    let length = (peaks.len() / 2) as u32;
    let mut bytes = Vec::with_capacity(HEADER_SIZE + peaks.len());
    bytes.extend_from_slice(&(FORMAT_VERSION as i32).to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate as i32).to_le_bytes());
    bytes.extend_from_slice(&(scale as i32).to_le_bytes());
    bytes.extend_from_slice(&length.to_le_bytes());
    bytes.extend_from_slice(bytemuck::cast_slice(peaks));
    bytes
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_le_bytes(buf)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(version: i32, flag: u32, sample_rate: i32, scale: i32, length: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes.extend_from_slice(&flag.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&scale.to_le_bytes());
        bytes.extend_from_slice(&length.to_le_bytes());
        bytes
    }

    #[test]
    fn test_header_layout() {
        let mut bytes = header_bytes(1, 1, 44100, 512, 3);
        bytes.extend_from_slice(&[0xFE, 0x05, 0x80, 0x7F, 0x00, 0x01]);

        let adapter = BinaryAdapter::from_bytes(bytes).unwrap();
        assert_eq!(adapter.version(), 1);
        assert!(adapter.is_eight_bit());
        assert_eq!(adapter.sample_rate(), 44100);
        assert_eq!(adapter.scale(), 512);
        assert_eq!(adapter.length(), 3);

        // Byte 20 + i read as signed int8
        assert_eq!(adapter.at(0), -2);
        assert_eq!(adapter.at(1), 5);
        assert_eq!(adapter.at(2), -128);
        assert_eq!(adapter.at(3), 127);
    }

    #[test]
    fn test_encode_matches_layout() {
        let bytes = encode(22050, 256, &[-1, 2, -3, 4]);
        assert_eq!(bytes.len(), HEADER_SIZE + 4);
        assert_eq!(&bytes[0..4], &1i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &22050i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &256i32.to_le_bytes());
        assert_eq!(&bytes[16..20], &2u32.to_le_bytes());
        assert_eq!(bytes[20], 0xFF);
    }

    #[test]
    fn test_truncated_header() {
        let err = BinaryAdapter::from_bytes(vec![1, 0, 0]).unwrap_err();
        assert!(matches!(err, PeaksError::Truncated { expected: 20, found: 3 }));
    }

    #[test]
    fn test_truncated_peaks() {
        let mut bytes = header_bytes(1, 1, 44100, 512, 4);
        bytes.extend_from_slice(&[0; 6]);
        let err = BinaryAdapter::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, PeaksError::Truncated { expected: 28, found: 26 }));
    }

    #[test]
    fn test_sixteen_bit_flag_recognised_but_rejected() {
        let mut bytes = header_bytes(1, 0, 44100, 512, 1);
        bytes.extend_from_slice(&[0; 4]);
        assert_eq!(BinaryHeader::parse(&bytes).unwrap().bit_depth, BitDepth::Sixteen);
        let err = BinaryAdapter::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, PeaksError::UnsupportedBitDepth(16)));
    }

    #[test]
    fn test_rejects_bad_header_fields() {
        let bytes = header_bytes(1, 1, 0, 512, 0);
        assert!(matches!(
            BinaryAdapter::from_bytes(bytes),
            Err(PeaksError::InvalidHeader(_))
        ));

        let bytes = header_bytes(1, 1, 44100, -4, 0);
        assert!(matches!(
            BinaryAdapter::from_bytes(bytes),
            Err(PeaksError::InvalidHeader(_))
        ));

        let bytes = header_bytes(2, 1, 44100, 512, 0);
        assert!(matches!(
            BinaryAdapter::from_bytes(bytes),
            Err(PeaksError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut bytes = encode(8000, 80, &[-7, 7]);
        bytes.extend_from_slice(&[9, 9, 9]);
        let adapter = BinaryAdapter::from_bytes(bytes).unwrap();
        assert_eq!(adapter.peaks(), &[-7, 7]);
        assert_eq!(adapter.as_bytes().len(), HEADER_SIZE + 2);
    }
}
