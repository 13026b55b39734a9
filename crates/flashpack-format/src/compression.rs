//! Codec tags and builder-side compression

use crate::error::{FormatError, FormatResult};
use flate2::Compression as ZlibLevel;
use flate2::read::ZlibEncoder;
use serde::Serialize;
use std::io::{Read, Write};

/// Codec tag for uncompressed files
pub const CODEC_NONE: u8 = 0;
/// Codec tag for zlib-wrapped deflate streams
pub const CODEC_DEFLATE: u8 = 1;
/// Codec tag for LZ4 frame streams
pub const CODEC_LZ4: u8 = 2;

/// Codecs known to the format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Compression {
    /// Stored as-is
    None = CODEC_NONE,
    /// zlib stream (deflate)
    Deflate = CODEC_DEFLATE,
    /// LZ4 frame
    Lz4 = CODEC_LZ4,
}

impl Compression {
    /// Parse a codec tag
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            CODEC_NONE => Some(Self::None),
            CODEC_DEFLATE => Some(Self::Deflate),
            CODEC_LZ4 => Some(Self::Lz4),
            _ => None,
        }
    }

    /// Get the tag byte
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Lowercase codec name
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Deflate => "deflate",
            Self::Lz4 => "lz4",
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Encode `data` with `mode`.
pub fn compress(data: &[u8], mode: Compression) -> FormatResult<Vec<u8>> {
    match mode {
        Compression::None => Ok(data.to_vec()),
        Compression::Deflate => {
            let mut encoder = ZlibEncoder::new(data, ZlibLevel::best());
            let mut compressed = Vec::new();
            encoder.read_to_end(&mut compressed).map_err(|e| {
                FormatError::Compression(format!("deflate compression failed: {e}"))
            })?;
            Ok(compressed)
        }
        Compression::Lz4 => {
            let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
            encoder
                .write_all(data)
                .map_err(|e| FormatError::Compression(format!("LZ4 compression failed: {e}")))?;
            encoder
                .finish()
                .map_err(|e| FormatError::Compression(format!("LZ4 compression failed: {e}")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(Compression::from_tag(0), Some(Compression::None));
        assert_eq!(Compression::from_tag(1), Some(Compression::Deflate));
        assert_eq!(Compression::from_tag(2), Some(Compression::Lz4));
        assert_eq!(Compression::from_tag(99), None);
        assert_eq!(Compression::Lz4.tag(), CODEC_LZ4);
    }

    #[test]
    fn test_compress_none() {
        let data = b"plain bytes";
        assert_eq!(
            compress(data, Compression::None).expect("Test operation should succeed"),
            data
        );
    }

    #[test]
    fn test_deflate_output_is_zlib() {
        let data = b"<html><body>hello hello hello hello</body></html>";
        let out = compress(data, Compression::Deflate).expect("Test operation should succeed");
        // CMF says deflate, and CMF/FLG form a multiple of 31.
        assert_eq!(out[0] & 0x0F, 8);
        assert_eq!((u16::from(out[0]) << 8 | u16::from(out[1])) % 31, 0);

        let mut decoder = flate2::read::ZlibDecoder::new(out.as_slice());
        let mut back = Vec::new();
        decoder.read_to_end(&mut back).expect("Test operation should succeed");
        assert_eq!(back, data);
    }

    #[test]
    fn test_lz4_output_is_frame() {
        let data = vec![b'x'; 4096];
        let out = compress(&data, Compression::Lz4).expect("Test operation should succeed");
        assert_eq!(&out[0..4], &0x184D_2204u32.to_le_bytes());
        assert!(out.len() < data.len());

        let mut decoder = lz4_flex::frame::FrameDecoder::new(out.as_slice());
        let mut back = Vec::new();
        decoder.read_to_end(&mut back).expect("Test operation should succeed");
        assert_eq!(back, data);
    }
}
