//! Image header structures and parsing

use crate::error::{FormatError, FormatResult};
use binrw::{BinRead, BinWrite};
use std::io::Cursor;

/// Image magic bytes
pub const IMAGE_MAGIC: [u8; 4] = *b"FPAK";
/// Major format version; images with any other major version are rejected
pub const FORMAT_VERSION_MAJOR: u8 = 1;
/// Minor format version written by the builder (informational on read)
pub const FORMAT_VERSION_MINOR: u16 = 0;
/// Size of the on-disk header
pub const HEADER_SIZE: usize = 16;

/// Image header (16 bytes, little-endian)
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct ImageHeader {
    /// Magic bytes: "FPAK"
    pub magic: [u8; 4],

    /// Header length in bytes
    pub header_size: u8,

    /// Major format version
    pub version_major: u8,

    /// Minor format version
    pub version_minor: u16,

    /// Number of hash table records (one per entry, root included)
    pub entry_count: u32,

    /// Total image size in bytes
    pub image_size: u32,
}

impl ImageHeader {
    /// Create a header for the current format version
    pub fn new(entry_count: u32, image_size: u32) -> Self {
        Self {
            magic: IMAGE_MAGIC,
            header_size: HEADER_SIZE as u8,
            version_major: FORMAT_VERSION_MAJOR,
            version_minor: FORMAT_VERSION_MINOR,
            entry_count,
            image_size,
        }
    }

    /// Read the header from the start of an image without validating it.
    pub fn parse(data: &[u8]) -> FormatResult<Self> {
        if data.len() < HEADER_SIZE {
            return Err(FormatError::Truncated {
                offset: 0,
                needed: HEADER_SIZE,
                len: data.len(),
            });
        }
        let mut cursor = Cursor::new(data);
        Ok(Self::read(&mut cursor)?)
    }

    /// Validate header values.
    ///
    /// The minor version never blocks loading.
    pub fn validate(&self) -> FormatResult<()> {
        if self.magic != IMAGE_MAGIC {
            return Err(FormatError::InvalidMagic(self.magic));
        }

        if self.version_major != FORMAT_VERSION_MAJOR {
            return Err(FormatError::UnsupportedVersion {
                major: self.version_major,
                minor: self.version_minor,
                expected: FORMAT_VERSION_MAJOR,
            });
        }

        if (self.header_size as usize) < HEADER_SIZE || self.header_size % 4 != 0 {
            return Err(FormatError::InvalidHeaderSize(self.header_size));
        }

        Ok(())
    }

    /// Byte offset of the first hash table record
    pub fn hash_table_offset(&self) -> usize {
        self.header_size as usize
    }

    /// Byte offset of the root directory entry
    pub fn root_offset(&self) -> usize {
        self.hash_table_offset() + self.entry_count as usize * crate::hash::HASH_RECORD_SIZE
    }

    /// Serialize the header
    pub fn build(&self) -> FormatResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_SIZE));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}
