//! Image format error types

use thiserror::Error;

/// Format-level error type
#[derive(Debug, Error)]
pub enum FormatError {
    /// Invalid image magic bytes
    #[error("invalid image magic: expected 'FPAK', got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// Major version does not match the one this crate understands
    #[error("unsupported image version {major}.{minor}, expected major version {expected}")]
    UnsupportedVersion {
        /// Major version found in the image
        major: u8,
        /// Minor version found in the image
        minor: u16,
        /// Major version this crate reads
        expected: u8,
    },

    /// Invalid header size
    #[error("invalid header size: {0}")]
    InvalidHeaderSize(u8),

    /// A structure does not fit inside the image
    #[error("structure at offset {offset} needs {needed} bytes but the image is {len} bytes")]
    Truncated {
        /// Offset of the structure
        offset: usize,
        /// Bytes needed from that offset
        needed: usize,
        /// Image length
        len: usize,
    },

    /// Parent chain does not terminate at the root
    #[error("parent chain starting at offset {0} does not reach the root")]
    BrokenParentChain(u32),

    /// Path rejected by the builder
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// Name segment longer than 255 bytes
    #[error("name segment too long ({len} bytes): {name}")]
    NameTooLong {
        /// The offending segment
        name: String,
        /// Its length in bytes
        len: usize,
    },

    /// Path already exists with a different kind
    #[error("path conflict: {0}")]
    PathConflict(String),

    /// Directory has more children than the format can encode
    #[error("directory {path:?} has {count} children, the limit is {max}")]
    TooManyChildren {
        /// Directory path
        path: String,
        /// Child count
        count: usize,
        /// Maximum encodable child count
        max: usize,
    },

    /// Built image would not be addressable with 32-bit offsets
    #[error("image too large: {0} bytes")]
    ImageTooLarge(usize),

    /// Compression failure while building
    #[error("compression error: {0}")]
    Compression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for format operations
pub type FormatResult<T> = Result<T, FormatError>;
