//! Filesystem error types

use flashpack_format::{EntryKind, FormatError};
use thiserror::Error;

/// Result type for filesystem operations.
pub type FsResult<T> = std::result::Result<T, FsError>;

/// Errors returned by the filesystem.
///
/// End of a directory listing and end of file are not errors; they are
/// reported as `None` and `Ok(0)` respectively.
#[derive(Debug, Error)]
pub enum FsError {
    /// Memory for a handle or buffer could not be reserved.
    #[error("allocation failed: {0}")]
    AllocationFailure(#[from] std::collections::TryReserveError),

    /// Neither a base address nor a mapping selector was configured.
    #[error("no image source: provide image bytes or an image path to map")]
    MissingImageSource,

    /// The platform mapping could not be established.
    #[error("failed to map image {path}: {source}")]
    Mapping {
        /// Mapping selector that failed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The blob does not start with the image magic.
    #[error("image magic mismatch: got {0:02X?}")]
    MagicMismatch([u8; 4]),

    /// The image major version differs from the one this crate reads.
    #[error("image version {major}.{minor} is not supported (expected major {expected})")]
    VersionMismatch {
        /// Major version in the image
        major: u8,
        /// Minor version in the image
        minor: u16,
        /// Major version this crate reads
        expected: u8,
    },

    /// No entry has the requested path.
    #[error("path not found: {0}")]
    NotFound(String),

    /// A directory was used as a file or a file as a directory.
    #[error("expected a {expected}, found a {found}")]
    WrongEntryKind {
        /// Kind the operation needs
        expected: EntryKind,
        /// Kind of the entry passed in
        found: EntryKind,
    },

    /// The entry's codec tag matches no compiled-in backend.
    #[error("unknown compression codec {0}")]
    UnknownCompression(u8),

    /// A backend refused to open the stored stream.
    #[error("{codec} backend failed to open: {reason}")]
    BackendOpen {
        /// Backend name
        codec: &'static str,
        /// Why it failed
        reason: String,
    },

    /// The backend does not provide this operation.
    #[error("{operation} is not supported by the {codec} backend")]
    Unsupported {
        /// Operation name
        operation: &'static str,
        /// Backend name
        codec: &'static str,
    },

    /// Reconstructed path would exceed the configured capacity.
    #[error("path exceeds {limit} bytes")]
    PathTooLong {
        /// Capacity in bytes
        limit: usize,
    },

    /// Seek target lies outside the file.
    #[error("seek to {target} is outside 0..={size}")]
    InvalidSeek {
        /// Requested absolute position
        target: i64,
        /// File size
        size: u64,
    },

    /// Stored stream is corrupt.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// The image is malformed.
    #[error("image format error: {0}")]
    Format(#[from] FormatError),
}

impl FsError {
    pub(crate) fn wrong_kind(expected: EntryKind, found: EntryKind) -> Self {
        Self::WrongEntryKind { expected, found }
    }
}

impl From<FsError> for std::io::Error {
    fn from(err: FsError) -> Self {
        let kind = match &err {
            FsError::NotFound(_) => std::io::ErrorKind::NotFound,
            FsError::InvalidSeek { .. } => std::io::ErrorKind::InvalidInput,
            FsError::Unsupported { .. } => std::io::ErrorKind::Unsupported,
            FsError::Decompression(_) | FsError::Format(_) => std::io::ErrorKind::InvalidData,
            _ => std::io::ErrorKind::Other,
        };
        Self::new(kind, err)
    }
}
