//! Decompression backends
//!
//! A file handle reads through one [`Decoder`], chosen once at open time by
//! [`Backend::for_tag`]. Only `read` is mandatory; backends that cannot seek
//! or report a position fall back to the trait's
//! [`FsError::Unsupported`] defaults.
//!
//! | Backend | Tag | Feature | Seek |
//! |---------|-----|---------|------|
//! | Raw | 0 | always | O(1) |
//! | Deflate | 1 | `deflate` | forward by decoding, backward by restarting |
//! | LZ4 | 2 | `lz4` | forward by decoding, backward by restarting |

#[cfg(feature = "deflate")]
mod deflate;
#[cfg(feature = "lz4")]
mod lz4;
mod raw;
#[cfg(any(feature = "deflate", feature = "lz4"))]
mod stream;

use crate::error::{FsError, FsResult};
use flashpack_format::Compression;
use std::io::SeekFrom;

pub use raw::RawDecoder;

/// Capability interface of a decompression backend
///
/// Opening is the backend's constructor. `close` runs once when the owning
/// handle is closed or dropped; backend buffers are freed with the decoder.
pub trait Decoder: Send {
    /// Backend name used in errors and logs
    fn name(&self) -> &'static str;

    /// Read decoded bytes into `buf`, returning 0 at end of file.
    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize>;

    /// Move the decoded position.
    fn seek(&mut self, _pos: SeekFrom) -> FsResult<u64> {
        Err(FsError::Unsupported {
            operation: "seek",
            codec: self.name(),
        })
    }

    /// Current decoded position.
    fn tell(&self) -> FsResult<u64> {
        Err(FsError::Unsupported {
            operation: "tell",
            codec: self.name(),
        })
    }

    /// Release backend state ahead of drop.
    fn close(&mut self) {}
}

/// Backends compiled into this build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Passthrough of the stored bytes
    Raw,
    /// zlib/deflate streams
    #[cfg(feature = "deflate")]
    Deflate,
    /// LZ4 frames
    #[cfg(feature = "lz4")]
    Lz4,
}

impl Backend {
    /// Backend for a codec tag, or `None` when no compiled-in backend
    /// handles it
    pub fn for_tag(tag: u8) -> Option<Self> {
        match Compression::from_tag(tag)? {
            Compression::None => Some(Self::Raw),
            #[cfg(feature = "deflate")]
            Compression::Deflate => Some(Self::Deflate),
            #[cfg(feature = "lz4")]
            Compression::Lz4 => Some(Self::Lz4),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// All backends in this build
    pub fn compiled() -> &'static [Self] {
        &[
            Self::Raw,
            #[cfg(feature = "deflate")]
            Self::Deflate,
            #[cfg(feature = "lz4")]
            Self::Lz4,
        ]
    }

    /// Backend name
    pub fn name(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            #[cfg(feature = "deflate")]
            Self::Deflate => "deflate",
            #[cfg(feature = "lz4")]
            Self::Lz4 => "lz4",
        }
    }

    /// Open a decoder over `stored`, which decodes to `real_size` bytes.
    #[cfg_attr(
        not(any(feature = "deflate", feature = "lz4")),
        allow(unused_variables)
    )]
    pub fn open<'a>(self, stored: &'a [u8], real_size: u64) -> FsResult<Box<dyn Decoder + 'a>> {
        Ok(match self {
            Self::Raw => Box::new(RawDecoder::new(stored)),
            #[cfg(feature = "deflate")]
            Self::Deflate => Box::new(stream::StreamDecoder::<deflate::Deflate>::open(
                stored, real_size,
            )?),
            #[cfg(feature = "lz4")]
            Self::Lz4 => Box::new(stream::StreamDecoder::<lz4::Lz4>::open(
                stored, real_size,
            )?),
        })
    }
}

/// Absolute target of `pos`, checked against `0..=size`.
pub(crate) fn seek_target(pos: SeekFrom, current: u64, size: u64) -> FsResult<u64> {
    let (base, delta) = match pos {
        SeekFrom::Start(offset) => (0i128, i128::from(offset)),
        SeekFrom::Current(delta) => (i128::from(current), i128::from(delta)),
        SeekFrom::End(delta) => (i128::from(size), i128::from(delta)),
    };
    let target = base + delta;
    if target < 0 || target > i128::from(size) {
        return Err(FsError::InvalidSeek {
            target: i64::try_from(target).unwrap_or(i64::MAX),
            size,
        });
    }
    Ok(target as u64)
}
