//! Shared driver for streaming decompressors

use super::{Decoder, seek_target};
use crate::error::{FsError, FsResult};
use std::io::{self, Read, SeekFrom};
use tracing::trace;

/// A codec that decodes a byte slice as a forward-only stream
pub(crate) trait StreamCodec {
    /// Backend name
    const NAME: &'static str;

    /// Decoder over the stored bytes
    type Reader<'a>: Read + Send;

    /// Reject streams the codec cannot decode, before any state is built
    fn check_header(stored: &[u8]) -> Result<(), String>;

    /// Fresh decoder positioned at the start of the stream
    fn reader(stored: &[u8]) -> Self::Reader<'_>;
}

/// Decoded-position bookkeeping around a [`StreamCodec`] reader.
///
/// Seeking forward decodes and discards; seeking backward restarts the
/// stream from the stored bytes.
pub(crate) struct StreamDecoder<'a, C: StreamCodec> {
    stored: &'a [u8],
    reader: C::Reader<'a>,
    pos: u64,
    size: u64,
}

impl<'a, C: StreamCodec> StreamDecoder<'a, C> {
    pub(crate) fn open(stored: &'a [u8], size: u64) -> FsResult<Self> {
        C::check_header(stored).map_err(|reason| FsError::BackendOpen {
            codec: C::NAME,
            reason,
        })?;
        trace!(
            "{} stream opened: {} stored bytes, {} decoded",
            C::NAME,
            stored.len(),
            size
        );
        Ok(Self {
            stored,
            reader: C::reader(stored),
            pos: 0,
            size,
        })
    }

    fn restart(&mut self) {
        self.reader = C::reader(self.stored);
        self.pos = 0;
    }

    fn skip(&mut self, count: u64) -> FsResult<()> {
        let skipped = io::copy(&mut (&mut self.reader).take(count), &mut io::sink())
            .map_err(|e| FsError::Decompression(format!("{}: {e}", C::NAME)))?;
        self.pos += skipped;
        if skipped < count {
            return Err(self.ended_early());
        }
        Ok(())
    }

    fn ended_early(&self) -> FsError {
        FsError::Decompression(format!(
            "{} stream ended at {} of {} bytes",
            C::NAME,
            self.pos,
            self.size
        ))
    }
}

impl<C: StreamCodec> Decoder for StreamDecoder<'_, C> {
    fn name(&self) -> &'static str {
        C::NAME
    }

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        let remaining = self.size.saturating_sub(self.pos);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));

        let n = self
            .reader
            .read(&mut buf[..want])
            .map_err(|e| FsError::Decompression(format!("{}: {e}", C::NAME)))?;
        if n == 0 {
            return Err(self.ended_early());
        }
        self.pos += n as u64;
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        let target = seek_target(pos, self.pos, self.size)?;
        if target < self.pos {
            self.restart();
        }
        self.skip(target - self.pos)?;
        Ok(self.pos)
    }

    fn tell(&self) -> FsResult<u64> {
        Ok(self.pos)
    }

    fn close(&mut self) {
        trace!("{} stream closed at {} of {}", C::NAME, self.pos, self.size);
    }
}
