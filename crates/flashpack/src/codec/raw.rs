//! Passthrough backend

use super::{Decoder, seek_target};
use crate::error::FsResult;
use std::io::SeekFrom;

/// Reads the stored bytes unchanged
#[derive(Debug)]
pub struct RawDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RawDecoder<'a> {
    /// Decoder positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }
}

impl Decoder for RawDecoder<'_> {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        let remaining = self.remaining();
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        let target = seek_target(pos, self.pos as u64, self.data.len() as u64)?;
        self.pos = target as usize;
        Ok(target)
    }

    fn tell(&self) -> FsResult<u64> {
        Ok(self.pos as u64)
    }
}
