//! File handles and decompression dispatch
//!
//! [`Filesystem::open`] picks one backend for the handle's whole lifetime:
//! the raw passthrough when the entry is stored uncompressed or the caller
//! asks for [`OpenFlags::RAW`], otherwise the compiled-in backend matching the
//! entry's codec tag. Reads, seeks and tells go straight to that backend.

use crate::codec::{Backend, Decoder};
use crate::error::{FsError, FsResult};
use crate::fs::Filesystem;
use bitflags::bitflags;
use flashpack_format::{Entry, EntryKind};
use std::io::{self, SeekFrom};
use tracing::debug;

bitflags! {
    /// Flags accepted by [`Filesystem::open`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct OpenFlags: u32 {
        /// Read the stored bytes as they are, skipping decompression
        const RAW = 0x01;
    }
}

/// An open file
///
/// Owns its cursor and backend state; share the [`Filesystem`], not the
/// handle. Dropping the handle closes the backend.
pub struct FileHandle<'fs> {
    entry: Entry<'fs>,
    stored: &'fs [u8],
    real_size: u64,
    flags: OpenFlags,
    backend: Backend,
    decoder: Box<dyn Decoder + 'fs>,
}

impl<'fs> FileHandle<'fs> {
    /// Read decoded bytes into `buf`; `Ok(0)` at end of file.
    pub fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        self.decoder.read(buf)
    }

    /// Move the decoded position, returning the new one.
    pub fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        self.decoder.seek(pos)
    }

    /// Current decoded position
    pub fn tell(&self) -> FsResult<u64> {
        self.decoder.tell()
    }

    /// Read from the current position to the end of the file.
    pub fn read_remaining(&mut self) -> FsResult<Vec<u8>> {
        let mut out = Vec::new();
        out.try_reserve_exact(usize::try_from(self.real_size).unwrap_or(0))?;
        let mut chunk = [0u8; 4096];
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&chunk[..n]);
        }
    }

    /// The stored bytes exactly as they sit in the image.
    ///
    /// Independent of the cursor and of the backend.
    pub fn access_raw(&self) -> &'fs [u8] {
        self.stored
    }

    /// True when the handle was opened with [`OpenFlags::RAW`]
    pub fn is_raw(&self) -> bool {
        self.flags.contains(OpenFlags::RAW)
    }

    /// Flags the handle was opened with
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    /// The file being read
    pub fn entry(&self) -> &Entry<'fs> {
        &self.entry
    }

    /// Size of what `read` yields: the decoded size, or the stored size
    /// when reading raw
    pub fn size(&self) -> u64 {
        self.real_size
    }

    /// Backend serving this handle
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Close the handle, releasing backend state
    pub fn close(self) {}
}

impl Drop for FileHandle<'_> {
    fn drop(&mut self) {
        self.decoder.close();
        debug!(
            "closed {} handle for entry at offset {}",
            self.backend.name(),
            self.entry.offset()
        );
    }
}

impl std::fmt::Debug for FileHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("offset", &self.entry.offset())
            .field("stored", &self.stored.len())
            .field("real_size", &self.real_size)
            .field("flags", &self.flags)
            .field("backend", &self.backend)
            .finish()
    }
}

impl io::Read for FileHandle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(FileHandle::read(self, buf)?)
    }
}

impl io::Seek for FileHandle<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(FileHandle::seek(self, pos)?)
    }
}

impl Filesystem<'_> {
    /// Open a file entry for reading.
    ///
    /// Nothing is left allocated when this fails.
    pub fn open<'s>(&'s self, entry: &Entry<'s>, flags: OpenFlags) -> FsResult<FileHandle<'s>> {
        if entry.is_dir() {
            return Err(FsError::wrong_kind(EntryKind::File, EntryKind::Directory));
        }

        let stored = entry.stored_data()?;
        let raw = !entry.is_compressed() || flags.contains(OpenFlags::RAW);
        let (backend, real_size) = if raw {
            (Backend::Raw, stored.len() as u64)
        } else {
            let tag = entry.codec_tag();
            let backend = Backend::for_tag(tag).ok_or(FsError::UnknownCompression(tag))?;
            (backend, u64::from(entry.real_size()))
        };

        let decoder = backend.open(stored, real_size)?;
        debug!(
            "opened entry at offset {} with {} backend ({} stored, {} readable)",
            entry.offset(),
            backend.name(),
            stored.len(),
            real_size
        );
        Ok(FileHandle {
            entry: *entry,
            stored,
            real_size,
            flags,
            backend,
            decoder,
        })
    }

    /// Resolve `path` and open it for reading
    pub fn open_path(&self, path: &str, flags: OpenFlags) -> FsResult<FileHandle<'_>> {
        let entry = self.resolve(path)?;
        self.open(&entry, flags)
    }

    /// Decoded contents of the file at `path`
    pub fn read(&self, path: &str) -> FsResult<Vec<u8>> {
        self.open_path(path, OpenFlags::empty())?.read_remaining()
    }
}
