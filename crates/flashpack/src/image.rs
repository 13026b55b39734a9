//! Image storage: borrowed bytes or a platform mapping owned by the filesystem

use crate::error::{FsError, FsResult};
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::ops::Deref;
use std::path::Path;
use tracing::debug;

/// Backing bytes of a mounted image
pub enum ImageData<'a> {
    /// Caller-owned bytes
    Borrowed(&'a [u8]),
    /// Read-only mapping acquired at mount time, released on drop
    Mapped(Mmap),
}

impl ImageData<'_> {
    /// True when the filesystem owns a mapping
    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped(_))
    }
}

impl std::fmt::Debug for ImageData<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_mapped() { "Mapped" } else { "Borrowed" };
        f.debug_struct(kind).field("len", &self.len()).finish()
    }
}

impl Deref for ImageData<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Borrowed(bytes) => bytes,
            Self::Mapped(mmap) => mmap,
        }
    }
}

/// Map the image file at `path` read-only.
pub(crate) fn map_image(path: &Path) -> FsResult<Mmap> {
    let mapping_error = |source| FsError::Mapping {
        path: path.display().to_string(),
        source,
    };

    let file = File::open(path).map_err(mapping_error)?;

    // The image is treated as immutable; it must not be modified while mapped.
    #[allow(unsafe_code)]
    let mmap = unsafe { MmapOptions::new().map(&file).map_err(mapping_error)? };

    debug!("mapped {} ({} bytes)", path.display(), mmap.len());
    Ok(mmap)
}
