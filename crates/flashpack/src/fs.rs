//! Image loader
//!
//! [`Filesystem`] validates a blob once and anchors every other operation:
//! the hash table and the root directory are located right after the header,
//! and all entries handed out are borrowed views into the same bytes.

use crate::config::MountConfig;
use crate::error::{FsError, FsResult};
use crate::image::{ImageData, map_image};
use flashpack_format::{Entry, FormatError, HashTable, ImageHeader};
use std::path::Path;
use tracing::{debug, error};

/// A mounted, read-only image
///
/// Nothing is mutated after mount, so a `Filesystem` can be shared between
/// threads; every handle opened from it carries its own cursor state.
#[derive(Debug)]
pub struct Filesystem<'a> {
    data: ImageData<'a>,
    header: ImageHeader,
    root_offset: u32,
    max_path_len: usize,
}

impl<'a> Filesystem<'a> {
    /// Mount an image.
    ///
    /// With `base` the caller's bytes are borrowed. Without it the file named
    /// by `config.image_path` is mapped and owned by the filesystem. Any
    /// mapping acquired here is released before an error is returned.
    pub fn init(base: Option<&'a [u8]>, config: &MountConfig) -> FsResult<Self> {
        let data = match (base, &config.image_path) {
            (Some(bytes), _) => ImageData::Borrowed(bytes),
            (None, Some(path)) => ImageData::Mapped(map_image(path)?),
            (None, None) => {
                error!("no image bytes given and no image path configured");
                return Err(FsError::MissingImageSource);
            }
        };

        let fs = Self::validate(data, config).inspect_err(|e| error!("mount failed: {e}"))?;
        debug!(
            "mounted image v{}.{} with {} entries ({} bytes, mapped: {})",
            fs.header.version_major,
            fs.header.version_minor,
            fs.header.entry_count,
            fs.data.len(),
            fs.data.is_mapped()
        );
        Ok(fs)
    }

    /// Mount caller-owned bytes with the default configuration
    pub fn from_bytes(bytes: &'a [u8]) -> FsResult<Self> {
        Self::init(Some(bytes), &MountConfig::default())
    }

    /// Map and mount the image file at `path` with default settings
    pub fn mount(path: impl AsRef<Path>) -> FsResult<Filesystem<'static>> {
        Filesystem::init(None, &MountConfig::new(path.as_ref()))
    }

    /// Release the image, unmapping it if the filesystem owns the mapping
    pub fn unmount(self) {
        debug!("unmounting image (mapped: {})", self.data.is_mapped());
        drop(self);
    }

    fn validate(data: ImageData<'a>, config: &MountConfig) -> FsResult<Self> {
        let header = ImageHeader::parse(&data)?;
        header.validate().map_err(|e| match e {
            FormatError::InvalidMagic(magic) => FsError::MagicMismatch(magic),
            FormatError::UnsupportedVersion {
                major,
                minor,
                expected,
            } => FsError::VersionMismatch {
                major,
                minor,
                expected,
            },
            other => FsError::Format(other),
        })?;

        if config.verify_image_size && header.image_size as usize > data.len() {
            return Err(FormatError::Truncated {
                offset: 0,
                needed: header.image_size as usize,
                len: data.len(),
            }
            .into());
        }

        // Table bounds are checked here so lookups only ever index inside it.
        HashTable::new(
            &data,
            header.hash_table_offset(),
            header.entry_count as usize,
        )?;

        let root_offset = u32::try_from(header.root_offset())
            .map_err(|_| FormatError::ImageTooLarge(header.root_offset()))?;
        let root = Entry::parse(&data, root_offset)?;
        if !root.is_dir() || !root.is_root() {
            return Err(FormatError::BrokenParentChain(root_offset).into());
        }

        Ok(Self {
            data,
            header,
            root_offset,
            max_path_len: config.max_path_len,
        })
    }

    /// Validated image header
    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    /// Number of indexed entries, root included
    pub fn entry_count(&self) -> usize {
        self.header.entry_count as usize
    }

    /// True when the filesystem owns a platform mapping
    pub fn is_mapped(&self) -> bool {
        self.data.is_mapped()
    }

    /// The whole image
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The root directory
    pub fn root(&self) -> FsResult<Entry<'_>> {
        self.entry_at(self.root_offset)
    }

    /// Parse the entry at `offset`
    pub fn entry_at(&self, offset: u32) -> FsResult<Entry<'_>> {
        Ok(Entry::parse(&self.data, offset)?)
    }

    /// True when `entry` is the root of this image
    pub fn is_root(&self, entry: &Entry<'_>) -> bool {
        entry.offset() == self.root_offset
    }

    pub(crate) fn root_offset(&self) -> u32 {
        self.root_offset
    }

    pub(crate) fn max_path_len(&self) -> usize {
        self.max_path_len
    }

    pub(crate) fn hash_table(&self) -> FsResult<HashTable<'_>> {
        Ok(HashTable::new(
            &self.data,
            self.header.hash_table_offset(),
            self.entry_count(),
        )?)
    }
}
