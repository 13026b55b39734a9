//! Entry records
//!
//! Every entry starts with an 8-byte [`EntryHeader`]. The `kind` word tells
//! directories from files: values below [`FILE_KIND_BASE`] are a directory's
//! child count, values at or above it mark a file whose low byte is the codec
//! tag. The body that follows depends on the kind:
//!
//! - **Directory**: `child_count` x u32 child offsets
//! - **File**: data offset, data size
//! - **Compressed file**: data offset, stored size, real (decoded) size
//!
//! The name segment comes last and is not NUL-terminated.

use crate::compression::{CODEC_NONE, Compression};
use crate::error::{FormatError, FormatResult};
use crate::util::read_u32_le;
use binrw::{BinRead, BinWrite};
use serde::Serialize;
use std::io::Cursor;

/// `kind` values at or above this mark a file
pub const FILE_KIND_BASE: u16 = 0xFF00;
/// Largest child count a directory can encode
pub const MAX_CHILDREN: usize = FILE_KIND_BASE as usize - 1;
/// Size of the common entry header
pub const ENTRY_HEADER_SIZE: usize = 8;
/// Body size of an uncompressed file entry
pub const FILE_BODY_SIZE: usize = 8;
/// Body size of a compressed file entry
pub const COMPRESSED_FILE_BODY_SIZE: usize = 12;

/// Common 8-byte entry header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct EntryHeader {
    /// Offset of the parent directory, 0 for the root
    pub parent: u32,
    /// Child count, or `FILE_KIND_BASE | codec` for files
    pub kind: u16,
    /// Length of the trailing name segment
    pub name_len: u8,
    /// Reserved
    pub options: u8,
}

impl EntryHeader {
    /// Header for a directory with `child_count` children
    pub fn directory(parent: u32, child_count: u16, name_len: u8) -> Self {
        Self {
            parent,
            kind: child_count,
            name_len,
            options: 0,
        }
    }

    /// Header for a file stored with codec `tag`
    pub fn file(parent: u32, tag: u8, name_len: u8) -> Self {
        Self {
            parent,
            kind: FILE_KIND_BASE | u16::from(tag),
            name_len,
            options: 0,
        }
    }

    /// True for directories
    pub fn is_dir(&self) -> bool {
        self.kind < FILE_KIND_BASE
    }

    /// Codec tag of a file, 0 for directories
    pub fn codec_tag(&self) -> u8 {
        if self.is_dir() {
            CODEC_NONE
        } else {
            (self.kind & 0x00FF) as u8
        }
    }

    /// Size of the kind-specific body
    pub fn body_size(&self) -> usize {
        if self.is_dir() {
            self.kind as usize * 4
        } else if self.codec_tag() == CODEC_NONE {
            FILE_BODY_SIZE
        } else {
            COMPRESSED_FILE_BODY_SIZE
        }
    }

    /// Size of the whole record, name included, before padding
    pub fn record_size(&self) -> usize {
        ENTRY_HEADER_SIZE + self.body_size() + self.name_len as usize
    }
}

/// Entry kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Directory
    Directory,
    /// Regular file, compressed or not
    File,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory => f.write_str("directory"),
            Self::File => f.write_str("file"),
        }
    }
}

/// Entry metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stat {
    /// Entry kind
    pub kind: EntryKind,
    /// Decoded size in bytes (0 for directories)
    pub size: u32,
    /// Stored size in bytes (0 for directories)
    pub compressed_size: u32,
    /// Declared codec tag (0 for directories and uncompressed files)
    pub compression: u8,
}

impl Stat {
    /// Declared codec, if the tag is one the format knows
    pub fn codec(&self) -> Option<Compression> {
        Compression::from_tag(self.compression)
    }
}

/// Borrowed view of one entry inside an image
#[derive(Clone, Copy)]
pub struct Entry<'a> {
    image: &'a [u8],
    offset: u32,
    header: EntryHeader,
    body: &'a [u8],
    name: &'a [u8],
}

impl<'a> Entry<'a> {
    /// Parse the entry at `offset` of `image`.
    ///
    /// Only the record itself is bounds-checked; child and data offsets are
    /// checked when they are followed.
    pub fn parse(image: &'a [u8], offset: u32) -> FormatResult<Self> {
        let start = offset as usize;
        let truncated = |needed: usize| FormatError::Truncated {
            offset: start,
            needed,
            len: image.len(),
        };

        let head = image
            .get(start..)
            .filter(|rest| rest.len() >= ENTRY_HEADER_SIZE)
            .ok_or_else(|| truncated(ENTRY_HEADER_SIZE))?;
        let header = EntryHeader::read(&mut Cursor::new(&head[..ENTRY_HEADER_SIZE]))?;

        let record = head
            .get(..header.record_size())
            .ok_or_else(|| truncated(header.record_size()))?;
        let (body, name) = record[ENTRY_HEADER_SIZE..].split_at(header.body_size());

        Ok(Self {
            image,
            offset,
            header,
            body,
            name,
        })
    }

    /// Offset of this entry from the image base
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// The raw header
    pub fn header(&self) -> &EntryHeader {
        &self.header
    }

    /// Offset of the parent directory, 0 for the root
    pub fn parent_offset(&self) -> u32 {
        self.header.parent
    }

    /// True for the root directory
    pub fn is_root(&self) -> bool {
        self.header.parent == 0
    }

    /// Entry kind
    pub fn kind(&self) -> EntryKind {
        if self.header.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// True for directories
    pub fn is_dir(&self) -> bool {
        self.header.is_dir()
    }

    /// True for files
    pub fn is_file(&self) -> bool {
        !self.header.is_dir()
    }

    /// True for files carrying a non-zero codec tag
    pub fn is_compressed(&self) -> bool {
        self.codec_tag() != CODEC_NONE
    }

    /// Declared codec tag
    pub fn codec_tag(&self) -> u8 {
        self.header.codec_tag()
    }

    /// Name segment bytes; empty for the root
    pub fn name(&self) -> &'a [u8] {
        self.name
    }

    /// Name segment as text, replacing invalid UTF-8
    pub fn name_lossy(&self) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(self.name)
    }

    /// Number of children (0 for files)
    pub fn child_count(&self) -> u16 {
        if self.is_dir() { self.header.kind } else { 0 }
    }

    /// Offset of child `index`
    pub fn child_offset(&self, index: u16) -> Option<u32> {
        if !self.is_dir() {
            return None;
        }
        read_u32_le(self.body, index as usize * 4)
    }

    /// Parse child `index`
    pub fn child(&self, index: u16) -> Option<FormatResult<Entry<'a>>> {
        self.child_offset(index)
            .map(|offset| Entry::parse(self.image, offset))
    }

    /// Offset of the stored data (0 for directories)
    pub fn data_offset(&self) -> u32 {
        self.file_field(0)
    }

    /// Stored data size (0 for directories)
    pub fn data_size(&self) -> u32 {
        self.file_field(4)
    }

    /// Decoded size: the declared real size for compressed files, the
    /// stored size otherwise
    pub fn real_size(&self) -> u32 {
        if self.is_compressed() {
            self.file_field(8)
        } else {
            self.data_size()
        }
    }

    /// Stored bytes exactly as they sit in the image
    pub fn stored_data(&self) -> FormatResult<&'a [u8]> {
        if self.is_dir() {
            return Ok(&[]);
        }
        let start = self.data_offset() as usize;
        let needed = self.data_size() as usize;
        start
            .checked_add(needed)
            .and_then(|end| self.image.get(start..end))
            .ok_or(FormatError::Truncated {
                offset: start,
                needed,
                len: self.image.len(),
            })
    }

    /// Entry metadata
    pub fn stat(&self) -> Stat {
        match self.kind() {
            EntryKind::Directory => Stat {
                kind: EntryKind::Directory,
                size: 0,
                compressed_size: 0,
                compression: CODEC_NONE,
            },
            EntryKind::File => Stat {
                kind: EntryKind::File,
                size: self.real_size(),
                compressed_size: self.data_size(),
                compression: self.codec_tag(),
            },
        }
    }

    /// The image this entry belongs to
    pub fn image(&self) -> &'a [u8] {
        self.image
    }

    fn file_field(&self, at: usize) -> u32 {
        if self.is_dir() {
            return 0;
        }
        read_u32_le(self.body, at).unwrap_or(0)
    }
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && std::ptr::eq(self.image, other.image)
    }
}

impl Eq for Entry<'_> {}

impl std::fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("offset", &self.offset)
            .field("parent", &self.header.parent)
            .field("kind", &self.kind())
            .field("name", &self.name_lossy())
            .finish_non_exhaustive()
    }
}
