//! Binary image format for the flashpack read-only filesystem
//!
#![allow(clippy::cast_possible_truncation)] // Offsets are 32-bit by format definition
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
//! A flashpack image is one immutable blob holding a header, a hash table
//! sorted by path hash, a tree of entry records and the file data. Every
//! reference inside the image is a byte offset from its base, so the image
//! can be used straight out of flash or a memory mapping.
//!
//! # Layout
//!
//! - **Header**: magic `FPAK`, header length, major/minor version, entry
//!   count and image size
//! - **Hash table**: `(path hash, entry offset)` pairs sorted by hash, one
//!   per entry, root included
//! - **Entries**: directory and file records, root first
//! - **Data**: stored file contents, raw or encoded
//!
//! This crate parses all of it without copying and builds images with
//! [`ImageBuilder`]. Path resolution and file access live in the
//! `flashpack` crate.

#![warn(missing_docs)]

mod builder;
mod compression;
mod entry;
mod error;
mod hash;
mod header;
mod util;

pub use builder::ImageBuilder;
pub use compression::{CODEC_DEFLATE, CODEC_LZ4, CODEC_NONE, Compression, compress};
pub use entry::{
    COMPRESSED_FILE_BODY_SIZE, ENTRY_HEADER_SIZE, Entry, EntryHeader, EntryKind, FILE_BODY_SIZE,
    FILE_KIND_BASE, MAX_CHILDREN, Stat,
};
pub use error::{FormatError, FormatResult};
pub use hash::{HASH_RECORD_SIZE, HashRecord, HashTable, normalize_path, path_hash};
pub use header::{
    FORMAT_VERSION_MAJOR, FORMAT_VERSION_MINOR, HEADER_SIZE, IMAGE_MAGIC, ImageHeader,
};
pub use util::{align4, read_u32_le};
