//! Read-only embeddable filesystem over flashpack images
//!
#![allow(clippy::cast_possible_truncation)] // Offsets are 32-bit by format definition
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
//! A flashpack image is an immutable blob, built offline, that packs a whole
//! directory tree: a hash table for path lookup, parent-linked entry records
//! and the file contents, optionally compressed. This crate mounts such a blob
//! without copying it and serves lookups, listings and reads from it.
//!
//! # Example
//!
//! ```no_run
//! use flashpack::{Filesystem, OpenFlags};
//! use std::io::Read;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fs = Filesystem::mount("www.fpak")?;
//!
//! let entry = fs.resolve("/css/style.css")?;
//! assert_eq!(fs.path_of(&entry)?, "css/style.css");
//!
//! let mut file = fs.open(&entry, OpenFlags::empty())?;
//! let mut css = String::new();
//! file.read_to_string(&mut css)?;
//!
//! for child in fs.open_dir(None)? {
//!     println!("{}", child?.name_lossy());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Backends
//!
//! Compressed entries are decoded by the backend matching their codec tag.
//! `deflate` (zlib streams) and `lz4` (LZ4 frames) are Cargo features, both
//! on by default; the raw passthrough is always available. A handle opened
//! with [`OpenFlags::RAW`] reads the stored bytes regardless of codec.
//!
//! # Concurrency
//!
//! A [`Filesystem`] is never mutated after mount and can be shared across
//! threads. File and directory handles carry their own cursors and are meant
//! for one reader at a time.

#![warn(missing_docs)]

mod codec;
mod config;
mod dir;
mod error;
mod file;
mod fs;
mod image;
mod path;
mod resolve;

pub use codec::{Backend, Decoder, RawDecoder};
pub use config::{DEFAULT_MAX_PATH_LEN, MountConfig};
pub use dir::DirHandle;
pub use error::{FsError, FsResult};
pub use file::{FileHandle, OpenFlags};
pub use fs::Filesystem;
pub use image::ImageData;

pub use flashpack_format as format;
pub use flashpack_format::{Compression, Entry, EntryKind, Stat};
