//! Image builder
//!
//! Collects directories and files into an in-memory tree, then lays the image
//! out as header, sorted hash table, entry records (root first) and finally
//! the file data blocks, each record and block 4-byte aligned.

use crate::compression::{CODEC_NONE, Compression, compress};
use crate::entry::{EntryHeader, MAX_CHILDREN};
use crate::error::{FormatError, FormatResult};
use crate::hash::{HASH_RECORD_SIZE, normalize_path, path_hash};
use crate::header::{HEADER_SIZE, ImageHeader};
use crate::util::align4;
use binrw::BinWrite;
use std::io::{Cursor, Write};

const ROOT: usize = 0;

#[derive(Debug, Clone)]
enum NodeKind {
    Directory {
        children: Vec<usize>,
    },
    File {
        tag: u8,
        stored: Vec<u8>,
        real_size: u32,
    },
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: usize,
    kind: NodeKind,
}

/// Builder for flashpack images
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    nodes: Vec<Node>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    /// Create a builder holding only the root directory
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                parent: ROOT,
                kind: NodeKind::Directory {
                    children: Vec::new(),
                },
            }],
        }
    }

    /// Number of entries, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Add a directory, creating missing parents. Adding an existing
    /// directory again is a no-op.
    pub fn add_dir(&mut self, path: &str) -> FormatResult<()> {
        let segments = split_path(path)?;
        self.ensure_dir(path, &segments)?;
        Ok(())
    }

    /// Add an uncompressed file
    pub fn add_file(&mut self, path: &str, data: impl Into<Vec<u8>>) -> FormatResult<()> {
        let data = data.into();
        let real_size = size_u32(data.len())?;
        self.insert_file(path, CODEC_NONE, data, real_size)
    }

    /// Add a file encoded with `mode`. The encoded form is stored even when
    /// it is larger than `data`.
    pub fn add_compressed_file(
        &mut self,
        path: &str,
        data: &[u8],
        mode: Compression,
    ) -> FormatResult<()> {
        let real_size = size_u32(data.len())?;
        let stored = compress(data, mode)?;
        self.insert_file(path, mode.tag(), stored, real_size)
    }

    /// Add a file whose bytes are already encoded with codec `tag`.
    ///
    /// The tag is written as-is, so this also produces entries for codecs
    /// a reader may not support.
    pub fn add_stored_file(
        &mut self,
        path: &str,
        tag: u8,
        stored: Vec<u8>,
        real_size: u32,
    ) -> FormatResult<()> {
        self.insert_file(path, tag, stored, real_size)
    }

    /// Lay out and serialize the image
    pub fn build(&self) -> FormatResult<Vec<u8>> {
        for (index, node) in self.nodes.iter().enumerate() {
            if let NodeKind::Directory { children } = &node.kind
                && children.len() > MAX_CHILDREN
            {
                return Err(FormatError::TooManyChildren {
                    path: self.full_path(index),
                    count: children.len(),
                    max: MAX_CHILDREN,
                });
            }
        }

        let entry_count = self.nodes.len();
        let root_offset = HEADER_SIZE + entry_count * HASH_RECORD_SIZE;

        // Record offsets depend only on sizes, so compute them before
        // filling in parent and child references.
        let headers: Vec<EntryHeader> = self
            .nodes
            .iter()
            .map(|node| match &node.kind {
                NodeKind::Directory { children } => {
                    EntryHeader::directory(0, children.len() as u16, node.name.len() as u8)
                }
                NodeKind::File { tag, .. } => {
                    EntryHeader::file(0, *tag, node.name.len() as u8)
                }
            })
            .collect();

        let mut entry_offsets = Vec::with_capacity(entry_count);
        let mut cursor_pos = root_offset;
        for header in &headers {
            entry_offsets.push(cursor_pos);
            cursor_pos += align4(header.record_size());
        }

        let mut data_offsets = vec![0usize; entry_count];
        for (index, node) in self.nodes.iter().enumerate() {
            if let NodeKind::File { stored, .. } = &node.kind {
                data_offsets[index] = cursor_pos;
                cursor_pos += align4(stored.len());
            }
        }

        let image_size = cursor_pos;
        let image_size_u32 =
            u32::try_from(image_size).map_err(|_| FormatError::ImageTooLarge(image_size))?;

        let mut records: Vec<(u32, u32)> = (0..entry_count)
            .map(|index| {
                (
                    path_hash(self.full_path(index).as_bytes()),
                    entry_offsets[index] as u32,
                )
            })
            .collect();
        // Stable, so colliding paths keep build order.
        records.sort_by_key(|&(hash, _)| hash);

        let mut out = Cursor::new(Vec::with_capacity(image_size));
        ImageHeader::new(entry_count as u32, image_size_u32).write(&mut out)?;
        for (hash, offset) in records {
            out.write_all(&hash.to_le_bytes())?;
            out.write_all(&offset.to_le_bytes())?;
        }

        for (index, node) in self.nodes.iter().enumerate() {
            debug_assert_eq!(out.position() as usize, entry_offsets[index]);
            let mut header = headers[index];
            if index != ROOT {
                header.parent = entry_offsets[node.parent] as u32;
            }
            header.write(&mut out)?;

            match &node.kind {
                NodeKind::Directory { children } => {
                    for &child in children {
                        out.write_all(&(entry_offsets[child] as u32).to_le_bytes())?;
                    }
                }
                NodeKind::File {
                    tag,
                    stored,
                    real_size,
                } => {
                    out.write_all(&(data_offsets[index] as u32).to_le_bytes())?;
                    out.write_all(&(stored.len() as u32).to_le_bytes())?;
                    if *tag != CODEC_NONE {
                        out.write_all(&real_size.to_le_bytes())?;
                    }
                }
            }
            out.write_all(node.name.as_bytes())?;
            pad(&mut out)?;
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let NodeKind::File { stored, .. } = &node.kind {
                debug_assert_eq!(out.position() as usize, data_offsets[index]);
                out.write_all(stored)?;
                pad(&mut out)?;
            }
        }

        Ok(out.into_inner())
    }

    fn insert_file(
        &mut self,
        path: &str,
        tag: u8,
        stored: Vec<u8>,
        real_size: u32,
    ) -> FormatResult<()> {
        let segments = split_path(path)?;
        let Some((name, dirs)) = segments.split_last() else {
            return Err(FormatError::InvalidPath(path.to_string()));
        };
        size_u32(stored.len())?;

        let parent = self.ensure_dir(path, dirs)?;
        if self.find_child(parent, name).is_some() {
            return Err(FormatError::PathConflict(path.to_string()));
        }
        self.push_child(
            parent,
            name,
            NodeKind::File {
                tag,
                stored,
                real_size,
            },
        );
        Ok(())
    }

    fn ensure_dir(&mut self, path: &str, segments: &[&str]) -> FormatResult<usize> {
        let mut current = ROOT;
        for segment in segments {
            current = match self.find_child(current, segment) {
                Some(child) => match self.nodes[child].kind {
                    NodeKind::Directory { .. } => child,
                    NodeKind::File { .. } => {
                        return Err(FormatError::PathConflict(path.to_string()));
                    }
                },
                None => self.push_child(
                    current,
                    segment,
                    NodeKind::Directory {
                        children: Vec::new(),
                    },
                ),
            };
        }
        Ok(current)
    }

    fn find_child(&self, dir: usize, name: &str) -> Option<usize> {
        match &self.nodes[dir].kind {
            NodeKind::Directory { children } => children
                .iter()
                .copied()
                .find(|&child| self.nodes[child].name == name),
            NodeKind::File { .. } => None,
        }
    }

    fn push_child(&mut self, parent: usize, name: &str, kind: NodeKind) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            name: name.to_string(),
            parent,
            kind,
        });
        if let NodeKind::Directory { children } = &mut self.nodes[parent].kind {
            children.push(index);
        }
        index
    }

    fn full_path(&self, mut index: usize) -> String {
        let mut segments = Vec::new();
        while index != ROOT {
            segments.push(self.nodes[index].name.as_str());
            index = self.nodes[index].parent;
        }
        segments.reverse();
        segments.join("/")
    }
}

fn split_path(path: &str) -> FormatResult<Vec<&str>> {
    let normalized = normalize_path(path);
    if normalized.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<&str> = normalized.split('/').collect();
    for segment in &segments {
        if segment.is_empty() {
            return Err(FormatError::InvalidPath(path.to_string()));
        }
        if segment.len() > u8::MAX as usize {
            return Err(FormatError::NameTooLong {
                name: (*segment).to_string(),
                len: segment.len(),
            });
        }
    }
    Ok(segments)
}

fn size_u32(len: usize) -> FormatResult<u32> {
    u32::try_from(len).map_err(|_| FormatError::ImageTooLarge(len))
}

fn pad(out: &mut Cursor<Vec<u8>>) -> FormatResult<()> {
    let pos = out.position() as usize;
    out.write_all(&[0u8; 3][..align4(pos) - pos])?;
    Ok(())
}
