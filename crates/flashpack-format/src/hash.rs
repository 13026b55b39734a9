//! Path hashing and the sorted hash table

use crate::error::{FormatError, FormatResult};
use crate::util::read_u32_le;

/// Size of one hash table record
pub const HASH_RECORD_SIZE: usize = 8;

const PATH_HASH_SEED: u32 = 5381;

/// Hash a root-relative path.
///
/// djb2 in its xor form: `hash = hash * 33 ^ byte`, seeded with 5381. All
/// arithmetic wraps at 32 bits so the result matches images built on hosts
/// with wider registers.
pub fn path_hash(path: &[u8]) -> u32 {
    path.iter().fold(PATH_HASH_SEED, |hash, &b| {
        hash.wrapping_mul(33) ^ u32::from(b)
    })
}

/// Strip every leading `/`. No other normalization is applied.
pub fn normalize_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// One record of the hash table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashRecord {
    /// Hash of the entry's full path
    pub hash: u32,
    /// Byte offset of the entry from the image base
    pub offset: u32,
}

/// Zero-copy view of the hash table
#[derive(Debug, Clone, Copy)]
pub struct HashTable<'a> {
    data: &'a [u8],
}

impl<'a> HashTable<'a> {
    /// Borrow `count` records starting at `offset` of `image`.
    pub fn new(image: &'a [u8], offset: usize, count: usize) -> FormatResult<Self> {
        let needed = count
            .checked_mul(HASH_RECORD_SIZE)
            .ok_or(FormatError::ImageTooLarge(usize::MAX))?;
        let data = offset
            .checked_add(needed)
            .and_then(|end| image.get(offset..end))
            .ok_or(FormatError::Truncated {
                offset,
                needed,
                len: image.len(),
            })?;
        Ok(Self { data })
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.data.len() / HASH_RECORD_SIZE
    }

    /// True when the table has no records
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Stored hash at `index`
    pub fn hash_at(&self, index: usize) -> Option<u32> {
        read_u32_le(self.data, index.checked_mul(HASH_RECORD_SIZE)?)
    }

    /// Record at `index`
    pub fn get(&self, index: usize) -> Option<HashRecord> {
        let at = index.checked_mul(HASH_RECORD_SIZE)?;
        Some(HashRecord {
            hash: read_u32_le(self.data, at)?,
            offset: read_u32_le(self.data, at + 4)?,
        })
    }

    /// Iterate over all records in table order
    pub fn iter(&self) -> impl Iterator<Item = HashRecord> + 'a {
        self.data.chunks_exact(HASH_RECORD_SIZE).map(|chunk| HashRecord {
            hash: u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
            offset: u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
        })
    }
}
