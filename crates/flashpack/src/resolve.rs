//! Hash index resolver
//!
//! Lookups hash the normalized path, binary search the sorted table for any
//! record with that hash, rewind to the start of the collision run and then
//! compare reconstructed paths until one matches exactly. The scan covers
//! the whole run, not just the part left of the binary search bound.

use crate::error::{FsError, FsResult};
use crate::fs::Filesystem;
use flashpack_format::{Entry, HashTable, normalize_path, path_hash};
use tracing::{trace, warn};

impl Filesystem<'_> {
    /// Find the entry at `path`.
    ///
    /// Leading separators are stripped; nothing else is normalized (no `.`
    /// or `..` handling, no case folding). `""` and `"/"` name the root.
    pub fn resolve(&self, path: &str) -> FsResult<Entry<'_>> {
        let normalized = normalize_path(path);
        let hash = path_hash(normalized.as_bytes());
        trace!("resolving {normalized:?} (hash {hash:08x})");

        let table = self.hash_table()?;
        let Some(found) = find_any(&table, hash) else {
            trace!("no hash match for {normalized:?}");
            return Err(FsError::NotFound(normalized.to_string()));
        };

        let mut first = found;
        while first > 0 && table.hash_at(first - 1) == Some(hash) {
            first -= 1;
        }

        for index in first..table.len() {
            let Some(record) = table.get(index) else {
                break;
            };
            if record.hash != hash {
                break;
            }

            let candidate = self.entry_at(record.offset)?;
            // Anything longer than the query cannot match, so the query
            // length doubles as the reconstruction capacity.
            match self.path_bytes(&candidate, normalized.len()) {
                Ok(candidate_path) if candidate_path == normalized.as_bytes() => {
                    trace!("matched {normalized:?} at slot {index}");
                    return Ok(candidate);
                }
                Ok(_) | Err(FsError::PathTooLong { .. }) => {
                    trace!("collision at slot {index}");
                }
                Err(e) => return Err(e),
            }
        }

        warn!("hash {hash:08x} matched but no entry has path {normalized:?}");
        Err(FsError::NotFound(normalized.to_string()))
    }

    /// True when `path` resolves
    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }
}

/// Binary search for any slot holding `hash`.
fn find_any(table: &HashTable<'_>, hash: u32) -> Option<usize> {
    let mut low = 0;
    let mut high = table.len();
    while low < high {
        let middle = low + (high - low) / 2;
        let stored = table.hash_at(middle)?;
        match stored.cmp(&hash) {
            std::cmp::Ordering::Equal => return Some(middle),
            std::cmp::Ordering::Less => low = middle + 1,
            std::cmp::Ordering::Greater => high = middle,
        }
    }
    None
}
