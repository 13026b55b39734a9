//! Path reconstruction
//!
//! Paths are rebuilt by walking parent offsets toward the root and writing
//! each name segment into the tail of a fixed-capacity buffer, so every step
//! is a prepend without moving what is already there.

use crate::error::{FsError, FsResult};
use crate::fs::Filesystem;
use flashpack_format::{Entry, FormatError};

impl Filesystem<'_> {
    /// Full root-relative path of `entry`, without a leading separator.
    ///
    /// The root reconstructs to the empty string. Fails with
    /// [`FsError::PathTooLong`] rather than truncating when the path does not
    /// fit in the configured capacity.
    ///
    /// Names that are not valid UTF-8 are converted lossily, so such a path
    /// may not [`resolve`](Self::resolve) back to `entry`. Use
    /// [`path_bytes_of`](Self::path_bytes_of) when an exact round trip matters.
    pub fn path_of(&self, entry: &Entry<'_>) -> FsResult<String> {
        let bytes = self.path_bytes(entry, self.max_path_len())?;
        Ok(match String::from_utf8(bytes) {
            Ok(path) => path,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Like [`path_of`](Self::path_of) but returns the raw bytes.
    pub fn path_bytes_of(&self, entry: &Entry<'_>) -> FsResult<Vec<u8>> {
        self.path_bytes(entry, self.max_path_len())
    }

    pub(crate) fn path_bytes(&self, entry: &Entry<'_>, limit: usize) -> FsResult<Vec<u8>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(limit)?;
        buf.resize(limit, 0);

        let mut start = limit;
        let mut current = *entry;
        let mut steps = 0usize;

        while !current.is_root() {
            let name = current.name();
            let parent = current.parent_offset();
            let parent_is_root = parent == self.root_offset();
            let needed = name.len() + usize::from(!parent_is_root);
            if needed > start {
                return Err(FsError::PathTooLong { limit });
            }

            start -= name.len();
            buf[start..start + name.len()].copy_from_slice(name);
            if parent_is_root {
                break;
            }
            start -= 1;
            buf[start] = b'/';

            // A well-formed tree is never deeper than it has entries.
            steps += 1;
            if steps > self.entry_count() {
                return Err(FormatError::BrokenParentChain(entry.offset()).into());
            }
            current = self.entry_at(parent)?;
        }

        buf.copy_within(start.., 0);
        buf.truncate(limit - start);
        Ok(buf)
    }
}
