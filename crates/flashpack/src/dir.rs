//! Directory enumerator

use crate::error::{FsError, FsResult};
use crate::fs::Filesystem;
use flashpack_format::{Entry, EntryKind};
use tracing::debug;

/// Cursor over a directory's children in build order
///
/// The cursor never wraps: once it reaches the child count every further
/// [`next_entry`](Self::next_entry) reports the end.
#[derive(Debug, Clone)]
pub struct DirHandle<'fs> {
    dir: Entry<'fs>,
    index: u16,
}

impl<'fs> DirHandle<'fs> {
    /// Next child, or `None` at the end of the listing
    pub fn next_entry(&mut self) -> FsResult<Option<Entry<'fs>>> {
        if self.index >= self.dir.child_count() {
            return Ok(None);
        }
        let index = self.index;
        // Advance first so a malformed child is skipped on the next call.
        self.index += 1;
        match self.dir.child(index) {
            Some(child) => Ok(Some(child?)),
            None => Ok(None),
        }
    }

    /// Back to the first child
    pub fn rewind(&mut self) {
        self.index = 0;
    }

    /// Rewind, then step forward until the cursor is at `position` or the
    /// listing ends.
    ///
    /// A malformed child still counts as a step, matching
    /// [`next_entry`](Self::next_entry).
    pub fn seek_to(&mut self, position: u16) {
        self.rewind();
        while self.index < position {
            match self.next_entry() {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => debug!("skipped child {} while seeking: {e}", self.index - 1),
            }
        }
    }

    /// Cursor position
    pub fn tell(&self) -> u16 {
        self.index
    }

    /// The directory being listed
    pub fn entry(&self) -> &Entry<'fs> {
        &self.dir
    }

    /// Release the handle
    pub fn close(self) {
        debug!(
            "closed directory at offset {} (cursor {}/{})",
            self.dir.offset(),
            self.index,
            self.dir.child_count()
        );
    }
}

impl<'fs> Iterator for DirHandle<'fs> {
    type Item = FsResult<Entry<'fs>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::from(self.dir.child_count().saturating_sub(self.index));
        (left, Some(left))
    }
}

impl Filesystem<'_> {
    /// Open `entry` for listing; `None` opens the root.
    pub fn open_dir<'s>(&'s self, entry: Option<&Entry<'s>>) -> FsResult<DirHandle<'s>> {
        let dir = match entry {
            Some(entry) => *entry,
            None => self.root()?,
        };
        if !dir.is_dir() {
            return Err(FsError::wrong_kind(EntryKind::Directory, dir.kind()));
        }
        debug!(
            "opened directory at offset {} ({} children)",
            dir.offset(),
            dir.child_count()
        );
        Ok(DirHandle { dir, index: 0 })
    }

    /// Resolve `path` and open it for listing
    pub fn open_dir_path(&self, path: &str) -> FsResult<DirHandle<'_>> {
        let entry = self.resolve(path)?;
        self.open_dir(Some(&entry))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use flashpack_format::ImageBuilder;
    use pretty_assertions::assert_eq;

    fn image() -> Vec<u8> {
        let mut builder = ImageBuilder::new();
        for path in ["www/zeta.txt", "www/alpha.txt", "www/mid.txt", "top.txt"] {
            builder
                .add_file(path, path.as_bytes().to_vec())
                .expect("Operation should succeed");
        }
        builder.build().expect("Operation should succeed")
    }

    fn names(handle: &mut DirHandle<'_>) -> Vec<String> {
        handle
            .map(|entry| entry.expect("Operation should succeed").name_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_insertion_order() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");
        let mut dir = fs.open_dir_path("www").expect("Operation should succeed");

        assert_eq!(dir.size_hint(), (3, Some(3)));
        assert_eq!(names(&mut dir), vec!["zeta.txt", "alpha.txt", "mid.txt"]);
        assert!(dir.next_entry().expect("Operation should succeed").is_none());
        assert!(dir.next_entry().expect("Operation should succeed").is_none());
        assert_eq!(dir.tell(), 3);
    }

    #[test]
    fn test_root_listing() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");
        let mut root = fs.open_dir(None).expect("Operation should succeed");
        assert!(fs.is_root(root.entry()));
        assert_eq!(names(&mut root), vec!["www", "top.txt"]);
    }

    #[test]
    fn test_rewind_and_seek() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");
        let mut dir = fs.open_dir_path("/www").expect("Operation should succeed");

        let first = names(&mut dir);
        dir.rewind();
        assert_eq!(dir.tell(), 0);
        assert_eq!(names(&mut dir), first);

        dir.seek_to(1);
        assert_eq!(dir.tell(), 1);
        let next = dir
            .next_entry()
            .expect("Operation should succeed")
            .expect("entry");
        assert_eq!(next.name(), b"alpha.txt");

        dir.seek_to(10);
        assert_eq!(dir.tell(), 3);
        dir.close();
    }

    #[test]
    fn test_seek_steps_over_malformed_child() {
        let mut image = image();
        let root_offset = flashpack_format::ImageHeader::parse(&image)
            .expect("Operation should succeed")
            .root_offset();
        let slot = root_offset + flashpack_format::ENTRY_HEADER_SIZE;
        image[slot..slot + 4].copy_from_slice(&u32::MAX.to_le_bytes());

        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");
        let mut root = fs.open_dir(None).expect("Operation should succeed");

        root.seek_to(2);
        assert_eq!(root.tell(), 2);
        assert!(root.next_entry().expect("Operation should succeed").is_none());

        root.seek_to(1);
        assert_eq!(root.tell(), 1);
        let top = root
            .next_entry()
            .expect("Operation should succeed")
            .expect("entry");
        assert_eq!(top.name(), b"top.txt");

        root.rewind();
        assert!(root.next_entry().is_err());
        assert_eq!(root.tell(), 1);
    }

    #[test]
    fn test_debug_omits_image_bytes() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");
        let dir = fs.open_dir_path("www").expect("Operation should succeed");

        let text = format!("{dir:?}");
        assert!(text.contains("\"www\""), "{text}");
        assert!(text.len() < 200, "{text}");
        assert!(format!("{fs:?}").len() < 300);
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let image = image();
        let fs = Filesystem::from_bytes(&image).expect("Operation should succeed");
        let file = fs.resolve("top.txt").expect("Operation should succeed");
        assert!(matches!(
            fs.open_dir(Some(&file)),
            Err(FsError::WrongEntryKind {
                expected: EntryKind::Directory,
                found: EntryKind::File,
            })
        ));
    }
}
