//! Mount configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default capacity for reconstructed paths, in bytes
pub const DEFAULT_MAX_PATH_LEN: usize = 4096;

/// Options consumed by [`Filesystem::init`](crate::Filesystem::init)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// Image to memory-map when no base bytes are supplied
    pub image_path: Option<PathBuf>,

    /// Capacity of reconstructed paths
    pub max_path_len: usize,

    /// Reject images whose header claims more bytes than the blob holds
    pub verify_image_size: bool,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            image_path: None,
            max_path_len: DEFAULT_MAX_PATH_LEN,
            verify_image_size: true,
        }
    }
}

impl MountConfig {
    /// Configuration that maps the image at `image_path`
    pub fn new<P: AsRef<Path>>(image_path: P) -> Self {
        Self {
            image_path: Some(image_path.as_ref().to_path_buf()),
            ..Default::default()
        }
    }

    /// Set the image to map
    #[must_use]
    pub fn with_image_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.image_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the path reconstruction capacity
    #[must_use]
    pub const fn with_max_path_len(mut self, len: usize) -> Self {
        self.max_path_len = len;
        self
    }

    /// Enable or disable the image size check
    #[must_use]
    pub const fn with_verify_image_size(mut self, verify: bool) -> Self {
        self.verify_image_size = verify;
        self
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MountConfig::default();
        assert_eq!(config.image_path, None);
        assert_eq!(config.max_path_len, DEFAULT_MAX_PATH_LEN);
        assert!(config.verify_image_size);
    }

    #[test]
    fn test_partial_json() {
        let config: MountConfig =
            serde_json::from_str(r#"{"image_path": "/tmp/www.fpak", "max_path_len": 256}"#)
                .expect("Operation should succeed");
        assert_eq!(config.image_path, Some(PathBuf::from("/tmp/www.fpak")));
        assert_eq!(config.max_path_len, 256);
        assert!(config.verify_image_size);
    }
}
