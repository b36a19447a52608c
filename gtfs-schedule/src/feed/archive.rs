//! Disk cache for downloaded feed archives.

use std::path::{Path, PathBuf};

use crate::freshness::CachedArchive;

use super::error::FeedError;

/// Cache file name for a feed URL.
///
/// `https://host/path/feed.zip` becomes `https__host_path_feed.zip`.
pub fn cache_file_name(url: &str) -> String {
    url.replace("://", "__").replace('/', "_")
}

/// Keeps the most recent archive for one URL in a data directory.
#[derive(Debug, Clone)]
pub struct ArchiveCache {
    path: PathBuf,
}

impl ArchiveCache {
    pub fn new(dir: impl AsRef<Path>, url: &str) -> Self {
        Self {
            path: dir.as_ref().join(cache_file_name(url)),
        }
    }

    /// The cached archive and its modification time, if present.
    pub fn cached(&self) -> Option<CachedArchive> {
        let modified = std::fs::metadata(&self.path).ok()?.modified().ok()?;
        Some(CachedArchive {
            path: self.path.clone(),
            modified,
        })
    }

    /// Replace the cached archive.
    ///
    /// Creates the data directory if it doesn't exist.
    pub fn store(&self, bytes: &[u8]) -> Result<(), FeedError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| FeedError::Cache {
                message: format!("failed to create data directory: {}", e),
            })?;
        }

        std::fs::write(&self.path, bytes).map_err(|e| FeedError::Cache {
            message: format!("failed to write archive cache: {}", e),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
