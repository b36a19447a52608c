//! Feed refresh error types.

use std::path::PathBuf;

use crate::error::LoadError;

/// Errors that can occur while fetching and publishing a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading an archive from disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive cache or load record could not be written
    #[error("cache error: {message}")]
    Cache { message: String },

    /// The configured override archive does not exist
    #[error("override file does not exist: {}", path.display())]
    OverrideMissing { path: PathBuf },

    /// The blocking load task panicked or was cancelled
    #[error("load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The archive did not load
    #[error("feed did not load: {0}")]
    Load(#[from] LoadError),
}
