//! Fetching the feed and keeping the published schedule current.
//!
//! The archive is downloaded over HTTP (or read from an override path),
//! cached on disk, loaded, and published through a
//! [`ScheduleProvider`](crate::provider::ScheduleProvider) when its version
//! is new.

mod archive;
mod client;
mod error;
mod refresh;

pub use archive::{ArchiveCache, cache_file_name};
pub use client::{DEFAULT_FEED_URL, FeedClient, FeedClientConfig};
pub use error::FeedError;
pub use refresh::{FeedRefresher, LOAD_RECORD_FILE, RefreshOutcome};
