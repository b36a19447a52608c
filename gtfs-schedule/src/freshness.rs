//! Freshness gate: decides whether a refresh needs to load anything.
//!
//! The decision itself is pure. The caller gathers the inputs (clock,
//! whether a model is published, the last load record and the cached
//! archive's age) and acts on the returned [`Decision`].

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::feed::FeedError;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Default age after which a loaded model is reloaded: 10 days.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 24 * 60 * 60);

/// Default age after which the archive on disk is downloaded again: 1 day.
pub const DEFAULT_ARCHIVE_MAX_AGE: Duration = DAY;

/// When to reload, and from where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessPolicy {
    /// How long a loaded model stays fresh.
    pub max_age: Duration,
    /// How long a downloaded archive may be reused.
    pub archive_max_age: Duration,
    /// Reload and republish even when fresh or the version is unchanged.
    pub force_replace: bool,
    /// Load this archive instead of downloading.
    pub override_path: Option<PathBuf>,
}

impl FreshnessPolicy {
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_archive_max_age(mut self, archive_max_age: Duration) -> Self {
        self.archive_max_age = archive_max_age;
        self
    }

    pub fn with_force_replace(mut self, force_replace: bool) -> Self {
        self.force_replace = force_replace;
        self
    }

    pub fn with_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            archive_max_age: DEFAULT_ARCHIVE_MAX_AGE,
            force_replace: false,
            override_path: None,
        }
    }
}

/// What a refresh should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Load the configured override archive.
    LoadOverride(PathBuf),
    /// The published model is fresh; do nothing.
    KeepCurrent,
    /// Load the archive already on disk.
    LoadCachedArchive(PathBuf),
    /// Download the archive and load it.
    Download,
}

/// The archive cache file, if one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArchive {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Record of the last successful load, persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRecord {
    /// Unix timestamp when this feed version was first loaded.
    pub loaded_at_secs: u64,
    /// URL or path the archive came from.
    pub source: String,
    /// `feed_info.txt` version, if the feed had one.
    pub feed_version: Option<String>,
}

impl LoadRecord {
    /// A record stamped with `now`.
    pub fn new(now: SystemTime, source: impl Into<String>, feed_version: Option<&str>) -> Self {
        Self {
            loaded_at_secs: unix_secs(now),
            source: source.into(),
            feed_version: feed_version.map(str::to_string),
        }
    }

    /// Time since the load, zero if the clock went backwards.
    pub fn age(&self, now: SystemTime) -> Duration {
        Duration::from_secs(unix_secs(now).saturating_sub(self.loaded_at_secs))
    }
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Applies a [`FreshnessPolicy`].
#[derive(Debug, Clone, Default)]
pub struct FreshnessGate {
    policy: FreshnessPolicy,
}

impl FreshnessGate {
    pub fn new(policy: FreshnessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    /// Decide what a refresh at `now` should do.
    ///
    /// `published` says whether a model is currently being served. After a
    /// restart nothing is published, so a fresh record reloads the archive
    /// on disk whatever its age; `archive_max_age` only applies once the
    /// record itself is stale.
    pub fn decide(
        &self,
        now: SystemTime,
        published: bool,
        record: Option<&LoadRecord>,
        archive: Option<&CachedArchive>,
    ) -> Decision {
        if let Some(path) = &self.policy.override_path {
            return Decision::LoadOverride(path.clone());
        }
        if !self.policy.force_replace
            && let Some(record) = record
            && record.age(now) <= self.policy.max_age
        {
            if published {
                debug!(age_secs = record.age(now).as_secs(), "model is fresh");
                return Decision::KeepCurrent;
            }
            if let Some(archive) = archive {
                debug!(age_secs = record.age(now).as_secs(), "reloading fresh archive");
                return Decision::LoadCachedArchive(archive.path.clone());
            }
        }
        if !self.policy.force_replace
            && let Some(archive) = archive
        {
            // a timestamp in the future counts as just written
            let age = now.duration_since(archive.modified).unwrap_or_default();
            if age <= self.policy.archive_max_age {
                debug!(age_secs = age.as_secs(), "cached archive is fresh");
                return Decision::LoadCachedArchive(archive.path.clone());
            }
        }
        Decision::Download
    }

    /// Whether a newly loaded feed should replace the published one.
    ///
    /// An unchanged feed version is skipped unless forced or nothing is
    /// published yet. Feeds without a version are always replaced.
    pub fn should_replace(
        &self,
        published: bool,
        record: Option<&LoadRecord>,
        new_version: Option<&str>,
    ) -> bool {
        if self.policy.force_replace || !published {
            return true;
        }
        match (record.and_then(|r| r.feed_version.as_deref()), new_version) {
            (Some(old), Some(new)) => old != new,
            _ => true,
        }
    }
}

/// On-disk JSON store for the [`LoadRecord`].
#[derive(Debug, Clone)]
pub struct LoadRecordCache {
    path: PathBuf,
}

impl LoadRecordCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the record. Missing or corrupt counts as never loaded.
    pub fn load(&self) -> Option<LoadRecord> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Write the record, creating parent directories if needed.
    pub fn save(&self, record: &LoadRecord) -> Result<(), FeedError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| FeedError::Cache {
                message: format!("failed to create record directory: {}", e),
            })?;
        }

        let json = serde_json::to_string_pretty(record).map_err(|e| FeedError::Cache {
            message: format!("failed to serialize load record: {}", e),
        })?;

        std::fs::write(&self.path, json).map_err(|e| FeedError::Cache {
            message: format!("failed to write load record: {}", e),
        })?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
