//! One refresh pass: gate, fetch, load, publish.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{info, warn};

use crate::freshness::{Decision, FreshnessGate, FreshnessPolicy, LoadRecord, LoadRecordCache};
use crate::load::{FeedArchive, LoadOptions, load_feed};
use crate::provider::ScheduleProvider;
use crate::schedule::GtfsData;

use super::archive::ArchiveCache;
use super::client::FeedClient;
use super::error::FeedError;

/// File name of the load record inside the data directory.
pub const LOAD_RECORD_FILE: &str = "load_record.json";

/// What a refresh did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The published model was fresh; nothing was loaded.
    Fresh,
    /// A feed was loaded but had the published version, so it was dropped.
    Unchanged { version: Option<String> },
    /// A new model was published.
    Published {
        source: String,
        version: Option<String>,
    },
}

/// Where the archive bytes of one refresh come from.
enum ArchiveInput {
    File(PathBuf),
    Downloaded(Vec<u8>),
}

impl ArchiveInput {
    /// Read (or cache) the bytes and load them. Blocking.
    fn load(self, cache: &ArchiveCache, options: &LoadOptions) -> Result<GtfsData, FeedError> {
        let bytes = match self {
            ArchiveInput::File(path) => std::fs::read(&path)?,
            ArchiveInput::Downloaded(bytes) => {
                cache.store(&bytes)?;
                bytes
            }
        };
        Ok(load_feed(&FeedArchive::from_zip(Cursor::new(bytes))?, options)?)
    }
}

/// Keeps a [`ScheduleProvider`] supplied with the current feed.
#[derive(Debug, Clone)]
pub struct FeedRefresher {
    gate: FreshnessGate,
    options: LoadOptions,
    client: FeedClient,
    archive: ArchiveCache,
    record: LoadRecordCache,
}

impl FeedRefresher {
    /// Archive cache and load record both live in `data_dir`.
    pub fn new(
        client: FeedClient,
        data_dir: impl AsRef<Path>,
        policy: FreshnessPolicy,
        options: LoadOptions,
    ) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            gate: FreshnessGate::new(policy),
            options,
            archive: ArchiveCache::new(data_dir, client.url()),
            record: LoadRecordCache::new(data_dir.join(LOAD_RECORD_FILE)),
            client,
        }
    }

    /// Run one refresh against `provider`.
    ///
    /// On any error the published model is left as it was.
    pub async fn refresh(&self, provider: &ScheduleProvider) -> Result<RefreshOutcome, FeedError> {
        let now = SystemTime::now();
        let published = provider.is_loaded().await;
        let record = self.record.load();
        let cached = self.archive.cached();

        let (input, source) = match self
            .gate
            .decide(now, published, record.as_ref(), cached.as_ref())
        {
            Decision::KeepCurrent => {
                info!("schedule is fresh, skipping refresh");
                return Ok(RefreshOutcome::Fresh);
            }
            Decision::LoadOverride(path) => {
                if !path.exists() {
                    return Err(FeedError::OverrideMissing { path });
                }
                info!(path = %path.display(), "loading override archive");
                let source = path.display().to_string();
                (ArchiveInput::File(path), source)
            }
            Decision::LoadCachedArchive(path) => {
                info!(path = %path.display(), "loading cached archive");
                (ArchiveInput::File(path), self.client.url().to_string())
            }
            Decision::Download => {
                let bytes = self.client.download().await?;
                (ArchiveInput::Downloaded(bytes), self.client.url().to_string())
            }
        };

        // zip and CSV work runs on the blocking pool
        let archive = self.archive.clone();
        let options = self.options;
        let model = tokio::task::spawn_blocking(move || input.load(&archive, &options)).await??;
        let version = model.feed_version().map(str::to_string);

        if !self
            .gate
            .should_replace(published, record.as_ref(), version.as_deref())
        {
            warn!(
                version = version.as_deref().unwrap_or("-"),
                "feed version unchanged, keeping published schedule"
            );
            return Ok(RefreshOutcome::Unchanged { version });
        }

        let same_version = version.is_some()
            && record.as_ref().and_then(|r| r.feed_version.as_deref()) == version.as_deref();
        provider.publish(model).await;

        // the record keeps the time a version was first seen
        if !same_version || self.gate.policy().force_replace {
            self.record
                .save(&LoadRecord::new(now, source.clone(), version.as_deref()))?;
        }

        Ok(RefreshOutcome::Published { source, version })
    }

    pub fn record_cache(&self) -> &LoadRecordCache {
        &self.record
    }

    pub fn archive_cache(&self) -> &ArchiveCache {
        &self.archive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedClientConfig;
    use crate::test_feed::TestFeed;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn refresher(data_dir: &Path, policy: FreshnessPolicy) -> FeedRefresher {
        let client = FeedClient::new(FeedClientConfig::new("http://127.0.0.1:9/feed.zip")).unwrap();
        FeedRefresher::new(client, data_dir, policy, LoadOptions::default())
    }

    #[tokio::test]
    async fn missing_override_is_an_error() {
        let dir = tempdir().unwrap();
        let policy = FreshnessPolicy::default().with_override(dir.path().join("absent.zip"));
        let err = refresher(dir.path(), policy)
            .refresh(&ScheduleProvider::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::OverrideMissing { .. }));
    }

    #[tokio::test]
    async fn override_publishes_and_records() {
        let dir = tempdir().unwrap();
        let zip = dir.path().join("override.zip");
        std::fs::write(&zip, TestFeed::dublin().zip_bytes()).unwrap();
        let refresher = refresher(dir.path(), FreshnessPolicy::default().with_override(&zip));
        let provider = ScheduleProvider::new();

        let outcome = refresher.refresh(&provider).await.unwrap();
        assert_eq!(
            outcome,
            RefreshOutcome::Published {
                source: zip.display().to_string(),
                version: Some("2026-01-v1".to_string()),
            }
        );
        assert!(provider.is_loaded().await);
        let record = refresher.record_cache().load().unwrap();
        assert_eq!(record.feed_version.as_deref(), Some("2026-01-v1"));
    }

    #[tokio::test]
    async fn same_version_keeps_model_and_record() {
        let dir = tempdir().unwrap();
        let zip = dir.path().join("override.zip");
        std::fs::write(&zip, TestFeed::dublin().zip_bytes()).unwrap();
        let refresher = refresher(dir.path(), FreshnessPolicy::default().with_override(&zip));
        let provider = ScheduleProvider::new();

        refresher.refresh(&provider).await.unwrap();
        let first = provider.snapshot().await.unwrap();
        let stale = LoadRecord {
            loaded_at_secs: 1_000,
            ..refresher.record_cache().load().unwrap()
        };
        refresher.record_cache().save(&stale).unwrap();

        let outcome = refresher.refresh(&provider).await.unwrap();
        assert_eq!(
            outcome,
            RefreshOutcome::Unchanged {
                version: Some("2026-01-v1".to_string())
            }
        );
        assert!(Arc::ptr_eq(&first, &provider.snapshot().await.unwrap()));
        assert_eq!(refresher.record_cache().load(), Some(stale));
    }

    #[tokio::test]
    async fn forced_same_version_republishes() {
        let dir = tempdir().unwrap();
        let zip = dir.path().join("override.zip");
        std::fs::write(&zip, TestFeed::dublin().zip_bytes()).unwrap();
        let policy = FreshnessPolicy::default()
            .with_override(&zip)
            .with_force_replace(true);
        let refresher = refresher(dir.path(), policy);
        let provider = ScheduleProvider::new();

        refresher.refresh(&provider).await.unwrap();
        let first = provider.snapshot().await.unwrap();
        let outcome = refresher.refresh(&provider).await.unwrap();
        assert!(matches!(outcome, RefreshOutcome::Published { .. }));
        assert!(!Arc::ptr_eq(&first, &provider.snapshot().await.unwrap()));
    }

    #[tokio::test]
    async fn cached_archive_then_fresh() {
        let dir = tempdir().unwrap();
        let refresher = refresher(dir.path(), FreshnessPolicy::default());
        refresher
            .archive_cache()
            .store(&TestFeed::dublin().zip_bytes())
            .unwrap();
        let provider = ScheduleProvider::new();

        let outcome = refresher.refresh(&provider).await.unwrap();
        assert_eq!(
            outcome,
            RefreshOutcome::Published {
                source: "http://127.0.0.1:9/feed.zip".to_string(),
                version: Some("2026-01-v1".to_string()),
            }
        );
        assert_eq!(
            refresher.refresh(&provider).await.unwrap(),
            RefreshOutcome::Fresh
        );
    }

    #[tokio::test]
    async fn panicked_load_task_is_a_feed_error() {
        let join = tokio::task::spawn_blocking(|| -> Result<GtfsData, FeedError> {
            panic!("load crashed")
        })
        .await
        .unwrap_err();
        let err = FeedError::from(join);
        assert!(matches!(err, FeedError::Task(_)));
        assert!(err.to_string().starts_with("load task failed"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn readers_served_during_reload() {
        let dir = tempdir().unwrap();
        let zip = dir.path().join("override.zip");
        std::fs::write(&zip, TestFeed::dublin().zip_bytes()).unwrap();
        let policy = FreshnessPolicy::default()
            .with_override(&zip)
            .with_force_replace(true);
        let refresher = refresher(dir.path(), policy);
        let provider = ScheduleProvider::new();
        refresher.refresh(&provider).await.unwrap();
        let before = provider.snapshot().await.unwrap();

        let reader = provider.clone();
        let reads = tokio::spawn(async move {
            for _ in 0..100 {
                let model = reader.snapshot().await.unwrap();
                assert_eq!(model.trip("D1").unwrap().id, "D1");
                tokio::task::yield_now().await;
            }
        });
        refresher.refresh(&provider).await.unwrap();
        reads.await.unwrap();
        assert!(!Arc::ptr_eq(&before, &provider.snapshot().await.unwrap()));
        // the superseded snapshot still answers
        assert_eq!(before.trip("E1").unwrap().service_id, "SAT");
    }

    #[tokio::test]
    async fn broken_archive_keeps_current() {
        let dir = tempdir().unwrap();
        let zip = dir.path().join("override.zip");
        std::fs::write(&zip, TestFeed::dublin().zip_bytes()).unwrap();
        let provider = ScheduleProvider::new();
        refresher(dir.path(), FreshnessPolicy::default().with_override(&zip))
            .refresh(&provider)
            .await
            .unwrap();
        let before = provider.snapshot().await.unwrap();

        std::fs::write(&zip, b"truncated").unwrap();
        let err = refresher(dir.path(), FreshnessPolicy::default().with_override(&zip))
            .refresh(&provider)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Load(_)));
        assert!(Arc::ptr_eq(&before, &provider.snapshot().await.unwrap()));
    }
}
