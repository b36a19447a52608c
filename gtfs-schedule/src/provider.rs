//! Shared handle to the current schedule.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::schedule::GtfsData;

/// Thread-safe holder of the published schedule.
///
/// Readers take an `Arc` snapshot and keep using it for as long as they
/// like; publishing a new model only swaps the pointer, so a reload never
/// disturbs a reader of the previous model.
#[derive(Clone, Default)]
pub struct ScheduleProvider {
    inner: Arc<RwLock<Option<Arc<GtfsData>>>>,
}

impl ScheduleProvider {
    /// Create a provider with nothing published.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that already holds a model.
    pub fn with_model(model: GtfsData) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Arc::new(model)))),
        }
    }

    /// The current model, `None` before the first publish.
    pub async fn snapshot(&self) -> Option<Arc<GtfsData>> {
        let guard = self.inner.read().await;
        guard.clone()
    }

    /// Whether a model has been published.
    pub async fn is_loaded(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Replace the current model, returning the one it superseded.
    pub async fn publish(&self, model: GtfsData) -> Option<Arc<GtfsData>> {
        let model = Arc::new(model);
        let counts = model.counts();
        let mut guard = self.inner.write().await;
        let previous = guard.replace(model);
        info!(
            trips = counts.trips,
            stops = counts.stops,
            replaced = previous.is_some(),
            "published schedule"
        );
        previous
    }

    /// Build a model outside the lock and publish it on success.
    ///
    /// On failure the current model stays published and the error is
    /// returned.
    pub async fn reload<E>(
        &self,
        build: impl FnOnce() -> Result<GtfsData, E>,
    ) -> Result<Arc<GtfsData>, E> {
        let model = Arc::new(build()?);
        let mut guard = self.inner.write().await;
        *guard = Some(Arc::clone(&model));
        info!(trips = model.counts().trips, "reloaded schedule");
        Ok(model)
    }
}
