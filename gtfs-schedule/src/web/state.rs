//! Application state for the web layer.

use std::sync::Arc;

use crate::provider::ScheduleProvider;
use crate::schedule::GtfsData;

use super::routes::AppError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The published schedule, swapped by the refresh task
    pub provider: ScheduleProvider,
}

impl AppState {
    pub fn new(provider: ScheduleProvider) -> Self {
        Self { provider }
    }

    /// Snapshot of the current schedule, or 503 before the first load.
    pub async fn schedule(&self) -> Result<Arc<GtfsData>, AppError> {
        self.provider
            .snapshot()
            .await
            .ok_or_else(|| AppError::Unavailable {
                message: "schedule not loaded yet".to_string(),
            })
    }
}
