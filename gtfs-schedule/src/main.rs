use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gtfs_schedule::config::Config;
use gtfs_schedule::feed::{FeedClient, FeedClientConfig, FeedRefresher, RefreshOutcome};
use gtfs_schedule::provider::ScheduleProvider;
use gtfs_schedule::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "bad configuration");
            return ExitCode::FAILURE;
        }
    };

    let client = match FeedClient::new(FeedClientConfig::new(&config.url)) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to create feed client");
            return ExitCode::FAILURE;
        }
    };
    let refresher = FeedRefresher::new(
        client,
        &config.data_dir,
        config.freshness.clone(),
        config.load,
    );

    // Load before serving (fail fast if no schedule can be published)
    let provider = ScheduleProvider::new();
    match refresher.refresh(&provider).await {
        Ok(outcome) => info!(?outcome, "initial load done"),
        Err(e) => {
            error!(error = %e, "failed to load schedule");
            return ExitCode::FAILURE;
        }
    }

    // Re-check the feed periodically; a failed refresh keeps the old schedule
    let refresh_provider = provider.clone();
    let interval = config.refresh_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // First tick is immediate, skip it
        loop {
            ticker.tick().await;
            match refresher.refresh(&refresh_provider).await {
                Ok(RefreshOutcome::Published { source, version }) => info!(
                    %source,
                    version = version.as_deref().unwrap_or("-"),
                    "refreshed schedule"
                ),
                Ok(outcome) => info!(?outcome, "schedule unchanged"),
                Err(e) => error!(error = %e, "failed to refresh schedule"),
            }
        }
    });

    let app = create_router(AppState::new(provider));

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.bind_addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    info!(addr = %config.bind_addr, "GTFS schedule server listening");
    info!("endpoints: /health /feed /trips /trips/:id /shapes/:id /stops /stops/:id/board");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
