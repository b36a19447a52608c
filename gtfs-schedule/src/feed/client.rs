//! HTTP download of feed archives.

use std::time::Duration;

use tracing::info;

use super::error::FeedError;

/// Irish Rail static GTFS published by Transport for Ireland.
pub const DEFAULT_FEED_URL: &str =
    "https://www.transportforireland.ie/transitData/Data/GTFS_Irish_Rail.zip";

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// Archive URL
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: 120,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_URL)
    }
}

/// Downloads the archive for one feed URL.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    url: String,
}

impl FeedClient {
    pub fn new(config: FeedClientConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: config.url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the whole archive. Non-success statuses are errors.
    pub async fn download(&self) -> Result<Vec<u8>, FeedError> {
        info!(url = %self.url, "downloading feed");
        let response = self.http.get(&self.url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        info!(bytes = bytes.len(), "downloaded feed");
        Ok(bytes.to_vec())
    }
}
