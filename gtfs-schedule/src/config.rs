//! Process configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::feed::DEFAULT_FEED_URL;
use crate::freshness::FreshnessPolicy;
use crate::load::LoadOptions;

const DAY_SECS: u64 = 24 * 60 * 60;

/// A variable was set to something that doesn't parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Everything the server binary needs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Feed archive URL
    pub url: String,
    /// Directory for the archive cache and load record
    pub data_dir: PathBuf,
    pub freshness: FreshnessPolicy,
    pub load: LoadOptions,
    /// Address the web layer listens on
    pub bind_addr: SocketAddr,
    /// How often the background task re-checks the feed
    pub refresh_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            data_dir: PathBuf::from(".gtfs-data"),
            freshness: FreshnessPolicy::default(),
            load: LoadOptions::default(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            refresh_interval: Duration::from_secs(DAY_SECS),
        }
    }
}

impl Config {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("GTFS_URL") {
            config.url = url;
        }
        if let Some(dir) = get("GTFS_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(days) = parsed::<u64>("GTFS_FRESHNESS_DAYS", get("GTFS_FRESHNESS_DAYS"))? {
            config.freshness.max_age = scaled("GTFS_FRESHNESS_DAYS", days, DAY_SECS)?;
        }
        if let Some(days) = parsed::<u64>(
            "GTFS_ARCHIVE_FRESHNESS_DAYS",
            get("GTFS_ARCHIVE_FRESHNESS_DAYS"),
        )? {
            config.freshness.archive_max_age =
                scaled("GTFS_ARCHIVE_FRESHNESS_DAYS", days, DAY_SECS)?;
        }
        if let Some(force) = flag("GTFS_FORCE_REPLACE", get("GTFS_FORCE_REPLACE"))? {
            config.freshness.force_replace = force;
        }
        if let Some(path) = get("GTFS_OVERRIDE") {
            config.freshness.override_path = Some(PathBuf::from(path));
        }
        if let Some(allow) = flag("GTFS_ALLOW_UNKNOWN_FILE", get("GTFS_ALLOW_UNKNOWN_FILE"))? {
            config.load.allow_unknown_file = allow;
        }
        if let Some(allow) = flag("GTFS_ALLOW_UNKNOWN_FIELD", get("GTFS_ALLOW_UNKNOWN_FIELD"))? {
            config.load.allow_unknown_field = allow;
        }
        if let Some(addr) = parsed::<SocketAddr>("BIND_ADDR", get("BIND_ADDR"))? {
            config.bind_addr = addr;
        }
        if let Some(hours) = parsed::<u64>("GTFS_REFRESH_HOURS", get("GTFS_REFRESH_HOURS"))? {
            if hours == 0 {
                return Err(ConfigError {
                    var: "GTFS_REFRESH_HOURS",
                    value: hours.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            config.refresh_interval = scaled("GTFS_REFRESH_HOURS", hours, 60 * 60)?;
        }

        Ok(config)
    }
}

fn parsed<T>(var: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| ConfigError {
                var,
                value: v.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn scaled(var: &'static str, value: u64, unit_secs: u64) -> Result<Duration, ConfigError> {
    value
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError {
            var,
            value: value.to_string(),
            reason: "too large".to_string(),
        })
}

fn flag(var: &'static str, value: Option<String>) -> Result<Option<bool>, ConfigError> {
    value
        .map(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError {
                var,
                value: v.clone(),
                reason: "expected true or false".to_string(),
            }),
        })
        .transpose()
}
