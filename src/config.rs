use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::batcher::DEFAULT_QUIET_PERIOD;
use crate::ratelimit::{EndpointLimits, RateLimitPolicy};

/// Default API base the CLI batchers flush to.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Longest rate limit window accepted from the environment.
pub const MAX_LIMIT_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. Anything unset falls
/// back to `Config::default()`.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// Base URL of the grudge API (client side).
    pub api_url: String,
    /// How long a key must be quiet before its batch is flushed.
    pub quiet_period: Duration,
    /// Shared window length for every endpoint quota.
    pub limit_window: Duration,
    pub dislike_limit: u32,
    pub reaction_limit: u32,
    pub read_limit: u32,
    /// How often idle rate limit identifiers are swept.
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            api_url: DEFAULT_API_URL.to_string(),
            quiet_period: DEFAULT_QUIET_PERIOD,
            limit_window: Duration::from_secs(60),
            dislike_limit: 30,
            reaction_limit: 60,
            read_limit: 120,
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl Config {
    /// Load configuration from environment variables over the defaults.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            db_path: env::var("GRUDGE_DB_PATH").unwrap_or(defaults.db_path),
            api_url: env::var("GRUDGE_API_URL").unwrap_or(defaults.api_url),
            quiet_period: env_u64("GRUDGE_QUIET_PERIOD_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.quiet_period),
            limit_window: env_u64("GRUDGE_LIMIT_WINDOW_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.limit_window),
            dislike_limit: env_u32("GRUDGE_DISLIKE_LIMIT")?.unwrap_or(defaults.dislike_limit),
            reaction_limit: env_u32("GRUDGE_REACTION_LIMIT")?.unwrap_or(defaults.reaction_limit),
            read_limit: env_u32("GRUDGE_READ_LIMIT")?.unwrap_or(defaults.read_limit),
            sweep_interval: env_u64("GRUDGE_LIMIT_SWEEP_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall the batcher or the sweeper.
    pub fn validate(&self) -> Result<()> {
        if self.quiet_period.is_zero() {
            anyhow::bail!("GRUDGE_QUIET_PERIOD_MS must be at least 1");
        }
        if self.limit_window.is_zero() {
            anyhow::bail!("GRUDGE_LIMIT_WINDOW_SECS must be at least 1");
        }
        if self.limit_window > MAX_LIMIT_WINDOW {
            anyhow::bail!(
                "GRUDGE_LIMIT_WINDOW_SECS must be at most {}, got {}",
                MAX_LIMIT_WINDOW.as_secs(),
                self.limit_window.as_secs()
            );
        }
        if self.sweep_interval.is_zero() {
            anyhow::bail!("GRUDGE_LIMIT_SWEEP_SECS must be at least 1");
        }
        Ok(())
    }

    /// Build the per-endpoint limiters described by this config.
    pub fn endpoint_limits(&self) -> EndpointLimits {
        EndpointLimits::new(
            RateLimitPolicy::new(self.limit_window, self.dislike_limit),
            RateLimitPolicy::new(self.limit_window, self.reaction_limit),
            RateLimitPolicy::new(self.limit_window, self.read_limit),
        )
    }
}

/// `<data dir>/grudge/grudge.db`, or `./grudge.db` where the platform has
/// no data directory.
pub fn default_db_path() -> String {
    dirs::data_local_dir()
        .map(|dir| dir.join("grudge").join("grudge.db"))
        .unwrap_or_else(|| PathBuf::from("./grudge.db"))
        .to_string_lossy()
        .into_owned()
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} must be a non-negative integer, got {raw:?}")),
        Err(_) => Ok(None),
    }
}

fn env_u32(name: &str) -> Result<Option<u32>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} must be a non-negative integer, got {raw:?}")),
        Err(_) => Ok(None),
    }
}
