use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENV_PREFIX: &str = "TIMELINE_";

/// Timeline service configuration, read from `TIMELINE_*` env vars
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Cached timeline lifetime in seconds, counted from insertion
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Upper bound on concurrent per-author fetches in one assembly
    #[serde(default = "default_fanout_concurrency")]
    pub fanout_concurrency: usize,
    /// Redis endpoint for the shared cache; in-memory cache when unset
    #[serde(default)]
    pub redis_url: Option<String>,
    /// tracing-subscriber `EnvFilter` directive
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            fanout_concurrency: default_fanout_concurrency(),
            redis_url: None,
            log_filter: default_log_filter(),
        }
    }
}

impl TimelineConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<Self>()
            .context("Failed to read TIMELINE_* configuration")?;
        config.validated()
    }

    /// Load from explicit key/value pairs (full `TIMELINE_*` names)
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Self>(vars)
            .context("Failed to read TIMELINE_* configuration")?;
        config.validated()
    }

    fn validated(mut self) -> anyhow::Result<Self> {
        if self.cache_ttl_secs == 0 {
            anyhow::bail!("TIMELINE_CACHE_TTL_SECS must be greater than zero");
        }
        self.fanout_concurrency = self.fanout_concurrency.max(1);
        self.redis_url = self.redis_url.filter(|url| !url.trim().is_empty());
        Ok(self)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn default_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_fanout_concurrency() -> usize {
    32
}

fn default_log_filter() -> String {
    "info".to_string()
}
