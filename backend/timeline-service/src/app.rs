//! Composition root
//!
//! Wires one cache instance into the assembler-backed read path and both
//! write paths. Cache selection:
//! - `redis_url` set and reachable: Redis
//! - `redis_url` set but unreachable: warn and use the in-memory cache
//! - `redis_url` unset: in-memory cache

use crate::assembler::TimelineAssembler;
use crate::cache::{InMemoryTimelineCache, RedisTimelineCache, TimelineCache};
use crate::config::TimelineConfig;
use crate::metrics;
use crate::services::{TimelineService, TweetService, UserService};
use crate::telemetry;
use anyhow::Context;
use prometheus::Registry;
use social_store::{InMemorySocialGraph, InMemoryTweetStore, SocialGraphStore, TweetStore};
use std::sync::Arc;
use tracing::{info, warn};

pub struct TimelineApp {
    pub config: TimelineConfig,
    pub timelines: TimelineService,
    pub tweets: TweetService,
    pub users: UserService,
    cache: Arc<dyn TimelineCache>,
    registry: Registry,
}

impl TimelineApp {
    /// Read config from the environment, install logging, and build over
    /// in-process stores.
    pub async fn from_env() -> anyhow::Result<Self> {
        let config = TimelineConfig::from_env()?;
        let _ = telemetry::init_tracing(&config.log_filter);

        let graph: Arc<dyn SocialGraphStore> = Arc::new(InMemorySocialGraph::new());
        let tweets: Arc<dyn TweetStore> = Arc::new(InMemoryTweetStore::new());
        Self::build(config, graph, tweets).await
    }

    /// Build over the given stores, picking the cache backend from `config`
    pub async fn build(
        config: TimelineConfig,
        graph: Arc<dyn SocialGraphStore>,
        tweets: Arc<dyn TweetStore>,
    ) -> anyhow::Result<Self> {
        let cache = select_cache(&config).await;
        Self::with_cache(config, graph, tweets, cache)
    }

    /// In-process stores and in-memory cache, no I/O
    pub fn in_memory(config: TimelineConfig) -> anyhow::Result<Self> {
        let cache = Arc::new(InMemoryTimelineCache::new(config.cache_ttl()));
        Self::with_cache(
            config,
            Arc::new(InMemorySocialGraph::new()),
            Arc::new(InMemoryTweetStore::new()),
            cache,
        )
    }

    pub fn with_cache(
        config: TimelineConfig,
        graph: Arc<dyn SocialGraphStore>,
        tweets: Arc<dyn TweetStore>,
        cache: Arc<dyn TimelineCache>,
    ) -> anyhow::Result<Self> {
        let registry = Registry::new();
        metrics::register(&registry).context("Failed to register timeline metrics")?;

        let assembler = Arc::new(TimelineAssembler::new(
            Arc::clone(&graph),
            Arc::clone(&tweets),
            config.fanout_concurrency,
        ));

        info!(
            cache_backend = cache.backend(),
            cache_ttl_secs = config.cache_ttl_secs,
            fanout_concurrency = assembler.fanout_concurrency(),
            "Timeline service initialized"
        );

        Ok(Self {
            timelines: TimelineService::new(assembler, Arc::clone(&cache)),
            tweets: TweetService::new(tweets, Arc::clone(&graph), Arc::clone(&cache)),
            users: UserService::new(graph, Arc::clone(&cache)),
            config,
            cache,
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> Arc<dyn TimelineCache> {
        Arc::clone(&self.cache)
    }

    pub fn cache_backend(&self) -> &'static str {
        self.cache.backend()
    }
}

async fn select_cache(config: &TimelineConfig) -> Arc<dyn TimelineCache> {
    let ttl = config.cache_ttl();

    let Some(url) = config.redis_url.as_deref() else {
        return Arc::new(InMemoryTimelineCache::new(ttl));
    };

    match RedisTimelineCache::connect(url, ttl).await {
        Ok(cache) => {
            info!("Using Redis timeline cache");
            Arc::new(cache)
        }
        Err(e) => {
            warn!(error = %e, "Redis unavailable, falling back to in-memory timeline cache");
            Arc::new(InMemoryTimelineCache::new(ttl))
        }
    }
}
