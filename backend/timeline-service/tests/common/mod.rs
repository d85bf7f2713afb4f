#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use social_store::{InMemorySocialGraph, InMemoryTweetStore, Tweet, User};
use std::sync::Arc;
use std::time::Duration;
use timeline_service::cache::{CacheError, CacheResult};
use timeline_service::{InMemoryTimelineCache, Timeline, TimelineApp, TimelineCache, TimelineConfig};

pub fn init_tracing() {
    let _ = timeline_service::telemetry::init_tracing("debug");
}

pub fn config_with_ttl(ttl: Duration) -> TimelineConfig {
    TimelineConfig {
        cache_ttl_secs: ttl.as_secs(),
        fanout_concurrency: 4,
        ..TimelineConfig::default()
    }
}

/// App over in-process stores, with handles to the stores and the cache
pub struct TestApp {
    pub app: TimelineApp,
    pub graph: Arc<InMemorySocialGraph>,
    pub tweets: Arc<InMemoryTweetStore>,
    pub cache: Arc<InMemoryTimelineCache>,
}

pub fn test_app(ttl: Duration) -> TestApp {
    init_tracing();
    let graph = Arc::new(InMemorySocialGraph::new());
    let tweets = Arc::new(InMemoryTweetStore::new());
    let cache = Arc::new(InMemoryTimelineCache::new(ttl));

    let app = TimelineApp::with_cache(
        config_with_ttl(ttl),
        graph.clone(),
        tweets.clone(),
        cache.clone(),
    )
    .expect("app builds");

    TestApp {
        app,
        graph,
        tweets,
        cache,
    }
}

pub fn user(id: &str, following: &[&str]) -> User {
    let mut user = User::new(id, format!("{}-name", id));
    for followee in following {
        user.follow(followee).expect("not self");
    }
    user
}

pub fn tweet_at(id: &str, author: &str, secs: i64) -> Tweet {
    Tweet {
        id: id.to_string(),
        author_id: author.to_string(),
        content: format!("{} by {}", id, author),
        created_at: Utc.timestamp_opt(secs, 0).unwrap(),
    }
}

/// Cache whose backend is down for every operation
pub struct UnavailableCache;

#[async_trait::async_trait]
impl TimelineCache for UnavailableCache {
    async fn get(&self, _viewer_id: &str) -> CacheResult<Option<Arc<Timeline>>> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn put(&self, _viewer_id: &str, _timeline: Arc<Timeline>) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn invalidate(&self, _viewer_id: &str) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn generation(&self, _viewer_id: &str) -> CacheResult<u64> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn put_if_generation(
        &self,
        _viewer_id: &str,
        _timeline: Arc<Timeline>,
        _generation: u64,
    ) -> CacheResult<bool> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    fn backend(&self) -> &'static str {
        "unavailable"
    }
}
