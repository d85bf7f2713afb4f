//! Redis-backed timeline cache
//!
//! Timelines are stored as JSON under `v1:timeline:{viewer_id}` with
//! `SET EX`, so Redis enforces the TTL itself. Shared by every replica of the
//! service.
//!
//! The invalidation generation lives in `v1:timeline_gen:{viewer_id}` without
//! a TTL. `invalidate` deletes the entry and increments it in one MULTI;
//! `put_if_generation` compares and sets in a Lua script.

use super::{CacheError, CacheKey, CacheResult, TimelineCache};
use crate::metrics::CacheMetrics;
use crate::models::Timeline;
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client, Script};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Shared Redis connection manager
pub type SharedRedis = Arc<Mutex<ConnectionManager>>;

/// KEYS[1] entry, KEYS[2] generation; ARGV[1] expected generation,
/// ARGV[2] payload, ARGV[3] TTL seconds
const PUT_IF_GENERATION: &str = r#"
    local current = redis.call('GET', KEYS[2]) or '0'
    if current ~= ARGV[1] then
        return 0
    end
    redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
    return 1
"#;

#[derive(Clone)]
pub struct RedisTimelineCache {
    redis: SharedRedis,
    ttl: Duration,
    metrics: CacheMetrics,
    put_if_generation: Script,
}

impl RedisTimelineCache {
    pub fn new(redis: SharedRedis, ttl: Duration) -> Self {
        Self {
            redis,
            ttl,
            metrics: CacheMetrics::new("redis"),
            put_if_generation: Script::new(PUT_IF_GENERATION),
        }
    }

    /// Open a connection manager against `url`
    pub async fn connect(url: &str, ttl: Duration) -> CacheResult<Self> {
        let client = Client::open(url).map_err(CacheError::from_redis)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(CacheError::from_redis)?;

        debug!(ttl_secs = ttl.as_secs(), "Connected timeline cache to Redis");
        Ok(Self::new(Arc::new(Mutex::new(manager)), ttl))
    }

    /// Redis rejects `SET EX 0`; sub-second TTLs round up to one second.
    fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }

    fn fail(&self, op: &str, err: CacheError) -> CacheError {
        self.metrics.record_error(op, err.kind());
        err
    }
}

#[async_trait::async_trait]
impl TimelineCache for RedisTimelineCache {
    async fn get(&self, viewer_id: &str) -> CacheResult<Option<Arc<Timeline>>> {
        let key = CacheKey::timeline(viewer_id);
        let mut conn = self.redis.lock().await;

        let data = conn
            .get::<_, Option<String>>(&key)
            .await
            .map_err(|e| self.fail("get", CacheError::from_redis(e)))?;

        let Some(data) = data else {
            debug!(key = %key, "Timeline cache miss");
            self.metrics.record_miss();
            return Ok(None);
        };

        match serde_json::from_str::<Timeline>(&data) {
            Ok(timeline) if !timeline.is_stale() => {
                debug!(key = %key, "Timeline cache hit");
                self.metrics.record_hit();
                Ok(Some(Arc::new(timeline)))
            }
            Ok(_) => {
                // Older payload layout, drop and treat as a miss
                debug!(key = %key, "Stale timeline schema, deleting");
                if let Err(del_err) = conn.del::<_, ()>(&key).await {
                    warn!(key = %key, error = %del_err, "Failed to delete stale timeline entry");
                }
                self.metrics.record_miss();
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Timeline cache payload undecodable, deleting");
                if let Err(del_err) = conn.del::<_, ()>(&key).await {
                    warn!(key = %key, error = %del_err, "Failed to delete corrupted timeline entry");
                }
                Err(self.fail("get", CacheError::InvalidData(e.to_string())))
            }
        }
    }

    async fn put(&self, viewer_id: &str, timeline: Arc<Timeline>) -> CacheResult<()> {
        let key = CacheKey::timeline(viewer_id);
        let data = serde_json::to_string(timeline.as_ref())
            .map_err(|e| self.fail("put", CacheError::Serialization(e)))?;
        let ttl_secs = self.ttl_secs();

        let mut conn = self.redis.lock().await;
        conn.set_ex::<_, _, ()>(&key, data, ttl_secs)
            .await
            .map_err(|e| self.fail("put", CacheError::from_redis(e)))?;

        debug!(key = %key, ttl = ttl_secs, "Timeline cache set");
        self.metrics.record_write();
        Ok(())
    }

    async fn invalidate(&self, viewer_id: &str) -> CacheResult<()> {
        let key = CacheKey::timeline(viewer_id);
        let gen_key = CacheKey::timeline_generation(viewer_id);

        let mut pipe = ::redis::pipe();
        pipe.atomic().del(&key).ignore().incr(&gen_key, 1).ignore();

        let mut conn = self.redis.lock().await;
        pipe.query_async::<_, ()>(&mut *conn)
            .await
            .map_err(|e| self.fail("invalidate", CacheError::from_redis(e)))?;

        debug!(key = %key, "Timeline cache delete");
        self.metrics.record_invalidation();
        Ok(())
    }

    async fn generation(&self, viewer_id: &str) -> CacheResult<u64> {
        let gen_key = CacheKey::timeline_generation(viewer_id);
        let mut conn = self.redis.lock().await;
        let generation = conn
            .get::<_, Option<u64>>(&gen_key)
            .await
            .map_err(|e| self.fail("generation", CacheError::from_redis(e)))?;
        Ok(generation.unwrap_or(0))
    }

    async fn put_if_generation(
        &self,
        viewer_id: &str,
        timeline: Arc<Timeline>,
        generation: u64,
    ) -> CacheResult<bool> {
        let key = CacheKey::timeline(viewer_id);
        let gen_key = CacheKey::timeline_generation(viewer_id);
        let data = serde_json::to_string(timeline.as_ref())
            .map_err(|e| self.fail("put", CacheError::Serialization(e)))?;
        let ttl_secs = self.ttl_secs();

        let mut conn = self.redis.lock().await;
        let stored = self
            .put_if_generation
            .key(&key)
            .key(&gen_key)
            .arg(generation)
            .arg(data)
            .arg(ttl_secs)
            .invoke_async::<_, i64>(&mut *conn)
            .await
            .map_err(|e| self.fail("put", CacheError::from_redis(e)))?;

        if stored == 0 {
            debug!(key = %key, expected = generation, "Timeline invalidated since assembly started, not caching");
            return Ok(false);
        }

        debug!(key = %key, ttl = ttl_secs, "Timeline cache set");
        self.metrics.record_write();
        Ok(true)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use social_store::Tweet;

    fn sample_timeline() -> Timeline {
        let tweets = vec![
            Tweet {
                id: "t1".to_string(),
                author_id: "b".to_string(),
                content: "first".to_string(),
                created_at: Utc.timestamp_opt(10, 0).unwrap(),
            },
            Tweet {
                id: "t2".to_string(),
                author_id: "c".to_string(),
                content: "second".to_string(),
                created_at: Utc.timestamp_opt(20, 0).unwrap(),
            },
        ];
        Timeline::from_unsorted("a", tweets)
    }

    #[test]
    fn test_payload_preserves_order() {
        let timeline = sample_timeline();
        let json = serde_json::to_string(&timeline).unwrap();
        let decoded: Timeline = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, timeline);
        assert_eq!(decoded.tweet_ids(), vec!["t2", "t1"]);
    }

    #[test]
    fn test_truncated_payload_fails_to_decode() {
        let json = serde_json::to_string(&sample_timeline()).unwrap();
        let truncated = &json[..json.len() / 2];
        assert!(serde_json::from_str::<Timeline>(truncated).is_err());
    }

    async fn connect_from_env(ttl: Duration) -> Option<RedisTimelineCache> {
        let url = std::env::var("TIMELINE_REDIS_URL").ok()?;
        RedisTimelineCache::connect(&url, ttl).await.ok()
    }

    #[tokio::test]
    #[ignore] // Requires Redis via TIMELINE_REDIS_URL
    async fn test_redis_put_get_invalidate() {
        let Some(cache) = connect_from_env(Duration::from_secs(60)).await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        let viewer = format!("test-viewer-{}", uuid::Uuid::new_v4());
        let timeline = Arc::new(sample_timeline());

        cache.put(&viewer, Arc::clone(&timeline)).await.unwrap();
        let cached = cache.get(&viewer).await.unwrap().expect("cached timeline");
        assert_eq!(cached.tweet_ids(), timeline.tweet_ids());

        cache.invalidate(&viewer).await.unwrap();
        assert!(cache.get(&viewer).await.unwrap().is_none());

        // Deleting an absent key is fine
        cache.invalidate(&viewer).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires Redis via TIMELINE_REDIS_URL
    async fn test_redis_corrupted_payload_is_invalid_data() {
        let Some(cache) = connect_from_env(Duration::from_secs(60)).await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        let viewer = format!("test-viewer-{}", uuid::Uuid::new_v4());
        let key = CacheKey::timeline(&viewer);
        {
            let mut conn = cache.redis.lock().await;
            conn.set_ex::<_, _, ()>(&key, "{not json", 60).await.unwrap();
        }

        let err = cache.get(&viewer).await.unwrap_err();
        assert!(matches!(err, CacheError::InvalidData(_)));

        // Entry was deleted, next read is a clean miss
        assert!(cache.get(&viewer).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis via TIMELINE_REDIS_URL
    async fn test_redis_put_if_generation_after_invalidate() {
        let Some(cache) = connect_from_env(Duration::from_secs(60)).await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        let viewer = format!("test-viewer-{}", uuid::Uuid::new_v4());
        let generation = cache.generation(&viewer).await.unwrap();
        assert_eq!(generation, 0);

        cache.invalidate(&viewer).await.unwrap();
        let stored = cache
            .put_if_generation(&viewer, Arc::new(sample_timeline()), generation)
            .await
            .unwrap();
        assert!(!stored);
        assert!(cache.get(&viewer).await.unwrap().is_none());

        let current = cache.generation(&viewer).await.unwrap();
        assert_eq!(current, 1);
        assert!(cache
            .put_if_generation(&viewer, Arc::new(sample_timeline()), current)
            .await
            .unwrap());
        assert!(cache.get(&viewer).await.unwrap().is_some());

        let mut conn = cache.redis.lock().await;
        conn.del::<_, ()>(vec![CacheKey::timeline(&viewer), CacheKey::timeline_generation(&viewer)])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_redis_is_unavailable() {
        let result = RedisTimelineCache::connect("redis://127.0.0.1:1", Duration::from_secs(60)).await;
        match result {
            Err(CacheError::Unavailable(_)) => {}
            Err(other) => panic!("expected Unavailable, got {other:?}"),
            Ok(_) => panic!("expected connection failure"),
        }
    }
}
