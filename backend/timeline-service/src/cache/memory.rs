//! In-process timeline cache
//!
//! Per-viewer slots live in a `DashMap` so concurrent requests can
//! get/put/invalidate without a global lock. A slot holds the cached entry and
//! the viewer's invalidation generation. Expiry is checked lazily on `get`;
//! `evict_expired` sweeps the whole map on demand.
//!
//! A slot with a non-zero generation is kept after its entry is gone, so the
//! generation never falls back to an older value.

use super::{ttl, CacheResult, TimelineCache};
use crate::metrics::CacheMetrics;
use crate::models::Timeline;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry {
    timeline: Arc<Timeline>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

#[derive(Default)]
struct Slot {
    entry: Option<CacheEntry>,
    generation: u64,
}

impl Slot {
    /// Drop the entry if it has expired; returns whether it did
    fn expire(&mut self, now: Instant) -> bool {
        if self.entry.as_ref().is_some_and(|e| e.is_expired(now)) {
            self.entry = None;
            return true;
        }
        false
    }

    fn is_vacant(&self) -> bool {
        self.entry.is_none() && self.generation == 0
    }
}

pub struct InMemoryTimelineCache {
    slots: DashMap<String, Slot>,
    ttl: Duration,
    metrics: CacheMetrics,
}

impl InMemoryTimelineCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
            metrics: CacheMetrics::new("memory"),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry and return how many were removed
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut evicted = 0;
        self.slots.retain(|_, slot| {
            if slot.expire(now) {
                evicted += 1;
            }
            !slot.is_vacant()
        });
        if evicted > 0 {
            debug!(evicted = evicted, "Evicted expired timeline entries");
        }
        evicted
    }

    fn entry_for(&self, timeline: Arc<Timeline>) -> CacheEntry {
        CacheEntry {
            timeline,
            expires_at: Instant::now() + self.ttl,
        }
    }
}

impl Default for InMemoryTimelineCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(ttl::TIMELINE))
    }
}

#[async_trait::async_trait]
impl TimelineCache for InMemoryTimelineCache {
    async fn get(&self, viewer_id: &str) -> CacheResult<Option<Arc<Timeline>>> {
        let now = Instant::now();

        // The map guard must be released before the slot is locked for writing
        let live = self.slots.get(viewer_id).and_then(|slot| {
            slot.entry
                .as_ref()
                .filter(|entry| !entry.is_expired(now))
                .map(|entry| Arc::clone(&entry.timeline))
        });

        if let Some(timeline) = live {
            debug!(viewer_id = %viewer_id, "Timeline cache hit");
            self.metrics.record_hit();
            return Ok(Some(timeline));
        }

        // Re-checks expiry under the slot lock so a concurrent fresh put survives
        if let Some(mut slot) = self.slots.get_mut(viewer_id) {
            if slot.expire(now) {
                debug!(viewer_id = %viewer_id, "Timeline cache entry expired");
            }
        }
        self.slots.remove_if(viewer_id, |_, slot| slot.is_vacant());

        debug!(viewer_id = %viewer_id, "Timeline cache miss");
        self.metrics.record_miss();
        Ok(None)
    }

    async fn put(&self, viewer_id: &str, timeline: Arc<Timeline>) -> CacheResult<()> {
        let entry = self.entry_for(timeline);
        self.slots.entry(viewer_id.to_string()).or_default().entry = Some(entry);

        debug!(viewer_id = %viewer_id, ttl_secs = self.ttl.as_secs(), "Timeline cache set");
        self.metrics.record_write();
        Ok(())
    }

    async fn invalidate(&self, viewer_id: &str) -> CacheResult<()> {
        let (removed, generation) = {
            let mut slot = self.slots.entry(viewer_id.to_string()).or_default();
            slot.generation += 1;
            (slot.entry.take().is_some(), slot.generation)
        };

        debug!(
            viewer_id = %viewer_id,
            removed = removed,
            generation = generation,
            "Timeline cache invalidated"
        );
        self.metrics.record_invalidation();
        Ok(())
    }

    async fn generation(&self, viewer_id: &str) -> CacheResult<u64> {
        Ok(self
            .slots
            .get(viewer_id)
            .map(|slot| slot.generation)
            .unwrap_or(0))
    }

    async fn put_if_generation(
        &self,
        viewer_id: &str,
        timeline: Arc<Timeline>,
        generation: u64,
    ) -> CacheResult<bool> {
        let entry = self.entry_for(timeline);
        {
            let mut slot = self.slots.entry(viewer_id.to_string()).or_default();
            if slot.generation != generation {
                debug!(
                    viewer_id = %viewer_id,
                    expected = generation,
                    current = slot.generation,
                    "Timeline invalidated since assembly started, not caching"
                );
                return Ok(false);
            }
            slot.entry = Some(entry);
        }

        debug!(viewer_id = %viewer_id, ttl_secs = self.ttl.as_secs(), "Timeline cache set");
        self.metrics.record_write();
        Ok(true)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use social_store::Tweet;

    fn timeline(viewer: &str, ids: &[&str]) -> Arc<Timeline> {
        let tweets = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Tweet {
                id: id.to_string(),
                author_id: viewer.to_string(),
                content: String::new(),
                created_at: Utc.timestamp_opt(i as i64, 0).unwrap(),
            })
            .collect();
        Arc::new(Timeline::from_unsorted(viewer, tweets))
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_then_get_returns_same_timeline() {
        let cache = InMemoryTimelineCache::new(Duration::from_secs(60));
        let stored = timeline("v", &["t1", "t2"]);

        cache.put("v", Arc::clone(&stored)).await.unwrap();
        let cached = cache.get("v").await.unwrap().expect("entry present");

        assert_eq!(*cached, *stored);
        assert!(Arc::ptr_eq(&cached, &stored));
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_for_unknown_viewer() {
        let cache = InMemoryTimelineCache::new(Duration::from_secs(60));
        assert!(cache.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = InMemoryTimelineCache::new(Duration::from_secs(60));
        cache.put("v", timeline("v", &["t1"])).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("v").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("v").await.unwrap().is_none());
        // Lazy expiry removed the entry
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_do_not_extend_ttl() {
        let cache = InMemoryTimelineCache::new(Duration::from_secs(10));
        cache.put("v", timeline("v", &["t1"])).await.unwrap();

        for _ in 0..9 {
            tokio::time::advance(Duration::from_secs(1)).await;
            assert!(cache.get("v").await.unwrap().is_some());
        }
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("v").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_restarts_ttl() {
        let cache = InMemoryTimelineCache::new(Duration::from_secs(10));
        cache.put("v", timeline("v", &["old"])).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        cache.put("v", timeline("v", &["new"])).await.unwrap();

        tokio::time::advance(Duration::from_secs(8)).await;
        let cached = cache.get("v").await.unwrap().expect("refreshed entry");
        assert_eq!(cached.tweet_ids(), vec!["new"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate() {
        let cache = InMemoryTimelineCache::new(Duration::from_secs(60));
        cache.put("v", timeline("v", &["t1"])).await.unwrap();
        cache.put("w", timeline("w", &["t2"])).await.unwrap();

        cache.invalidate("v").await.unwrap();
        assert!(cache.get("v").await.unwrap().is_none());
        // Other viewers untouched
        assert!(cache.get("w").await.unwrap().is_some());

        // Absent entry is not an error
        cache.invalidate("v").await.unwrap();
        cache.invalidate("never-cached").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_expired() {
        let cache = InMemoryTimelineCache::new(Duration::from_secs(10));
        cache.put("a", timeline("a", &[])).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        cache.put("b", timeline("b", &[])).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_access() {
        let cache = Arc::new(InMemoryTimelineCache::new(Duration::from_secs(60)));
        let mut handles = Vec::new();

        for i in 0..32 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let viewer = format!("viewer-{}", i % 4);
                for _ in 0..50 {
                    cache.put(&viewer, timeline(&viewer, &["t"])).await.unwrap();
                    if let Some(t) = cache.get(&viewer).await.unwrap() {
                        assert_eq!(t.viewer_id, viewer);
                    }
                    cache.invalidate(&viewer).await.unwrap();
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
        assert!(cache.len() <= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_if_generation_rejected_after_invalidate() {
        let cache = InMemoryTimelineCache::new(Duration::from_secs(60));
        let generation = cache.generation("v").await.unwrap();
        assert_eq!(generation, 0);

        // A write lands while the reader is assembling
        cache.invalidate("v").await.unwrap();

        let stored = cache
            .put_if_generation("v", timeline("v", &["old"]), generation)
            .await
            .unwrap();
        assert!(!stored);
        assert!(cache.get("v").await.unwrap().is_none());

        let current = cache.generation("v").await.unwrap();
        assert!(cache
            .put_if_generation("v", timeline("v", &["fresh"]), current)
            .await
            .unwrap());
        let cached = cache.get("v").await.unwrap().expect("fresh entry");
        assert_eq!(cached.tweet_ids(), vec!["fresh"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_survives_expiry_and_sweeps() {
        let cache = InMemoryTimelineCache::new(Duration::from_secs(10));
        let before = cache.generation("v").await.unwrap();
        cache.put("v", timeline("v", &["t1"])).await.unwrap();
        cache.invalidate("v").await.unwrap();
        cache.put("v", timeline("v", &["t2"])).await.unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(cache.get("v").await.unwrap().is_none());
        assert_eq!(cache.evict_expired(), 0);

        // Older readers stay rejected after the entry is gone
        let after = cache.generation("v").await.unwrap();
        assert!(after > before);
        assert!(!cache
            .put_if_generation("v", timeline("v", &["stale"]), before)
            .await
            .unwrap());
        assert!(cache.is_empty());
    }
}
