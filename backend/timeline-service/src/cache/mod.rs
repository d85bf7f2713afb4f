//! Timeline cache
//!
//! Read-through cache of assembled timelines keyed by viewer ID:
//! - `get` distinguishes a clean miss (`Ok(None)`) from a backend failure (`Err`)
//! - `put` stores with a fixed TTL counted from insertion (not sliding)
//! - `invalidate` removes the entry; removing an absent entry is not an error
//!
//! Entry lifecycle: ABSENT -> PRESENT (put) -> ABSENT (invalidate, or TTL
//! expiry observed lazily by the next `get`).
//!
//! Every `invalidate` also bumps a per-viewer generation. A reader records the
//! generation before assembling and writes back with `put_if_generation`, so a
//! snapshot assembled before a write can never land after that write's
//! invalidation.
//!
//! The cache is an accelerator, never a source of truth. Callers own the
//! invalidation triggers (see `services`).

mod error;
mod keys;
pub mod memory;
pub mod redis;

pub use error::{CacheError, CacheResult};
pub use keys::{CacheKey, CACHE_VERSION};
pub use memory::InMemoryTimelineCache;
pub use self::redis::RedisTimelineCache;

use crate::models::Timeline;
use std::sync::Arc;

/// Default TTL values (seconds)
pub mod ttl {
    pub const TIMELINE: u64 = 300; // 5 minutes
}

#[async_trait::async_trait]
pub trait TimelineCache: Send + Sync {
    /// Look up a viewer's cached timeline
    async fn get(&self, viewer_id: &str) -> CacheResult<Option<Arc<Timeline>>>;

    /// Store a viewer's timeline with the cache's TTL
    async fn put(&self, viewer_id: &str, timeline: Arc<Timeline>) -> CacheResult<()>;

    /// Drop a viewer's cached timeline and bump its generation
    async fn invalidate(&self, viewer_id: &str) -> CacheResult<()>;

    /// Current invalidation generation for a viewer, 0 if never invalidated
    async fn generation(&self, viewer_id: &str) -> CacheResult<u64>;

    /// Store only if the viewer's generation still equals `generation`.
    /// Returns `Ok(false)` when an invalidation ran in between.
    async fn put_if_generation(
        &self,
        viewer_id: &str,
        timeline: Arc<Timeline>,
        generation: u64,
    ) -> CacheResult<bool>;

    /// Backend label for logs and metrics
    fn backend(&self) -> &'static str;
}
