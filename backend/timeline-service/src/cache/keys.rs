//! Cache key schema
//!
//! Key format: v{VERSION}:{entity}:{identifier}

/// Cache schema version - increment when changing key formats
pub const CACHE_VERSION: u32 = 1;

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Cached timeline for a viewer
    /// Format: v1:timeline:{viewer_id}
    pub fn timeline(viewer_id: &str) -> String {
        format!("v{}:timeline:{}", CACHE_VERSION, viewer_id)
    }

    /// Invalidation counter for a viewer's timeline
    /// Format: v1:timeline_gen:{viewer_id}
    pub fn timeline_generation(viewer_id: &str) -> String {
        format!("v{}:timeline_gen:{}", CACHE_VERSION, viewer_id)
    }
}
