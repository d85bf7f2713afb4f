//! Timeline value types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use social_store::Tweet;
use std::cmp::Ordering;
use std::sync::Arc;

/// A viewer's merged feed, newest first.
///
/// A timeline is a snapshot: once assembled it never changes. Cached copies
/// are shared behind `Arc` and must not be mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub viewer_id: String,
    pub tweets: Vec<Tweet>,
    /// When the assembler produced this snapshot
    pub generated_at: DateTime<Utc>,
    /// Payload layout version, bumped when the cached shape changes
    pub schema_version: u32,
}

impl Timeline {
    pub const CURRENT_SCHEMA_VERSION: u32 = 1;

    /// Build a timeline from an unordered tweet collection.
    pub fn from_unsorted(viewer_id: impl Into<String>, mut tweets: Vec<Tweet>) -> Self {
        sort_newest_first(&mut tweets);
        Self {
            viewer_id: viewer_id.into(),
            tweets,
            generated_at: Utc::now(),
            schema_version: Self::CURRENT_SCHEMA_VERSION,
        }
    }

    /// Check if a cached payload predates the current layout
    pub fn is_stale(&self) -> bool {
        self.schema_version < Self::CURRENT_SCHEMA_VERSION
    }

    pub fn len(&self) -> usize {
        self.tweets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty()
    }

    pub fn tweet_ids(&self) -> Vec<&str> {
        self.tweets.iter().map(|t| t.id.as_str()).collect()
    }
}

/// Timeline order: `created_at` descending, equal timestamps by tweet ID ascending.
pub fn timeline_order(a: &Tweet, b: &Tweet) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_newest_first(tweets: &mut [Tweet]) {
    tweets.sort_by(timeline_order);
}

/// Where a timeline read was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineSource {
    Cache,
    Assembled,
}

/// Result of a cache-aside timeline read
#[derive(Debug, Clone)]
pub struct TimelineRead {
    pub timeline: Arc<Timeline>,
    pub source: TimelineSource,
    /// Set when the cache lookup failed and the timeline was assembled anyway.
    /// A failed write-back does not set it.
    pub degraded: bool,
}
