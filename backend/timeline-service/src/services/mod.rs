//! Read and write paths over the stores and the timeline cache
//!
//! Invalidation rules:
//! - tweet created or deleted by U: drop U's own timeline only
//! - U follows or unfollows someone: drop U's own timeline
//!
//! Followers of U are never invalidated by U's tweets; their entries converge
//! when the TTL runs out.

mod timeline;
mod tweet;
mod user;

pub use timeline::TimelineService;
pub use tweet::TweetService;
pub use user::UserService;

use crate::cache::TimelineCache;
use tracing::{debug, warn};

/// Drop `viewer_id`'s cached timeline after a committed write.
///
/// Returns whether the cache accepted the invalidation. A failure is only
/// logged: the write stands and the stale entry ages out with the TTL.
pub(crate) async fn invalidate_timeline(
    cache: &dyn TimelineCache,
    viewer_id: &str,
    cause: &'static str,
) -> bool {
    match cache.invalidate(viewer_id).await {
        Ok(()) => {
            debug!(viewer_id = %viewer_id, cause = cause, "Timeline invalidated");
            true
        }
        Err(e) => {
            warn!(
                viewer_id = %viewer_id,
                cause = cause,
                backend = cache.backend(),
                error = %e,
                "Failed to invalidate timeline cache"
            );
            false
        }
    }
}
