use crate::assembler::TimelineAssembler;
use crate::cache::TimelineCache;
use crate::error::Result;
use crate::models::{TimelineRead, TimelineSource};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache-aside timeline reads
///
/// Hit: return the cached snapshot as-is. Miss or cache failure: assemble,
/// write back best-effort, return the fresh snapshot. Cache trouble never
/// fails a read.
///
/// The write-back is conditional on the viewer's invalidation generation as
/// read before assembly, so a snapshot assembled before a concurrent write
/// cannot replace that write's invalidation.
pub struct TimelineService {
    assembler: Arc<TimelineAssembler>,
    cache: Arc<dyn TimelineCache>,
}

impl TimelineService {
    pub fn new(assembler: Arc<TimelineAssembler>, cache: Arc<dyn TimelineCache>) -> Self {
        Self { assembler, cache }
    }

    pub async fn timeline(&self, viewer_id: &str) -> Result<TimelineRead> {
        let mut degraded = false;

        match self.cache.get(viewer_id).await {
            Ok(Some(timeline)) => {
                debug!(viewer_id = %viewer_id, "Serving timeline from cache");
                return Ok(TimelineRead {
                    timeline,
                    source: TimelineSource::Cache,
                    degraded: false,
                });
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    viewer_id = %viewer_id,
                    backend = self.cache.backend(),
                    error = %e,
                    "Timeline cache lookup failed, assembling"
                );
                degraded = true;
            }
        }

        let generation = match self.cache.generation(viewer_id).await {
            Ok(generation) => Some(generation),
            Err(e) => {
                warn!(
                    viewer_id = %viewer_id,
                    backend = self.cache.backend(),
                    error = %e,
                    "Failed to read timeline generation, skipping write-back"
                );
                None
            }
        };

        let timeline = Arc::new(self.assembler.assemble(viewer_id).await?);

        if let Some(generation) = generation {
            match self
                .cache
                .put_if_generation(viewer_id, Arc::clone(&timeline), generation)
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    debug!(viewer_id = %viewer_id, "Timeline changed during assembly, not cached");
                }
                Err(e) => {
                    warn!(
                        viewer_id = %viewer_id,
                        backend = self.cache.backend(),
                        error = %e,
                        "Failed to cache timeline"
                    );
                }
            }
        }

        Ok(TimelineRead {
            timeline,
            source: TimelineSource::Assembled,
            degraded,
        })
    }
}
