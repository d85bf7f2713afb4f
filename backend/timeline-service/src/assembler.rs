//! Fan-out-on-read timeline assembly
//!
//! One `find_by_author` per member of {viewer} ∪ following(viewer), run with
//! bounded concurrency. The first failed fetch aborts the assembly: in-flight
//! fetches are dropped and nothing partial is returned.

use crate::error::{Result, TimelineError};
use crate::metrics;
use crate::models::Timeline;
use futures::stream::{self, TryStreamExt};
use social_store::{SocialGraphStore, Tweet, TweetStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

pub struct TimelineAssembler {
    graph: Arc<dyn SocialGraphStore>,
    tweets: Arc<dyn TweetStore>,
    fanout_concurrency: usize,
}

impl TimelineAssembler {
    pub fn new(
        graph: Arc<dyn SocialGraphStore>,
        tweets: Arc<dyn TweetStore>,
        fanout_concurrency: usize,
    ) -> Self {
        Self {
            graph,
            tweets,
            fanout_concurrency: fanout_concurrency.max(1),
        }
    }

    pub fn fanout_concurrency(&self) -> usize {
        self.fanout_concurrency
    }

    /// Build a fresh timeline for `viewer_id`.
    ///
    /// Fails with `NotFound` when the viewer does not exist and with the first
    /// per-author error otherwise.
    pub async fn assemble(&self, viewer_id: &str) -> Result<Timeline> {
        let fetch_set = self.fetch_set(viewer_id).await?;
        metrics::record_fanout(fetch_set.len());

        debug!(
            viewer_id = %viewer_id,
            authors = fetch_set.len(),
            concurrency = self.fanout_concurrency,
            "Assembling timeline"
        );

        match self.fetch_all(&fetch_set).await {
            Ok(tweets) => {
                let timeline = Timeline::from_unsorted(viewer_id, tweets);
                debug!(viewer_id = %viewer_id, tweets = timeline.len(), "Timeline assembled");
                Ok(timeline)
            }
            Err(e) => {
                metrics::record_assembly_failure();
                error!(viewer_id = %viewer_id, error = %e, "Timeline assembly failed");
                Err(e)
            }
        }
    }

    /// Viewer plus everyone they follow, deduplicated
    async fn fetch_set(&self, viewer_id: &str) -> Result<BTreeSet<String>> {
        let following = self.graph.find_following(viewer_id).await?;

        let mut authors: BTreeSet<String> = following.into_iter().collect();
        authors.insert(viewer_id.to_string());
        Ok(authors)
    }

    async fn fetch_all(&self, authors: &BTreeSet<String>) -> Result<Vec<Tweet>> {
        let collected = Mutex::new(Vec::new());

        stream::iter(authors.iter().map(Ok::<_, TimelineError>))
            .try_for_each_concurrent(self.fanout_concurrency, |author| {
                let collected = &collected;
                async move {
                    let tweets = self.tweets.find_by_author(author).await.map_err(|e| {
                        warn!(author_id = %author, error = %e, "Author fetch failed");
                        TimelineError::from(e)
                    })?;
                    collected.lock().await.extend(tweets);
                    Ok(())
                }
            })
            .await?;

        Ok(collected.into_inner())
    }
}
