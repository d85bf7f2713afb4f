use super::invalidate_timeline;
use crate::cache::TimelineCache;
use crate::error::{Result, TimelineError};
use crate::models::sort_newest_first;
use social_store::{SocialGraphStore, Tweet, TweetStore};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Tweet writes and lookups
///
/// Every write invalidates the author's own timeline before returning.
pub struct TweetService {
    tweets: Arc<dyn TweetStore>,
    graph: Arc<dyn SocialGraphStore>,
    cache: Arc<dyn TimelineCache>,
}

impl TweetService {
    pub fn new(
        tweets: Arc<dyn TweetStore>,
        graph: Arc<dyn SocialGraphStore>,
        cache: Arc<dyn TimelineCache>,
    ) -> Self {
        Self {
            tweets,
            graph,
            cache,
        }
    }

    pub async fn create_tweet(&self, author_id: &str, content: &str) -> Result<Tweet> {
        if !self.graph.user_exists(author_id).await? {
            return Err(TimelineError::user_not_found(author_id));
        }

        let tweet = Tweet::new(Uuid::new_v4().to_string(), author_id, content)?;
        self.tweets.save(tweet.clone()).await?;
        invalidate_timeline(self.cache.as_ref(), author_id, "tweet_created").await;

        info!(tweet_id = %tweet.id, author_id = %author_id, "Tweet created");
        Ok(tweet)
    }

    /// Remove a tweet and return it
    pub async fn delete_tweet(&self, tweet_id: &str) -> Result<Tweet> {
        let tweet = self.tweets.delete(tweet_id).await?;
        invalidate_timeline(self.cache.as_ref(), &tweet.author_id, "tweet_deleted").await;

        info!(tweet_id = %tweet_id, author_id = %tweet.author_id, "Tweet deleted");
        Ok(tweet)
    }

    pub async fn get_tweet(&self, tweet_id: &str) -> Result<Tweet> {
        self.tweets
            .find_by_id(tweet_id)
            .await?
            .ok_or_else(|| TimelineError::NotFound(format!("tweet {}", tweet_id)))
    }

    /// A user's own tweets, newest first
    pub async fn tweets_by_user(&self, user_id: &str) -> Result<Vec<Tweet>> {
        if !self.graph.user_exists(user_id).await? {
            return Err(TimelineError::user_not_found(user_id));
        }

        let mut tweets = self.tweets.find_by_author(user_id).await?;
        sort_newest_first(&mut tweets);
        Ok(tweets)
    }

    pub async fn all_tweets(&self) -> Result<Vec<Tweet>> {
        Ok(self.tweets.find_all().await?)
    }
}
