//! In-process store implementations
//!
//! Both stores guard their maps with a `tokio::sync::RwLock` so concurrent
//! readers (timeline fan-out) never block each other.

use crate::{SocialGraphStore, StoreError, StoreResult, Tweet, TweetStore, User};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory social graph keyed by user ID
#[derive(Default)]
pub struct InMemorySocialGraph {
    users: RwLock<HashMap<String, User>>,
}

impl InMemorySocialGraph {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SocialGraphStore for InMemorySocialGraph {
    async fn save_user(&self, user: User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn find_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn find_all_users(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }

    async fn follow(&self, follower_id: &str, followee_id: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if !users.contains_key(followee_id) {
            return Err(StoreError::UserNotFound(followee_id.to_string()));
        }
        // Check, mutate and store under the one write guard
        let follower = users
            .get_mut(follower_id)
            .ok_or_else(|| StoreError::UserNotFound(follower_id.to_string()))?;
        follower.follow(followee_id)?;

        debug!(follower = %follower_id, followee = %followee_id, "Follow edge stored");
        Ok(())
    }

    async fn unfollow(&self, follower_id: &str, followee_id: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let follower = users
            .get_mut(follower_id)
            .ok_or_else(|| StoreError::UserNotFound(follower_id.to_string()))?;
        follower.unfollow(followee_id);

        debug!(follower = %follower_id, followee = %followee_id, "Follow edge removed");
        Ok(())
    }

    async fn find_following(&self, user_id: &str) -> StoreResult<HashSet<String>> {
        let users = self.users.read().await;
        users
            .get(user_id)
            .map(|u| u.following.clone())
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))
    }

    async fn find_following_users(&self, user_id: &str) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let user = users
            .get(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;

        Ok(user
            .following
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect())
    }

    async fn find_followers(&self, user_id: &str) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.is_following(user_id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct TweetTables {
    by_id: HashMap<String, Tweet>,
    /// Tweet IDs per author in insertion order
    by_author: HashMap<String, Vec<String>>,
}

/// In-memory tweet store indexed by ID and by author
#[derive(Default)]
pub struct InMemoryTweetStore {
    tables: RwLock<TweetTables>,
}

impl InMemoryTweetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TweetStore for InMemoryTweetStore {
    async fn save(&self, tweet: Tweet) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        let ids = tables.by_author.entry(tweet.author_id.clone()).or_default();
        if !ids.contains(&tweet.id) {
            ids.push(tweet.id.clone());
        }
        tables.by_id.insert(tweet.id.clone(), tweet);
        Ok(())
    }

    async fn find_by_id(&self, tweet_id: &str) -> StoreResult<Option<Tweet>> {
        let tables = self.tables.read().await;
        Ok(tables.by_id.get(tweet_id).cloned())
    }

    async fn find_by_author(&self, author_id: &str) -> StoreResult<Vec<Tweet>> {
        let tables = self.tables.read().await;
        let tweets: Vec<Tweet> = tables
            .by_author
            .get(author_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();

        debug!(author_id = %author_id, count = tweets.len(), "Loaded tweets by author");
        Ok(tweets)
    }

    async fn find_all(&self) -> StoreResult<Vec<Tweet>> {
        let tables = self.tables.read().await;
        let mut tweets: Vec<Tweet> = tables.by_id.values().cloned().collect();
        tweets.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(tweets)
    }

    async fn delete(&self, tweet_id: &str) -> StoreResult<Tweet> {
        let mut tables = self.tables.write().await;
        let tweet = tables
            .by_id
            .remove(tweet_id)
            .ok_or_else(|| StoreError::TweetNotFound(tweet_id.to_string()))?;

        if let Some(ids) = tables.by_author.get_mut(&tweet.author_id) {
            ids.retain(|id| id != tweet_id);
        }
        Ok(tweet)
    }
}
