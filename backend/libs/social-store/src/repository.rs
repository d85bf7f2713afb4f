use crate::{StoreResult, Tweet, User};
use std::collections::HashSet;

/// Storage contract for users and follow edges.
#[async_trait::async_trait]
pub trait SocialGraphStore: Send + Sync {
    /// Insert or replace a user
    async fn save_user(&self, user: User) -> StoreResult<()>;

    /// Look up a user; `Ok(None)` when absent
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<User>>;

    /// All users in unspecified order
    async fn find_all_users(&self) -> StoreResult<Vec<User>>;

    /// Add `followee_id` to the follower's following set in one atomic step.
    ///
    /// Both users must exist (`UserNotFound`); self-follow is rejected with
    /// `CannotFollowSelf`. Following an already-followed user is a no-op.
    async fn follow(&self, follower_id: &str, followee_id: &str) -> StoreResult<()>;

    /// Remove `followee_id` from the follower's following set in one atomic
    /// step. Only the follower must exist.
    async fn unfollow(&self, follower_id: &str, followee_id: &str) -> StoreResult<()>;

    /// IDs the user follows. Fails with `UserNotFound` if the user is absent.
    async fn find_following(&self, user_id: &str) -> StoreResult<HashSet<String>>;

    /// Users the user follows that still exist
    async fn find_following_users(&self, user_id: &str) -> StoreResult<Vec<User>>;

    /// Users that follow `user_id`
    async fn find_followers(&self, user_id: &str) -> StoreResult<Vec<User>>;

    async fn user_exists(&self, user_id: &str) -> StoreResult<bool> {
        Ok(self.find_user(user_id).await?.is_some())
    }
}

/// Storage contract for tweets.
///
/// No ordering is promised by `find_by_author`; consumers sort.
#[async_trait::async_trait]
pub trait TweetStore: Send + Sync {
    async fn save(&self, tweet: Tweet) -> StoreResult<()>;

    /// Look up a tweet; `Ok(None)` when absent
    async fn find_by_id(&self, tweet_id: &str) -> StoreResult<Option<Tweet>>;

    /// Tweets authored by `author_id`; empty when the author has none
    async fn find_by_author(&self, author_id: &str) -> StoreResult<Vec<Tweet>>;

    /// All tweets, newest first
    async fn find_all(&self) -> StoreResult<Vec<Tweet>>;

    /// Remove a tweet and return it. Fails with `TweetNotFound` if absent.
    async fn delete(&self, tweet_id: &str) -> StoreResult<Tweet>;
}
