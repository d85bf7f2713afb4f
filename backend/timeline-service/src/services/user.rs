use super::invalidate_timeline;
use crate::cache::TimelineCache;
use crate::error::{Result, TimelineError};
use social_store::{SocialGraphStore, StoreError, User};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// User lifecycle and follow edges
///
/// Follow and unfollow change the follower's fetch set, so both drop the
/// follower's cached timeline before returning.
pub struct UserService {
    graph: Arc<dyn SocialGraphStore>,
    cache: Arc<dyn TimelineCache>,
}

impl UserService {
    pub fn new(graph: Arc<dyn SocialGraphStore>, cache: Arc<dyn TimelineCache>) -> Self {
        Self { graph, cache }
    }

    pub async fn create_user(&self, username: &str) -> Result<User> {
        let user = User::new(Uuid::new_v4().to_string(), username);
        self.graph.save_user(user.clone()).await?;

        info!(user_id = %user.id, username = %username, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.require_user(user_id).await
    }

    pub async fn all_users(&self) -> Result<Vec<User>> {
        Ok(self.graph.find_all_users().await?)
    }

    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> Result<()> {
        if let Err(e) = self.graph.follow(follower_id, followee_id).await {
            if matches!(e, StoreError::Unavailable(_)) {
                error!(
                    follower = %follower_id,
                    followee = %followee_id,
                    error = %e,
                    "Failed to persist follow"
                );
            }
            return Err(e.into());
        }
        info!(follower = %follower_id, followee = %followee_id, "User followed");

        invalidate_timeline(self.cache.as_ref(), follower_id, "follow").await;
        Ok(())
    }

    /// Unfollowing someone not followed (or no longer existing) still succeeds
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> Result<()> {
        if let Err(e) = self.graph.unfollow(follower_id, followee_id).await {
            if matches!(e, StoreError::Unavailable(_)) {
                error!(
                    follower = %follower_id,
                    followee = %followee_id,
                    error = %e,
                    "Failed to persist unfollow"
                );
            }
            return Err(e.into());
        }
        info!(follower = %follower_id, followee = %followee_id, "User unfollowed");

        invalidate_timeline(self.cache.as_ref(), follower_id, "unfollow").await;
        Ok(())
    }

    pub async fn followers(&self, user_id: &str) -> Result<Vec<User>> {
        self.require_user(user_id).await?;
        Ok(self.graph.find_followers(user_id).await?)
    }

    pub async fn following(&self, user_id: &str) -> Result<Vec<User>> {
        self.require_user(user_id).await?;
        Ok(self.graph.find_following_users(user_id).await?)
    }

    async fn require_user(&self, user_id: &str) -> Result<User> {
        self.graph
            .find_user(user_id)
            .await?
            .ok_or_else(|| TimelineError::user_not_found(user_id))
    }
}
