use crate::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum number of characters allowed in a tweet
pub const MAX_TWEET_LENGTH: usize = 280;

/// A user and the set of user IDs they follow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub following: HashSet<String>,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            following: HashSet::new(),
        }
    }

    /// Start following another user. Following an already-followed user is a no-op.
    pub fn follow(&mut self, user_id: &str) -> StoreResult<()> {
        if self.id == user_id {
            return Err(StoreError::CannotFollowSelf);
        }
        self.following.insert(user_id.to_string());
        Ok(())
    }

    pub fn unfollow(&mut self, user_id: &str) {
        self.following.remove(user_id);
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.following.contains(user_id)
    }
}

/// A single tweet. Immutable once stored; only deletion changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Tweet {
    /// Create a tweet stamped with the current time.
    ///
    /// Content length is counted in characters, not bytes.
    pub fn new(
        id: impl Into<String>,
        author_id: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<Self> {
        let content = content.into();
        let len = content.chars().count();
        if len > MAX_TWEET_LENGTH {
            return Err(StoreError::TweetTooLong {
                len,
                max: MAX_TWEET_LENGTH,
            });
        }

        Ok(Self {
            id: id.into(),
            author_id: author_id.into(),
            content,
            created_at: Utc::now(),
        })
    }
}
