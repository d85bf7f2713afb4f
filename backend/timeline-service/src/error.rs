//! Service-level error types

use social_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// Viewer, user or tweet does not exist. Never retried.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient failure from the social graph or tweet store
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Entity-level rule rejected the write (self-follow, tweet length)
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<StoreError> for TimelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound(id) => TimelineError::NotFound(format!("user {}", id)),
            StoreError::TweetNotFound(id) => TimelineError::NotFound(format!("tweet {}", id)),
            StoreError::CannotFollowSelf | StoreError::TweetTooLong { .. } => {
                TimelineError::Validation(err.to_string())
            }
            StoreError::Unavailable(msg) => TimelineError::StoreUnavailable(msg),
        }
    }
}

impl TimelineError {
    pub fn user_not_found(user_id: &str) -> Self {
        TimelineError::NotFound(format!("user {}", user_id))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TimelineError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, TimelineError>;
