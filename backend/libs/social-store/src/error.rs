//! Store error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Tweet not found: {0}")]
    TweetNotFound(String),

    #[error("User cannot follow themselves")]
    CannotFollowSelf,

    #[error("Tweet exceeds character limit ({len} > {max})")]
    TweetTooLong { len: usize, max: usize },

    /// Transient backend failure; callers may retry at an outer layer
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::UserNotFound(_) | StoreError::TweetNotFound(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
