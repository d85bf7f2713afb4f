//! Social graph and tweet storage
//!
//! Provides the two storage contracts the timeline core depends on:
//! - `SocialGraphStore`: users and their following sets
//! - `TweetStore`: tweets keyed by ID and by author
//!
//! The storage engine is an external concern. `memory` ships in-process
//! implementations of both contracts backed by `tokio::sync::RwLock` maps.

mod error;
pub mod memory;
pub mod models;
mod repository;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemorySocialGraph, InMemoryTweetStore};
pub use models::{Tweet, User, MAX_TWEET_LENGTH};
pub use repository::{SocialGraphStore, TweetStore};
