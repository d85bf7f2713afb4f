//! Timeline service
//!
//! Per-viewer timelines assembled on read from the tweet and social graph
//! stores, fronted by a TTL-bounded read-through cache.
//!
//! - `assembler`: bounded parallel fan-out over {viewer} ∪ following, fail-fast
//! - `cache`: `TimelineCache` trait with in-memory and Redis backends
//! - `services`: cache-aside reads, and writes that invalidate the writer's
//!   own timeline
//! - `app`: composition root

pub mod app;
pub mod assembler;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod telemetry;

pub use app::TimelineApp;
pub use assembler::TimelineAssembler;
pub use cache::{CacheError, InMemoryTimelineCache, RedisTimelineCache, TimelineCache};
pub use config::TimelineConfig;
pub use error::{Result, TimelineError};
pub use models::{Timeline, TimelineRead, TimelineSource};
pub use services::{TimelineService, TweetService, UserService};
