//! AI Cache - content-addressed response cache for AI inference calls
//!
//! Hashes request content, serves stored answers until their TTL runs
//! out, and only calls the provider on a miss.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheCoordinator, CacheStore, CoordinatorConfig, Fetched, Invalidator};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
