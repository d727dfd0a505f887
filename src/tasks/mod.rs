//! Background Tasks Module
//!
//! Work that runs detached from the caller.
//!
//! # Tasks
//! - Write-back: stores a provider response after a cache miss
//! - Expiry sweep: optional periodic purge of an in-memory backend

mod cleanup;
mod writeback;

pub use cleanup::spawn_cleanup_task;
pub use writeback::{spawn_write, WriteTracker};
