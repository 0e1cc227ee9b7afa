//! Tiered Cache - a two-tier key-value cache with TTL expiration
//!
//! A memory tier sits in front of a durable text store; values are written
//! through to both and expire after their TTL. Storage failures degrade the
//! cache instead of failing callers. A read-through fetch wrapper and a small
//! HTTP surface are built on top.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, Lookup, SharedCache, WriteOutcome};
pub use config::{CacheConfig, Config};
pub use tasks::{spawn_sweep_task, SweepHandle};
