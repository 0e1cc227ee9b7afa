//! Cache Module
//!
//! Two-tier key-value cache with TTL expiration: a memory tier in front of a
//! durable text store.

mod clock;
mod entry;
mod lru;
mod outcome;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use outcome::{DegradeReason, Lookup, MissReason, SweepReport, Tier, WriteOutcome};
pub use stats::CacheStats;
pub use store::{Cache, SharedCache};
