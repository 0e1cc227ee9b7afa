//! Durable Storage Module
//!
//! The durable tier is any synchronous, capacity-bounded text key-value
//! store. The cache is a client of this trait and never trusts what it reads:
//! entries are validated on decode.
//!
//! # Implementations
//! - [`MemoryStore`] - in-process map shared between clones, optional quota
//! - [`FileStore`] - a JSON file on disk, flushed on every mutation

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StoreResult;

/// Default byte capacity, matching the usual browser local storage quota.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

// == Durable Store Trait ==
/// A synchronous text key-value store scoped to one origin.
///
/// The store holds keys that belong to other users of the same origin; the
/// cache only touches keys under its own namespace.
pub trait DurableStore: Send + Sync + std::fmt::Debug {
    /// Reads the text stored under `key`.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `value` under `key`, failing with `QuotaExceeded` when the
    /// store would grow past its capacity.
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes `key`; removing an absent key succeeds.
    fn remove(&mut self, key: &str) -> StoreResult<()>;

    /// Lists every key in the store.
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Bytes a key/value pair occupies against the quota.
pub(crate) fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}
