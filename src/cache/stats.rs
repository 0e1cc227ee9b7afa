//! Cache Statistics Module
//!
//! Diagnostic snapshot of the cache plus running operation counters.

use serde::Serialize;

// == Cache Stats ==
/// Read-only snapshot returned by `Cache::stats`.
///
/// Intended for people looking at a console or the `/stats` endpoint, not
/// as a stable machine interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries currently held in the memory tier
    pub memory_entries: usize,
    /// Entries under the namespace in the durable tier
    pub persistent_entries: usize,
    /// Bytes (keys + text) used by the namespace in the durable tier
    pub persistent_bytes: usize,
    /// Default TTL applied by `set`, in seconds
    pub default_ttl_secs: u64,
    /// Whether a durable store is attached
    pub persistent_available: bool,
    /// Lookups answered from either tier
    pub hits: u64,
    /// Lookups that found nothing usable
    pub misses: u64,
    /// Entries dropped because they expired, were corrupted, or overflowed
    /// the memory bound
    pub evictions: u64,
    /// Writes that ended up memory-only
    pub degraded_writes: u64,
}

impl CacheStats {
    /// Hits / (hits + misses), or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Running counters owned by the cache.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub degraded_writes: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_degraded_write(&mut self) {
        self.degraded_writes += 1;
    }
}
