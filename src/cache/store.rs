//! Cache Store Module
//!
//! Two-tier cache engine: a memory map in front of a durable text store,
//! written through on every `set` and validated on every durable read.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheEntry, CacheStats, Clock, DegradeReason, Lookup, LruTracker, MissReason, SweepReport,
    SystemClock, Tier, WriteOutcome,
};
use crate::cache::stats::Counters;
use crate::config::CacheConfig;
use crate::error::StoreError;
use crate::storage::{entry_size, DurableStore};

/// A cache shared between the HTTP handlers, the sweep task and fetchers.
pub type SharedCache = Arc<RwLock<Cache>>;

// == Cache ==
/// Two-tier key-value cache with TTL expiration.
///
/// Every operation runs to completion on `&mut self`; sharing goes through
/// [`SharedCache`]. Durable-store failures never reach the caller: they turn
/// into misses or memory-only writes.
#[derive(Debug)]
pub struct Cache {
    /// Memory tier
    memory: HashMap<String, CacheEntry>,
    /// Recency order of the memory tier, used when it is bounded
    lru: LruTracker,
    /// Durable tier; `None` when absent or found unavailable
    durable: Option<Box<dyn DurableStore>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl Cache {
    // == Lifecycle ==
    /// Creates a cache over an optional durable store, using the system clock.
    pub fn create(config: CacheConfig, durable: Option<Box<dyn DurableStore>>) -> Self {
        Self::create_with_clock(config, durable, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn create_with_clock(
        config: CacheConfig,
        durable: Option<Box<dyn DurableStore>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        match &durable {
            Some(store) => info!(
                "Cache created: namespace={}, default_ttl={}s, durable={}",
                config.namespace,
                config.default_ttl.as_secs(),
                store.name()
            ),
            None => info!(
                "Cache created: namespace={}, default_ttl={}s, memory-only",
                config.namespace,
                config.default_ttl.as_secs()
            ),
        }

        Self {
            memory: HashMap::new(),
            lru: LruTracker::new(),
            durable,
            config,
            clock,
            counters: Counters::default(),
        }
    }

    /// Wraps the cache for shared use across tasks.
    pub fn into_shared(self) -> SharedCache {
        Arc::new(RwLock::new(self))
    }

    /// Releases the cache. Durable entries stay behind for the next instance.
    pub fn dispose(self) {
        let stats = self.stats();
        info!(
            "Cache disposed: {} memory entries dropped, {} durable entries kept, hit rate {:.2}",
            stats.memory_entries,
            stats.persistent_entries,
            stats.hit_rate()
        );
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Key under which `key` is written to the durable store.
    pub fn durable_key(&self, key: &str) -> String {
        format!("{}{}", self.config.namespace, key)
    }

    // == Get ==
    /// Looks up a key, memory tier first.
    ///
    /// Expired or undecodable entries found on the way are evicted. A durable
    /// hit is copied into the memory tier before returning.
    pub fn get(&mut self, key: &str) -> Lookup {
        let now = self.clock.now_ms();

        if let Some(expired) = self.memory.get(key).map(|e| e.is_expired_at(now)) {
            if expired {
                debug!("Memory entry '{}' expired", key);
                self.evict(key);
                self.counters.record_evictions(1);
                self.counters.record_miss();
                return Lookup::Miss(MissReason::Expired);
            }

            if let Some(entry) = self.memory.get(key) {
                let value = entry.value.clone();
                self.lru.touch(key);
                self.counters.record_hit();
                return Lookup::Hit {
                    value,
                    tier: Tier::Memory,
                };
            }
        }

        let durable_key = self.durable_key(key);
        let Some(text) = self.durable_get(&durable_key) else {
            self.counters.record_miss();
            return Lookup::Miss(MissReason::Absent);
        };

        match CacheEntry::from_text(&text) {
            Err(err) => {
                warn!("Evicting corrupted durable entry '{}': {}", durable_key, err);
                self.durable_remove(&durable_key);
                self.counters.record_evictions(1);
                self.counters.record_miss();
                Lookup::Miss(MissReason::Corrupted)
            }
            Ok(entry) if entry.is_expired_at(now) => {
                debug!("Durable entry '{}' expired", durable_key);
                self.durable_remove(&durable_key);
                self.counters.record_evictions(1);
                self.counters.record_miss();
                Lookup::Miss(MissReason::Expired)
            }
            Ok(entry) => {
                let value = entry.value.clone();
                self.insert_memory(key, entry);
                self.counters.record_hit();
                debug!("Warmed memory tier with '{}'", key);
                Lookup::Hit {
                    value,
                    tier: Tier::Persistent,
                }
            }
        }
    }

    /// Looks up a key and decodes it into `T`; a value of the wrong shape
    /// reads as absent.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get(key).into_value()?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                debug!("Cached value '{}' has an unexpected shape: {}", key, err);
                None
            }
        }
    }

    // == Set ==
    /// Stores a value in both tiers, resetting its age.
    ///
    /// The memory tier always takes the value. A durable write that runs into
    /// the quota triggers one sweep and one retry before degrading to
    /// memory-only.
    pub fn set(&mut self, key: &str, value: Value, ttl: Option<Duration>) -> WriteOutcome {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let entry = CacheEntry::new(value, ttl, self.clock.now_ms());

        let text = match entry.to_text() {
            Ok(text) => Some(text),
            Err(err) => {
                warn!("Failed to encode entry '{}': {}", key, err);
                None
            }
        };

        self.insert_memory(key, entry);

        let durable_key = self.durable_key(key);
        let outcome = match text {
            Some(text) => self.write_durable(&durable_key, &text),
            None => {
                self.durable_remove(&durable_key);
                WriteOutcome::MemoryOnly(DegradeReason::StoreFailure)
            }
        };

        if let WriteOutcome::MemoryOnly(reason) = outcome {
            self.counters.record_degraded_write();
            debug!("Entry '{}' kept in memory only ({:?})", key, reason);
        }
        outcome
    }

    /// Serializes `value` and stores it; an unserializable value is rejected
    /// without touching either tier.
    pub fn set_as<T: Serialize>(&mut self, key: &str, value: &T, ttl: Option<Duration>) -> WriteOutcome {
        match serde_json::to_value(value) {
            Ok(value) => self.set(key, value, ttl),
            Err(err) => {
                warn!("Rejected unserializable value for '{}': {}", key, err);
                WriteOutcome::Rejected
            }
        }
    }

    // == Remove ==
    /// Removes a key from both tiers. Removing an absent key is a no-op.
    pub fn remove(&mut self, key: &str) {
        self.evict(key);
    }

    // == Clear ==
    /// Removes every key of this cache from both tiers and returns how many
    /// distinct keys were dropped. Durable keys outside the namespace stay.
    pub fn clear(&mut self) -> usize {
        let mut removed: HashSet<String> = self.memory.drain().map(|(k, _)| k).collect();
        self.lru.clear();

        let prefix_len = self.config.namespace.len();
        for durable_key in self.namespaced_keys() {
            self.durable_remove(&durable_key);
            removed.insert(durable_key[prefix_len..].to_string());
        }

        info!("Cache cleared: {} keys removed", removed.len());
        removed.len()
    }

    // == Sweep ==
    /// Evicts every expired entry from both tiers and every undecodable
    /// durable entry.
    pub fn sweep(&mut self) -> SweepReport {
        let now = self.clock.now_ms();
        let mut report = SweepReport::default();

        let expired: Vec<String> = self
            .memory
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired {
            self.evict(&key);
            report.memory_evicted += 1;
        }

        for durable_key in self.namespaced_keys() {
            let Some(text) = self.durable_get(&durable_key) else {
                continue;
            };
            match CacheEntry::from_text(&text) {
                Ok(entry) if !entry.is_expired_at(now) => {}
                Ok(_) => {
                    self.durable_remove(&durable_key);
                    report.persistent_evicted += 1;
                }
                Err(err) => {
                    warn!("Sweeping corrupted durable entry '{}': {}", durable_key, err);
                    self.durable_remove(&durable_key);
                    report.corrupted += 1;
                }
            }
        }

        self.counters.record_evictions(report.total());
        report
    }

    // == Stats ==
    /// Returns a diagnostic snapshot. Never mutates the cache.
    pub fn stats(&self) -> CacheStats {
        let (persistent_entries, persistent_bytes) = match &self.durable {
            Some(store) => self.measure_durable(store.as_ref()),
            None => (0, 0),
        };

        CacheStats {
            memory_entries: self.memory.len(),
            persistent_entries,
            persistent_bytes,
            default_ttl_secs: self.config.default_ttl.as_secs(),
            persistent_available: self.durable.is_some(),
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
            degraded_writes: self.counters.degraded_writes,
        }
    }

    /// Number of entries in the memory tier, expired or not.
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Whether the memory tier currently holds `key`.
    pub fn in_memory(&self, key: &str) -> bool {
        self.memory.contains_key(key)
    }

    // == Memory Tier Helpers ==
    fn insert_memory(&mut self, key: &str, entry: CacheEntry) {
        if let Some(capacity) = self.config.memory_capacity {
            if !self.memory.contains_key(key) {
                while self.memory.len() >= capacity {
                    let Some(oldest) = self.lru.evict_oldest() else {
                        break;
                    };
                    self.memory.remove(&oldest);
                    self.counters.record_evictions(1);
                    debug!("Memory tier full, dropped '{}'", oldest);
                }
            }
        }

        self.memory.insert(key.to_string(), entry);
        self.lru.touch(key);
    }

    /// Drops a key from both tiers.
    fn evict(&mut self, key: &str) {
        self.memory.remove(key);
        self.lru.remove(key);
        let durable_key = self.durable_key(key);
        self.durable_remove(&durable_key);
    }

    // == Durable Tier Helpers ==
    fn write_durable(&mut self, durable_key: &str, text: &str) -> WriteOutcome {
        let Some(store) = self.durable.as_mut() else {
            return WriteOutcome::MemoryOnly(DegradeReason::Unavailable);
        };

        let result = match store.set(durable_key, text) {
            Err(StoreError::QuotaExceeded { needed, available }) => {
                debug!(
                    "Quota exceeded writing '{}' ({} needed, {} available), sweeping",
                    durable_key, needed, available
                );
                let report = self.sweep();
                debug!("Quota sweep reclaimed {} entries", report.total());
                match self.durable.as_mut() {
                    Some(store) => store.set(durable_key, text),
                    None => return WriteOutcome::MemoryOnly(DegradeReason::Unavailable),
                }
            }
            other => other,
        };

        let reason = match result {
            Ok(()) => return WriteOutcome::Durable,
            Err(StoreError::QuotaExceeded { .. }) => {
                warn!("Durable tier still full, keeping '{}' in memory only", durable_key);
                DegradeReason::QuotaExceeded
            }
            Err(StoreError::Unavailable(msg)) => {
                self.detach_durable(&msg);
                return WriteOutcome::MemoryOnly(DegradeReason::Unavailable);
            }
            Err(err) => {
                warn!("Durable write of '{}' failed: {}", durable_key, err);
                DegradeReason::StoreFailure
            }
        };

        // An older durable copy must not outlive the newer memory-only value
        self.durable_remove(durable_key);
        WriteOutcome::MemoryOnly(reason)
    }

    fn durable_get(&mut self, durable_key: &str) -> Option<String> {
        let result = self.durable.as_ref()?.get(durable_key);
        match result {
            Ok(text) => text,
            Err(err) => {
                self.store_failed("read", durable_key, err);
                None
            }
        }
    }

    fn durable_remove(&mut self, durable_key: &str) {
        let Some(store) = self.durable.as_mut() else {
            return;
        };
        if let Err(err) = store.remove(durable_key) {
            self.store_failed("remove", durable_key, err);
        }
    }

    /// Durable keys under this cache's namespace.
    fn namespaced_keys(&mut self) -> Vec<String> {
        let Some(store) = self.durable.as_ref() else {
            return Vec::new();
        };
        match store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(&self.config.namespace))
                .collect(),
            Err(err) => {
                self.store_failed("list", "*", err);
                Vec::new()
            }
        }
    }

    fn measure_durable(&self, store: &dyn DurableStore) -> (usize, usize) {
        let keys = match store.keys() {
            Ok(keys) => keys,
            Err(err) => {
                debug!("Could not list durable keys for stats: {}", err);
                return (0, 0);
            }
        };

        keys.iter()
            .filter(|k| k.starts_with(&self.config.namespace))
            .filter_map(|k| match store.get(k) {
                Ok(Some(text)) => Some(entry_size(k, &text)),
                _ => None,
            })
            .fold((0, 0), |(count, bytes), size| (count + 1, bytes + size))
    }

    fn store_failed(&mut self, op: &str, durable_key: &str, err: StoreError) {
        match err {
            StoreError::Unavailable(msg) => self.detach_durable(&msg),
            err => warn!("Durable {} of '{}' failed: {}", op, durable_key, err),
        }
    }

    /// Switches to memory-only for the rest of this cache's life.
    fn detach_durable(&mut self, reason: &str) {
        if self.durable.take().is_some() {
            warn!("Durable store unavailable ({}), continuing memory-only", reason);
        }
    }
}
