//! In-process durable store.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{entry_size, DurableStore};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
    used: usize,
    unavailable: bool,
}

// == Memory Store ==
/// Map-backed store; every clone is a handle to the same origin.
///
/// Tests keep a clone to inspect or tamper with what the cache wrote, the way
/// a page would poke at local storage directly.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::new();
        store.lock().quota = Some(bytes);
        store
    }

    /// Creates a store that fails every call with `Unavailable`.
    pub fn unavailable() -> Self {
        let store = Self::new();
        store.lock().unavailable = true;
        store
    }

    /// Bytes currently stored across all keys.
    pub fn used_bytes(&self) -> usize {
        self.lock().used
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(inner: &Inner) -> StoreResult<()> {
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let inner = self.lock();
        Self::check(&inner)?;
        Ok(inner.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        Self::check(&inner)?;

        let replaced = inner
            .entries
            .get(key)
            .map(|old| entry_size(key, old))
            .unwrap_or(0);
        let needed = entry_size(key, value);
        let base = inner.used - replaced;

        if let Some(quota) = inner.quota {
            if base + needed > quota {
                return Err(StoreError::QuotaExceeded {
                    needed,
                    available: quota.saturating_sub(base),
                });
            }
        }

        inner.entries.insert(key.to_string(), value.to_string());
        inner.used = base + needed;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        Self::check(&inner)?;
        if let Some(old) = inner.entries.remove(key) {
            inner.used -= entry_size(key, &old);
        }
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let inner = self.lock();
        Self::check(&inner)?;
        Ok(inner.entries.keys().cloned().collect())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
