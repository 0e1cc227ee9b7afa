//! Read-through fetch decorator.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use super::{FetchRequest, Transport};
use crate::cache::SharedCache;
use crate::error::FetchError;

// == Cached Fetcher ==
/// Wraps a [`Transport`] so repeated GETs within the TTL are answered from
/// the cache.
///
/// The cache lock is never held across the network call.
#[derive(Debug, Clone)]
pub struct CachedFetcher<T> {
    cache: SharedCache,
    transport: T,
    ttl: Option<Duration>,
}

impl<T: Transport> CachedFetcher<T> {
    /// Creates a fetcher storing responses with the cache's default TTL.
    pub fn new(cache: SharedCache, transport: T) -> Self {
        Self {
            cache,
            transport,
            ttl: None,
        }
    }

    /// Stores responses with `ttl` instead of the cache default.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // == Fetch ==
    /// Performs `request`, consulting the cache first for GETs.
    ///
    /// Transport failures are returned unchanged and nothing is cached for
    /// them.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Value, FetchError> {
        if !request.is_cacheable() {
            debug!("Bypassing cache for {} {}", request.method, request.url);
            return self.transport.send(request).await;
        }

        let key = request.cache_key();
        let cached = self.cache.write().await.get(&key).into_value();
        if let Some(value) = cached {
            debug!("Cache hit for {}", key);
            return Ok(value);
        }

        debug!("Cache miss for {}", key);
        let value = self.transport.send(request).await?;
        self.cache.write().await.set(&key, value.clone(), self.ttl);
        Ok(value)
    }

    /// Drops the cached response for `request`, e.g. after a write to the
    /// same resource.
    pub async fn invalidate(&self, request: &FetchRequest) {
        self.cache.write().await.remove(&request.cache_key());
    }
}
