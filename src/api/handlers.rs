//! API Handlers
//!
//! HTTP request handlers for each cache endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{Cache, Lookup, SharedCache, SweepReport};
use crate::error::{ApiError, Result};
use crate::models::{
    validate_key, ClearResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest,
    SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The cache, shared with the sweep task
    pub cache: SharedCache,
}

impl AppState {
    /// Wraps a cache for the handlers.
    pub fn new(cache: Cache) -> Self {
        Self {
            cache: cache.into_shared(),
        }
    }

    /// Uses an already shared cache.
    pub fn from_shared(cache: SharedCache) -> Self {
        Self { cache }
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value. Succeeds even when the durable tier refuses the
/// write; the response says so.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl();
    let outcome = state.cache.write().await.set(&req.key, req.value, ttl);

    Ok(Json(SetResponse::new(req.key, outcome)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    // Write lock: lookups may evict and warm the memory tier
    let lookup = state.cache.write().await.get(&key);

    match lookup {
        Lookup::Hit { value, tier } => Ok(Json(GetResponse::new(key, value, tier))),
        Lookup::Miss(_) => Err(ApiError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Idempotent: removing an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    state.cache.write().await.remove(&key);
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.cache.write().await.clear();
    Json(ClearResponse { removed })
}

/// Handler for POST /sweep
pub async fn sweep_handler(State(state): State<AppState>) -> Json<SweepReport> {
    Json(state.cache.write().await.sweep())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.read().await.stats();
    Json(StatsResponse::from(stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn test_state() -> AppState {
        AppState::new(Cache::create(
            CacheConfig::default(),
            Some(Box::new(MemoryStore::new())),
        ))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: json!({"status": "open"}),
            ttl: None,
        };
        let response = set_handler(State(state.clone()), Json(req)).await.unwrap();
        assert!(response.durable);

        let response = get_handler(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!({"status": "open"}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let result = get_handler(State(test_state()), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let state = test_state();

        let req = SetRequest {
            key: "to_delete".to_string(),
            value: json!(1),
            ttl: None,
        };
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        for _ in 0..2 {
            let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
            assert!(result.is_ok());
        }

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_clear_handler() {
        let state = test_state();
        for key in ["a", "b", "c"] {
            state.cache.write().await.set(key, json!(key), None);
        }

        assert_eq!(clear_handler(State(state.clone())).await.removed, 3);
        assert_eq!(clear_handler(State(state)).await.removed, 0);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let response = stats_handler(State(test_state())).await;
        assert_eq!(response.stats.hits, 0);
        assert_eq!(response.stats.misses, 0);
        assert!(response.stats.persistent_available);
    }

    #[test]
    fn test_health_handler() {
        let response = tokio_test::block_on(health_handler());
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let req = SetRequest {
            key: "".to_string(),
            value: json!("value"),
            ttl: None,
        };
        let result = set_handler(State(test_state()), Json(req)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
