//! Integration Tests for the cached fetch wrapper
//!
//! Runs `HttpTransport` against a local axum server that counts requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tiered_cache::error::FetchError;
use tiered_cache::fetch::{CachedFetcher, FetchRequest, HttpTransport};
use tiered_cache::storage::MemoryStore;
use tiered_cache::{Cache, CacheConfig, SharedCache};

// == Helper Functions ==

#[derive(Clone, Default)]
struct Upstream {
    hits: Arc<AtomicUsize>,
}

async fn list_contacts(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let n = upstream.hits.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({"call": n, "page": params.get("page")}))
}

async fn create_contact(State(upstream): State<Upstream>, Json(body): Json<Value>) -> Json<Value> {
    let n = upstream.hits.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({"call": n, "created": body}))
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({"late": true}))
}

/// Starts the upstream on an ephemeral port and returns its base URL.
async fn spawn_upstream() -> (String, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/broken", get(broken))
        .route("/slow", get(slow))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), upstream)
}

fn shared_cache() -> SharedCache {
    Cache::create(CacheConfig::default(), Some(Box::new(MemoryStore::new()))).into_shared()
}

// == Fetch Tests ==

#[tokio::test]
async fn test_get_is_fetched_once() {
    let (base, upstream) = spawn_upstream().await;
    let fetcher = CachedFetcher::new(shared_cache(), HttpTransport::new());
    let request = FetchRequest::get(format!("{}/contacts", base)).with_param("page", "1");

    let first = fetcher.fetch(&request).await.unwrap();
    let second = fetcher.fetch(&request).await.unwrap();

    assert_eq!(first, json!({"call": 1, "page": "1"}));
    assert_eq!(second, first);
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_different_params_are_fetched_separately() {
    let (base, upstream) = spawn_upstream().await;
    let fetcher = CachedFetcher::new(shared_cache(), HttpTransport::new());
    let url = format!("{}/contacts", base);

    let page1 = fetcher
        .fetch(&FetchRequest::get(url.clone()).with_param("page", "1"))
        .await
        .unwrap();
    let page2 = fetcher
        .fetch(&FetchRequest::get(url).with_param("page", "2"))
        .await
        .unwrap();

    assert_eq!(page1["page"], json!("1"));
    assert_eq!(page2["page"], json!("2"));
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_post_is_never_cached() {
    let (base, upstream) = spawn_upstream().await;
    let cache = shared_cache();
    let fetcher = CachedFetcher::new(cache.clone(), HttpTransport::new());
    let request = FetchRequest::post(format!("{}/contacts", base), json!({"name": "Ada"}));

    let first = fetcher.fetch(&request).await.unwrap();
    let second = fetcher.fetch(&request).await.unwrap();

    assert_eq!(first["created"], json!({"name": "Ada"}));
    assert_eq!(second["call"], json!(2));
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 2);
    assert_eq!(cache.read().await.memory_len(), 0);
}

#[tokio::test]
async fn test_error_status_is_returned_and_not_cached() {
    let (base, _upstream) = spawn_upstream().await;
    let cache = shared_cache();
    let fetcher = CachedFetcher::new(cache.clone(), HttpTransport::new());

    let result = fetcher
        .fetch(&FetchRequest::get(format!("{}/broken", base)))
        .await;

    assert!(matches!(result, Err(FetchError::Status { status: 500, .. })));
    assert_eq!(cache.read().await.memory_len(), 0);
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let (base, upstream) = spawn_upstream().await;
    let fetcher = CachedFetcher::new(shared_cache(), HttpTransport::new());
    let request = FetchRequest::get(format!("{}/contacts", base));

    fetcher.fetch(&request).await.unwrap();
    fetcher.invalidate(&request).await;
    let refreshed = fetcher.fetch(&request).await.unwrap();

    assert_eq!(refreshed["call"], json!(2));
    assert_eq!(upstream.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Bind then drop so nothing listens on the port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = CachedFetcher::new(shared_cache(), HttpTransport::new());
    let result = fetcher
        .fetch(&FetchRequest::get(format!("http://{}/contacts", addr)))
        .await;

    assert!(matches!(result, Err(FetchError::Transport(_))));
}

#[tokio::test]
async fn test_client_timeout_is_transport_error() {
    let (base, _upstream) = spawn_upstream().await;
    let cache = shared_cache();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let fetcher = CachedFetcher::new(cache.clone(), HttpTransport::with_client(client));

    let result = fetcher
        .fetch(&FetchRequest::get(format!("{}/slow", base)))
        .await;

    assert!(matches!(result, Err(FetchError::Transport(_))));
    assert_eq!(cache.read().await.memory_len(), 0);
}
