//! Tiered Cache - HTTP host for a two-tier key-value cache
//!
//! Boots a cache over an optional file-backed durable tier, sweeps it in the
//! background and exposes it over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiered_cache::api::create_router;
use tiered_cache::storage::{DurableStore, FileStore};
use tiered_cache::{spawn_sweep_task, AppState, Cache, Config};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the durable store, falling back to memory-only
/// 4. Create the cache and start the background sweep task
/// 5. Serve HTTP until SIGINT/SIGTERM
/// 6. Cancel the sweep and dispose the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tiered_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tiered cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: default_ttl={}s, sweep_interval={}s, namespace={}, storage={:?}, port={}",
        config.default_ttl,
        config.sweep_interval,
        config.namespace,
        config.storage_path,
        config.server_port
    );

    let cache = Cache::create(config.cache_config(), open_durable_store(&config)).into_shared();
    let sweeper = spawn_sweep_task(cache.clone(), config.sweep_interval());

    let app = create_router(AppState::from_shared(cache.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.shutdown().await;

    match Arc::try_unwrap(cache) {
        Ok(lock) => lock.into_inner().dispose(),
        Err(_) => warn!("Cache still referenced at shutdown, skipping dispose"),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Opens the configured durable store, or `None` to run memory-only.
fn open_durable_store(config: &Config) -> Option<Box<dyn DurableStore>> {
    let path = config.storage_path.as_ref()?;
    match FileStore::open(path, config.storage_quota) {
        Ok(store) => {
            info!("Durable store opened at {}", path.display());
            Some(Box::new(store))
        }
        Err(err) => {
            warn!(
                "Could not open durable store at {} ({}), running memory-only",
                path.display(),
                err
            );
            None
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
