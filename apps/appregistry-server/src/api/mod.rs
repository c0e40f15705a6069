//! # Query API Module
//!
//! The HTTP query service over the loaded store, using axum.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/packages` - list package names
//! - `GET /api/v1/packages/{name}` - one package's channel table
//! - `GET /api/v1/packages/{name}/channels/{channel}/bundle` - channel head
//! - `POST /api/v1/bundle` - exact bundle lookup
//! - `POST /api/v1/bundle/replaces` - upgrade-graph lookup
//! - `GET /health` - liveness check, no external dependency
//! - `GET /reflection` - service/method introspection
//!
//! The store is read-only once loaded, so handlers share it through a plain
//! `Arc` with no lock.

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `appregistry_server::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    bundle_that_replaces_handler, channel_head_handler, get_bundle_handler, get_package_handler,
    health_handler, list_packages_handler, reflection_handler,
};
#[allow(unused_imports)]
pub use types::{
    BundleRequest, BundleResponse, ChannelJson, ErrorResponse, HealthResponse, MethodJson,
    PackageListResponse, PackageResponse, ReflectionResponse, ServiceJson,
};

use appregistry_core::{RegistryError, RegistryStore};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the store handle, read-only after load.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RegistryStore>,
}

impl AppState {
    /// Create new app state around a loaded store.
    #[must_use]
    pub fn new(store: Arc<RegistryStore>) -> Self {
        Self { store }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Registration order is registry service, then health, then reflection;
/// routes are independent handler tables, so the order has no observable
/// effect.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/packages", get(handlers::list_packages_handler))
        .route("/api/v1/packages/{name}", get(handlers::get_package_handler))
        .route(
            "/api/v1/packages/{name}/channels/{channel}/bundle",
            get(handlers::channel_head_handler),
        )
        .route("/api/v1/bundle", post(handlers::get_bundle_handler))
        .route(
            "/api/v1/bundle/replaces",
            post(handlers::bundle_that_replaces_handler),
        )
        .route("/health", get(handlers::health_handler))
        .route("/reflection", get(handlers::reflection_handler))
        .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve the query API on an already-bound listener until a fatal transport
/// error or an external shutdown signal.
///
/// The listener is bound by the process driver, strictly after the load has
/// succeeded; by the time this runs the store is complete and immutable.
pub async fn serve(
    listener: tokio::net::TcpListener,
    store: Arc<RegistryStore>,
) -> Result<(), RegistryError> {
    serve_with_shutdown(listener, store, shutdown_signal()).await
}

/// `serve` with an explicit shutdown future, so the serving state is
/// reachable in tests without blocking on a signal.
pub async fn serve_with_shutdown(
    listener: tokio::net::TcpListener,
    store: Arc<RegistryStore>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), RegistryError> {
    let router = create_router(AppState::new(store));

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "serving registry");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RegistryError::IoError(format!("Server error: {e}")))
}

/// Resolves when the process receives an interrupt.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::error!("failed to listen for shutdown signal: {e}"),
    }
}
