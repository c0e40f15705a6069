//! # API Endpoint Handlers
//!
//! Every handler only reads the store; there is no mutation path after the
//! one-shot load, so no locking is needed around `AppState`.

use super::{
    AppState,
    types::{
        BundleRequest, BundleResponse, ErrorResponse, HealthResponse, MethodJson,
        PackageListResponse, PackageResponse, ReflectionResponse, ServiceJson,
    },
};
use appregistry_core::RegistryError;
use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};

/// Map a store error to a response status.
///
/// Lookup misses are client errors; everything else means the store itself is
/// unhealthy, which should not happen after a successful load.
fn error_response(err: &RegistryError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        RegistryError::PackageNotFound(_) | RegistryError::ChannelNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(err.to_string())))
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// PACKAGE HANDLERS
// =============================================================================

/// List all package names.
pub async fn list_packages_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_packages() {
        Ok(packages) => {
            (StatusCode::OK, Json(PackageListResponse { packages })).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// Get one package's channel table.
pub async fn get_package_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.store.get_package(&name) {
        Ok(Some(package)) => (StatusCode::OK, Json(PackageResponse::from(package))).into_response(),
        Ok(None) => error_response(&RegistryError::PackageNotFound(name)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

// =============================================================================
// BUNDLE HANDLERS
// =============================================================================

/// Get the bundle at the head of a channel.
pub async fn channel_head_handler(
    State(state): State<AppState>,
    Path((name, channel)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.store.get_bundle_for_channel(&name, &channel) {
        Ok(bundle) => (StatusCode::OK, Json(BundleResponse::from(bundle))).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Exact bundle lookup by package, channel, and csv name.
pub async fn get_bundle_handler(
    State(state): State<AppState>,
    Json(request): Json<BundleRequest>,
) -> impl IntoResponse {
    match state
        .store
        .get_bundle(&request.package, &request.channel, &request.csv)
    {
        Ok(Some(bundle)) => (StatusCode::OK, Json(BundleResponse::from(bundle))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "no bundle '{}' in channel '{}' of package '{}'",
                request.csv, request.channel, request.package
            ))),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Find the bundle in a channel that replaces the given csv.
pub async fn bundle_that_replaces_handler(
    State(state): State<AppState>,
    Json(request): Json<BundleRequest>,
) -> impl IntoResponse {
    match state
        .store
        .get_bundle_that_replaces(&request.package, &request.channel, &request.csv)
    {
        Ok(Some(bundle)) => (StatusCode::OK, Json(BundleResponse::from(bundle))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "nothing replaces '{}' in channel '{}' of package '{}'",
                request.csv, request.channel, request.package
            ))),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

// =============================================================================
// REFLECTION HANDLER
// =============================================================================

/// Introspection: list the registered services and their methods.
pub async fn reflection_handler() -> impl IntoResponse {
    let method = |name: &str, http_method: &str, path: &str| MethodJson {
        name: name.to_string(),
        http_method: http_method.to_string(),
        path: path.to_string(),
    };

    Json(ReflectionResponse {
        services: vec![
            ServiceJson {
                name: "Registry".to_string(),
                methods: vec![
                    method("ListPackages", "GET", "/api/v1/packages"),
                    method("GetPackage", "GET", "/api/v1/packages/{name}"),
                    method(
                        "GetBundleForChannel",
                        "GET",
                        "/api/v1/packages/{name}/channels/{channel}/bundle",
                    ),
                    method("GetBundle", "POST", "/api/v1/bundle"),
                    method("GetBundleThatReplaces", "POST", "/api/v1/bundle/replaces"),
                ],
            },
            ServiceJson {
                name: "Health".to_string(),
                methods: vec![method("Check", "GET", "/health")],
            },
        ],
    })
}
