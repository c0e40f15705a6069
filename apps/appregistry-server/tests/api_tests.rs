//! Integration tests for the query API.
//!
//! Uses axum-test to exercise the router over a real (temporary) store
//! without binding a socket.

#![allow(clippy::unwrap_used, clippy::panic)]

use appregistry_core::{Bundle, Channel, PackageManifest, RegistryStore, SourceManifests};
use appregistry_server::api::{
    AppState, BundleRequest, BundleResponse, ErrorResponse, HealthResponse, PackageListResponse,
    PackageResponse, ReflectionResponse, create_router,
};
use axum_test::TestServer;
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn sample_manifests() -> SourceManifests {
    SourceManifests {
        packages: vec![PackageManifest {
            name: "etcd".to_string(),
            default_channel: "stable".to_string(),
            channels: vec![Channel {
                name: "stable".to_string(),
                current_csv: "etcd.v0.9.2".to_string(),
            }],
        }],
        bundles: vec![
            Bundle {
                csv_name: "etcd.v0.9.0".to_string(),
                package_name: "etcd".to_string(),
                channel_names: vec!["stable".to_string()],
                replaces: None,
                manifest: "{\"kind\":\"ClusterServiceVersion\"}".to_string(),
            },
            Bundle {
                csv_name: "etcd.v0.9.2".to_string(),
                package_name: "etcd".to_string(),
                channel_names: vec!["stable".to_string()],
                replaces: Some("etcd.v0.9.0".to_string()),
                manifest: "{\"kind\":\"ClusterServiceVersion\"}".to_string(),
            },
        ],
    }
}

/// Create a test server over a freshly created store. The tempdir must stay
/// alive for the duration of the test.
fn create_test_server() -> (TestServer, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store =
        RegistryStore::create(dir.path().join("bundles.db"), &sample_manifests()).unwrap();
    let router = create_router(AppState::new(Arc::new(store)));
    (TestServer::new(router).unwrap(), dir)
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (server, _dir) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// PACKAGE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn list_packages_returns_loaded_names() {
    let (server, _dir) = create_test_server();

    let response = server.get("/api/v1/packages").await;

    response.assert_status_ok();
    let list: PackageListResponse = response.json();
    assert_eq!(list.packages, vec!["etcd"]);
}

#[tokio::test]
async fn get_package_returns_channel_table() {
    let (server, _dir) = create_test_server();

    let response = server.get("/api/v1/packages/etcd").await;

    response.assert_status_ok();
    let package: PackageResponse = response.json();
    assert_eq!(package.name, "etcd");
    assert_eq!(package.default_channel, "stable");
    assert_eq!(package.channels.len(), 1);
    assert_eq!(package.channels[0].current_csv, "etcd.v0.9.2");
}

#[tokio::test]
async fn unknown_package_is_404() {
    let (server, _dir) = create_test_server();

    let response = server.get("/api/v1/packages/jaeger").await;

    response.assert_status_not_found();
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("jaeger"));
}

// =============================================================================
// BUNDLE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn channel_head_returns_current_csv() {
    let (server, _dir) = create_test_server();

    let response = server.get("/api/v1/packages/etcd/channels/stable/bundle").await;

    response.assert_status_ok();
    let bundle: BundleResponse = response.json();
    assert_eq!(bundle.csv_name, "etcd.v0.9.2");
    assert_eq!(bundle.replaces.as_deref(), Some("etcd.v0.9.0"));
}

#[tokio::test]
async fn channel_head_unknown_channel_is_404() {
    let (server, _dir) = create_test_server();

    let response = server.get("/api/v1/packages/etcd/channels/alpha/bundle").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn exact_bundle_lookup() {
    let (server, _dir) = create_test_server();

    let response = server
        .post("/api/v1/bundle")
        .json(&BundleRequest {
            package: "etcd".to_string(),
            channel: "stable".to_string(),
            csv: "etcd.v0.9.0".to_string(),
        })
        .await;

    response.assert_status_ok();
    let bundle: BundleResponse = response.json();
    assert_eq!(bundle.csv_name, "etcd.v0.9.0");
    assert_eq!(bundle.manifest, "{\"kind\":\"ClusterServiceVersion\"}");
}

#[tokio::test]
async fn bundle_outside_channel_is_404() {
    let (server, _dir) = create_test_server();

    let response = server
        .post("/api/v1/bundle")
        .json(&json!({
            "package": "etcd",
            "channel": "alpha",
            "csv": "etcd.v0.9.0"
        }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn replaces_lookup_walks_upgrade_graph() {
    let (server, _dir) = create_test_server();

    let response = server
        .post("/api/v1/bundle/replaces")
        .json(&BundleRequest {
            package: "etcd".to_string(),
            channel: "stable".to_string(),
            csv: "etcd.v0.9.0".to_string(),
        })
        .await;

    response.assert_status_ok();
    let bundle: BundleResponse = response.json();
    assert_eq!(bundle.csv_name, "etcd.v0.9.2");
}

#[tokio::test]
async fn nothing_replaces_channel_head() {
    let (server, _dir) = create_test_server();

    let response = server
        .post("/api/v1/bundle/replaces")
        .json(&BundleRequest {
            package: "etcd".to_string(),
            channel: "stable".to_string(),
            csv: "etcd.v0.9.2".to_string(),
        })
        .await;

    response.assert_status_not_found();
}

// =============================================================================
// REFLECTION ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn reflection_lists_registered_services() {
    let (server, _dir) = create_test_server();

    let response = server.get("/reflection").await;

    response.assert_status_ok();
    let reflection: ReflectionResponse = response.json();

    let names: Vec<&str> = reflection.services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Registry", "Health"]);

    let registry = &reflection.services[0];
    assert!(registry.methods.iter().any(|m| m.name == "GetBundleForChannel"));
}
