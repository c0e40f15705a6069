//! HTTP fetcher tests against a local capture server.
//!
//! Tokens in the credentials context carry their own scheme ("basic ...",
//! "bearer ..."); the fetcher must hand them to the remote registry as the
//! Authorization header value verbatim, without re-wrapping them.

#![allow(clippy::unwrap_used, clippy::panic)]

use appregistry_server::loader::{HttpManifestFetcher, ManifestFetcher, RemoteEndpoint};
use axum::{Json, Router, extract::State, http::HeaderMap, routing::get};
use std::sync::{Arc, Mutex};

type CapturedAuth = Arc<Mutex<Option<String>>>;

async fn capture_handler(
    State(captured): State<CapturedAuth>,
    headers: HeaderMap,
) -> Json<Vec<serde_json::Value>> {
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *captured.lock().unwrap() = auth;
    Json(Vec::new())
}

/// Bind a throwaway registry that records the Authorization header of the
/// package listing request.
async fn spawn_capture_server() -> (String, CapturedAuth, tokio::task::JoinHandle<()>) {
    let captured: CapturedAuth = Arc::new(Mutex::new(None));
    let router = Router::new()
        .route("/api/v1/packages", get(capture_handler))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}"), captured, server)
}

#[tokio::test]
async fn authorization_header_is_sent_verbatim() {
    let (base_url, captured, server) = spawn_capture_server().await;

    let fetcher = HttpManifestFetcher::new().unwrap();
    let endpoint = RemoteEndpoint {
        base_url,
        namespace: "community".to_string(),
        token: Some("basic Zm9vOmJhcg==".to_string()),
    };

    let listed = fetcher.list_packages(&endpoint).await.unwrap();
    assert!(listed.is_empty());

    // The scheme is part of the stored token; no "Bearer " prefix on top.
    assert_eq!(
        captured.lock().unwrap().as_deref(),
        Some("basic Zm9vOmJhcg==")
    );

    server.abort();
}

#[tokio::test]
async fn anonymous_endpoint_sends_no_authorization_header() {
    let (base_url, captured, server) = spawn_capture_server().await;

    let fetcher = HttpManifestFetcher::new().unwrap();
    let endpoint = RemoteEndpoint {
        base_url,
        namespace: "community".to_string(),
        token: None,
    };

    fetcher.list_packages(&endpoint).await.unwrap();
    assert_eq!(*captured.lock().unwrap(), None);

    server.abort();
}
