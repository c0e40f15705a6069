//! # Manifest Fetching
//!
//! The network seam of the loader. `ManifestFetcher` is a trait so the load
//! path can be exercised in tests without a remote registry; the production
//! implementation is a thin reqwest client speaking the registry's HTTP API.
//!
//! There is deliberately no retry or timeout policy here: a failed fetch
//! fails the whole bootstrap.

use appregistry_core::RegistryError;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;

// =============================================================================
// ENDPOINTS
// =============================================================================

/// A fully resolved fetch target: base URL, registry namespace, and the
/// Authorization header value to present, if any.
///
/// The token is sent verbatim - it carries its own scheme (`basic ...`,
/// `bearer ...`), exactly as stored in the credentials context.
///
/// Both specifier styles resolve to this shape before any fetch happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEndpoint {
    pub base_url: String,
    pub namespace: String,
    pub token: Option<String>,
}

/// One package release advertised by a source listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePackage {
    pub name: String,
    pub release: String,
}

// =============================================================================
// FETCHER TRAIT
// =============================================================================

/// The loader's view of a remote registry.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// List the packages a source namespace advertises.
    async fn list_packages(
        &self,
        endpoint: &RemoteEndpoint,
    ) -> Result<Vec<RemotePackage>, RegistryError>;

    /// Fetch the manifest payload for one package release.
    async fn fetch_manifest(
        &self,
        endpoint: &RemoteEndpoint,
        package: &RemotePackage,
    ) -> Result<Vec<u8>, RegistryError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

/// Wire shape of one entry in the package listing.
#[derive(Debug, Deserialize)]
struct ListedPackage {
    name: String,
    #[serde(rename = "default")]
    release: String,
}

/// Wire shape of a manifest payload: the content is base64-encoded.
#[derive(Debug, Deserialize)]
struct ManifestPayload {
    content: ManifestContent,
}

#[derive(Debug, Deserialize)]
struct ManifestContent {
    base64: String,
}

/// reqwest-based fetcher.
pub struct HttpManifestFetcher {
    client: reqwest::Client,
}

impl HttpManifestFetcher {
    /// Build the shared HTTP client.
    pub fn new() -> Result<Self, RegistryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("appregistry-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::FetchError(e.to_string()))?;
        Ok(Self { client })
    }

    fn get(&self, endpoint: &RemoteEndpoint, url: String) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &endpoint.token {
            // The token carries its own scheme; send it verbatim.
            Some(token) => request.header(reqwest::header::AUTHORIZATION, token.as_str()),
            None => request,
        }
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn list_packages(
        &self,
        endpoint: &RemoteEndpoint,
    ) -> Result<Vec<RemotePackage>, RegistryError> {
        let url = format!(
            "{}/api/v1/packages?namespace={}",
            endpoint.base_url, endpoint.namespace
        );
        tracing::debug!(%url, "listing packages");

        let listed: Vec<ListedPackage> = self
            .get(endpoint, url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RegistryError::FetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| RegistryError::FetchError(e.to_string()))?;

        // Listings qualify package names with the namespace; strip it so the
        // filter and the store see bare package names.
        let prefix = format!("{}/", endpoint.namespace);
        Ok(listed
            .into_iter()
            .map(|p| RemotePackage {
                name: p
                    .name
                    .strip_prefix(&prefix)
                    .unwrap_or(p.name.as_str())
                    .to_string(),
                release: p.release,
            })
            .collect())
    }

    async fn fetch_manifest(
        &self,
        endpoint: &RemoteEndpoint,
        package: &RemotePackage,
    ) -> Result<Vec<u8>, RegistryError> {
        let url = format!(
            "{}/api/v1/packages/{}/{}/{}",
            endpoint.base_url, endpoint.namespace, package.name, package.release
        );
        tracing::debug!(%url, "fetching manifest");

        let payload: ManifestPayload = self
            .get(endpoint, url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RegistryError::FetchError(e.to_string()))?
            .json()
            .await
            .map_err(|e| RegistryError::FetchError(e.to_string()))?;

        BASE64
            .decode(payload.content.base64.as_bytes())
            .map_err(|e| RegistryError::FetchError(format!("invalid manifest encoding: {e}")))
    }
}
