//! # API Request/Response Types
//!
//! The JSON structures of the query service.

use appregistry_core::{Bundle, Channel, PackageManifest};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response. The service has no external dependency: if the
/// process answers, it is serving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// PACKAGE RESPONSES
// =============================================================================

/// Package listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageListResponse {
    pub packages: Vec<String>,
}

/// One channel of a package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelJson {
    pub name: String,
    pub current_csv: String,
}

impl From<Channel> for ChannelJson {
    fn from(channel: Channel) -> Self {
        Self {
            name: channel.name,
            current_csv: channel.current_csv,
        }
    }
}

/// Package detail response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageResponse {
    pub name: String,
    pub default_channel: String,
    pub channels: Vec<ChannelJson>,
}

impl From<PackageManifest> for PackageResponse {
    fn from(package: PackageManifest) -> Self {
        Self {
            name: package.name,
            default_channel: package.default_channel,
            channels: package.channels.into_iter().map(ChannelJson::from).collect(),
        }
    }
}

// =============================================================================
// BUNDLE REQUEST/RESPONSE
// =============================================================================

/// Request body for the bundle lookup endpoints. `csv` names the bundle for
/// an exact lookup, or the bundle being replaced for the replaces endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleRequest {
    pub package: String,
    pub channel: String,
    pub csv: String,
}

/// Bundle response, carrying the raw manifest blob verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleResponse {
    pub csv_name: String,
    pub package_name: String,
    pub channel_names: Vec<String>,
    pub replaces: Option<String>,
    pub manifest: String,
}

impl From<Bundle> for BundleResponse {
    fn from(bundle: Bundle) -> Self {
        Self {
            csv_name: bundle.csv_name,
            package_name: bundle.package_name,
            channel_names: bundle.channel_names,
            replaces: bundle.replaces,
            manifest: bundle.manifest,
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Uniform error body for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

// =============================================================================
// REFLECTION RESPONSE
// =============================================================================

/// One method of a registered service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodJson {
    pub name: String,
    pub http_method: String,
    pub path: String,
}

/// One registered service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceJson {
    pub name: String,
    pub methods: Vec<MethodJson>,
}

/// Introspection response: every service and method this server exposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionResponse {
    pub services: Vec<ServiceJson>,
}
