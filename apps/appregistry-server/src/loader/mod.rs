//! # Loader Invocation
//!
//! One-shot load of the resolved sources into the bundle store.
//!
//! The loader is constructed from an optional credentials context and then
//! invoked exactly once per process. The contract is all-or-nothing: every
//! specifier must resolve, every fetch must succeed, and every payload must
//! validate before a store is created. A failure at any point returns an
//! error with no database left at the target path.

mod fetch;

pub use fetch::{HttpManifestFetcher, ManifestFetcher, RemoteEndpoint, RemotePackage};

use appregistry_core::{
    LegacySource, PackageFilter, RegistryError, RegistryStore, RemoteSource, ResolvedSources,
    SourceManifests,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

// =============================================================================
// CREDENTIALS CONTEXT
// =============================================================================

/// A source object definition in the credentials context, mirroring what a
/// legacy `{namespace}/{name}` specifier refers to.
#[derive(Debug, Clone, Deserialize)]
struct SourceObject {
    endpoint: String,
    namespace: String,
    token: Option<String>,
}

/// The credentials context named by the `--kubeconfig` flag: a TOML file with
/// a `[sources]` table of legacy source objects and a `[secrets]` table of
/// tokens for modern secret references. Tokens carry their own scheme and are
/// sent as the Authorization header value verbatim.
///
/// ```toml
/// [sources."marketplace/community"]
/// endpoint = "https://example.com/cnr"
/// namespace = "community-operators"
/// token = "basic Zm9vOmJhcg=="
///
/// [secrets]
/// "marketplace/quay-token" = "basic Zm9vOmJhcg=="
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialContext {
    #[serde(default)]
    sources: BTreeMap<String, SourceObject>,
    #[serde(default)]
    secrets: BTreeMap<String, String>,
}

impl CredentialContext {
    /// Parse the context from a file. Unreadable or malformed content is a
    /// credential error, fatal to the bootstrap.
    pub fn from_file(path: &str) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::CredentialError(format!("cannot read '{path}': {e}"))
        })?;
        toml::from_str(&raw)
            .map_err(|e| RegistryError::CredentialError(format!("cannot parse '{path}': {e}")))
    }

    /// Resolve a legacy source object reference to a fetch endpoint.
    fn resolve_legacy(&self, source: &LegacySource) -> Result<RemoteEndpoint, RegistryError> {
        let key = source.key();
        let object = self.sources.get(&key).ok_or_else(|| {
            RegistryError::CredentialError(format!("unknown source object '{key}'"))
        })?;
        Ok(RemoteEndpoint {
            base_url: object.endpoint.clone(),
            namespace: object.namespace.clone(),
            token: object.token.clone(),
        })
    }

    /// Resolve a modern secret reference to its token.
    fn resolve_secret(&self, secret_ref: &str) -> Result<String, RegistryError> {
        self.secrets.get(secret_ref).cloned().ok_or_else(|| {
            RegistryError::CredentialError(format!("unknown secret reference '{secret_ref}'"))
        })
    }
}

// =============================================================================
// LOADER
// =============================================================================

/// The one-shot manifest loader.
#[derive(Debug)]
pub struct RegistryLoader {
    context: CredentialContext,
}

impl RegistryLoader {
    /// Construct the loader, parsing the credentials context if one was
    /// configured. An empty path means anonymous access: legacy specifiers
    /// and secret references will then fail to resolve.
    pub fn new(kubeconfig: &str) -> Result<Self, RegistryError> {
        let context = if kubeconfig.is_empty() {
            CredentialContext::default()
        } else {
            CredentialContext::from_file(kubeconfig)?
        };
        Ok(Self { context })
    }

    /// Resolve every specifier to a fetch endpoint, before any I/O.
    ///
    /// Specifier syntax is validated here, not in `ResolvedSources::resolve`.
    pub fn resolve_endpoints(
        &self,
        sources: &ResolvedSources,
    ) -> Result<Vec<RemoteEndpoint>, RegistryError> {
        match sources {
            ResolvedSources::Legacy(specs) => specs
                .iter()
                .map(|spec| {
                    let source = LegacySource::parse(spec)?;
                    self.context.resolve_legacy(&source)
                })
                .collect(),
            ResolvedSources::Remote(specs) => specs
                .iter()
                .map(|spec| {
                    let source = RemoteSource::parse(spec)?;
                    let token = source
                        .secret
                        .as_deref()
                        .map(|secret_ref| self.context.resolve_secret(secret_ref))
                        .transpose()?;
                    Ok(RemoteEndpoint {
                        base_url: source.base_url,
                        namespace: source.namespace,
                        token,
                    })
                })
                .collect(),
        }
    }

    /// Fetch every source's manifests and materialize them into a database at
    /// `db_path`, returning the store handle.
    ///
    /// All payloads are fetched and validated in memory first; the database
    /// is only created once the whole load has succeeded, so a partial result
    /// is never exposed. An empty specifier set is pinned to produce an empty
    /// store without fetching anything.
    pub async fn load(
        &self,
        fetcher: &dyn ManifestFetcher,
        db_path: &Path,
        sources: &ResolvedSources,
        packages: &str,
    ) -> Result<RegistryStore, RegistryError> {
        let filter = PackageFilter::parse(packages);

        if sources.is_empty() {
            tracing::warn!("no sources configured; serving an empty registry");
            return RegistryStore::create(db_path, &SourceManifests::default());
        }

        let endpoints = self.resolve_endpoints(sources)?;

        let mut combined = SourceManifests::default();
        for endpoint in &endpoints {
            let listed = fetcher.list_packages(endpoint).await?;
            let mut fetched = 0usize;
            for package in &listed {
                if !filter.allows(&package.name) {
                    continue;
                }
                let raw = fetcher.fetch_manifest(endpoint, package).await?;
                let mut manifests = SourceManifests::from_json(&raw)?;
                manifests.retain_packages(&filter);
                manifests.validate()?;
                combined.merge(manifests)?;
                fetched += 1;
            }
            tracing::info!(
                namespace = %endpoint.namespace,
                listed = listed.len(),
                fetched,
                "source downloaded"
            );
        }

        if combined.is_empty() {
            tracing::warn!("sources produced no packages after filtering");
        }

        RegistryStore::create(db_path, &combined)
    }
}
