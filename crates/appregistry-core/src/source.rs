//! # Source Specifier Resolution
//!
//! Two flag styles compete for the same job:
//!
//! - legacy `--sources`: `{namespace}/{name}` references to source objects,
//!   resolved through the credentials context at load time
//! - modern `--registry`: pipe-delimited `{base-url}|{namespace}|{secret-ref}`
//!   connection descriptors
//!
//! A non-empty legacy list wins unconditionally, even when the modern list was
//! also supplied. Existing deployments still pass `--sources`, so the
//! precedence must not change.
//!
//! Resolution is a pure function over already-parsed flag values. Individual
//! specifier syntax is NOT validated here; that is deferred to the loader,
//! which owns the parsers below.

use crate::types::RegistryError;

// =============================================================================
// RESOLVED SOURCES
// =============================================================================

/// The outcome of source resolution: one homogeneous list of specifiers,
/// tagged with the addressing mode the loader must use to interpret them.
///
/// Modeled as a sum type so an inconsistent state (legacy mode paired with a
/// modern list) cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSources {
    /// Legacy `{namespace}/{name}` object references.
    Legacy(Vec<String>),
    /// Modern `{base-url}|{namespace}|{secret-ref}` descriptors.
    Remote(Vec<String>),
}

impl ResolvedSources {
    /// Resolve the two competing flag lists into one specifier set.
    ///
    /// A non-empty legacy list takes precedence; otherwise the modern list is
    /// returned verbatim, even if empty. Pure: no validation, no side effects.
    #[must_use]
    pub fn resolve(legacy: &[String], remote: &[String]) -> Self {
        if !legacy.is_empty() {
            Self::Legacy(legacy.to_vec())
        } else {
            Self::Remote(remote.to_vec())
        }
    }

    /// The specifier list, in the order the flags supplied it.
    #[must_use]
    pub fn specifiers(&self) -> &[String] {
        match self {
            Self::Legacy(s) | Self::Remote(s) => s,
        }
    }

    /// True when the loader must use the legacy object-reference parser.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    /// True when no source was configured at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specifiers().is_empty()
    }
}

// =============================================================================
// LEGACY SPECIFIER
// =============================================================================

/// A parsed legacy specifier: `{namespace}/{name}` naming a source object in
/// the credentials context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySource {
    pub namespace: String,
    pub name: String,
}

impl LegacySource {
    /// Parse a `{namespace}/{name}` specifier.
    ///
    /// Exactly two non-empty segments; anything else is rejected.
    pub fn parse(spec: &str) -> Result<Self, RegistryError> {
        let (namespace, name) = spec
            .split_once('/')
            .ok_or_else(|| RegistryError::InvalidSpecifier(spec.to_string()))?;
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            return Err(RegistryError::InvalidSpecifier(spec.to_string()));
        }
        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }

    /// The `{namespace}/{name}` key used to look this source up in the
    /// credentials context.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

// =============================================================================
// REMOTE SPECIFIER
// =============================================================================

/// A parsed modern specifier: `{base-url}|{namespace}|{secret-ref}`.
///
/// The secret reference is optional; without it the source is fetched
/// anonymously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    pub base_url: String,
    pub namespace: String,
    pub secret: Option<String>,
}

impl RemoteSource {
    /// Parse a pipe-delimited descriptor with two or three fields.
    pub fn parse(spec: &str) -> Result<Self, RegistryError> {
        let parts: Vec<&str> = spec.split('|').collect();
        let (base_url, namespace, secret) = match parts.as_slice() {
            [base, ns] => (*base, *ns, None),
            [base, ns, secret] => (*base, *ns, Some((*secret).to_string())),
            _ => return Err(RegistryError::InvalidSpecifier(spec.to_string())),
        };
        if base_url.is_empty()
            || namespace.is_empty()
            || secret.as_deref().is_some_and(str::is_empty)
        {
            return Err(RegistryError::InvalidSpecifier(spec.to_string()));
        }
        Ok(Self {
            base_url: base_url.to_string(),
            namespace: namespace.to_string(),
            secret,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
