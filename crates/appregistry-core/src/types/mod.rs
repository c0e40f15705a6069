//! # Core Type Definitions
//!
//! Error taxonomy shared by the whole workspace.
//!
//! The server is a fail-fast bootstrap: every error below is propagated up the
//! call chain with `?` and handled exactly once, by the process driver. No
//! component other than `main` terminates the process.

use thiserror::Error;

// =============================================================================
// ERRORS
// =============================================================================

/// Error type for all registry operations.
///
/// Grouped by bootstrap stage:
/// - specifier/manifest errors surface from the loader's parsing path
/// - credential/fetch errors surface from loader construction and `load`
/// - lookup errors surface from store queries at serve time
/// - serialization/io errors can surface from either
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A source specifier does not match the expected syntax for its mode.
    #[error("Invalid source specifier '{0}'")]
    InvalidSpecifier(String),

    /// A fetched manifest payload failed structural validation.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// The credentials context is missing or malformed.
    #[error("Credential error: {0}")]
    CredentialError(String),

    /// A remote fetch failed. The whole load aborts; there is no retry.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// The requested package is not in the store.
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// The requested channel is not declared by the package.
    #[error("Channel '{channel}' not found in package '{package}'")]
    ChannelNotFound { package: String, channel: String },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}
