//! # appregistry-core
//!
//! The pure registry model for appregistry - THE LOGIC.
//!
//! This crate contains everything the server binary needs that does not touch
//! the network:
//! - Source specifier resolution (legacy vs. modern flag precedence)
//! - The manifest data model and its structural validation
//! - The redb-backed bundle store
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (pure Rust)
//! - Source resolution is a pure function: no I/O, no side effects
//! - The store is populated exactly once, in a single transaction, and is
//!   read-only for the rest of the process lifetime

// =============================================================================
// MODULES
// =============================================================================

pub mod manifest;
pub mod source;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use manifest::{Bundle, Channel, PackageFilter, PackageManifest, SourceManifests};
pub use source::{LegacySource, RemoteSource, ResolvedSources};
pub use store::RegistryStore;
pub use types::RegistryError;
