//! # Store Backends
//!
//! The bundle store behind the query API. redb gives us ACID writes for the
//! one-shot load and lock-free concurrent reads for the serve phase.

mod redb_store;

pub use redb_store::RegistryStore;
