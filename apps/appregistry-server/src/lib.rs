//! # appregistry-server library surface
//!
//! The binary is a thin wrapper around these modules; they are exposed as a
//! library so integration tests can drive the bootstrap sequence without a
//! process boundary.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod loader;
