//! # CLI Flags
//!
//! Single command, no subcommands. Two flag styles configure the sources:
//! the legacy `--sources` object references and the modern `--registry`
//! descriptors; precedence between them is decided by
//! `ResolvedSources::resolve`, not here.

use clap::Parser;
use std::path::PathBuf;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// appregistry-server downloads manifest(s) from remote application
/// registries, builds a local database containing these downloaded
/// manifest(s), and serves a query API over it.
#[derive(Parser, Debug)]
#[command(name = "appregistry-server", version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, hide = true)]
    pub debug: bool,

    /// Path to the credentials context file used when fetching sources
    #[arg(short = 'k', long, default_value = "")]
    pub kubeconfig: String,

    /// Name of the database file to output
    #[arg(short = 'd', long, default_value = "bundles.db")]
    pub database: PathBuf,

    /// Comma-separated list of source object(s) {namespace}/{name}
    #[arg(short = 's', long, value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Pipe-delimited source(s) - {base url}|{registry namespace}|{secret namespace/secret name}
    #[arg(short = 'r', long, value_delimiter = ',')]
    pub registry: Vec<String>,

    /// Comma-separated list of package(s) to be downloaded from the specified source(s)
    #[arg(short = 'o', long, default_value = "")]
    pub packages: String,

    /// Port number to serve on
    #[arg(short = 'p', long, default_value = "50051")]
    pub port: String,

    /// Path to a container termination log file
    #[arg(short = 't', long, default_value = "/dev/termination-log")]
    pub termination_log: PathBuf,
}

// =============================================================================
// TESTS
// =============================================================================
