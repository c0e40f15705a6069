//! # appregistry-server
//!
//! Downloads manifest(s) from remote application registries, builds a local
//! database containing the downloaded manifests, and serves a query API over
//! it until terminated.
//!
//! Startup is strictly sequential and fail-fast: resolve sources, load the
//! store, bind the listener, serve. Any error at any stage is written to the
//! termination log and the process exits non-zero. Only this file terminates
//! the process; every inner component propagates `Result`s.
//!
//! ## Usage
//!
//! ```bash
//! # Legacy source objects, resolved through the credentials context
//! appregistry-server -k creds.toml -s marketplace/community -p 50051
//!
//! # Modern pipe-delimited descriptors
//! appregistry-server -r "https://example.com/cnr|community|marketplace/token"
//! ```

use appregistry_server::{bootstrap, cli::Cli};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing — APPREGISTRY_LOG_FORMAT=json enables
    // machine-parseable output. The hidden --debug flag raises the default
    // filter; RUST_LOG still wins when set.
    let default_filter = if cli.debug {
        "appregistry_server=debug,appregistry_core=debug,tower_http=debug"
    } else {
        "appregistry_server=info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let log_format = std::env::var("APPREGISTRY_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // bootstrap::run has already written the termination log by the time an
    // error reaches here; this is the process's only exit site.
    if let Err(e) = bootstrap::run(&cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
