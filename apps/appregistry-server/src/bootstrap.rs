//! # Process Driver
//!
//! The strictly ordered startup sequence:
//!
//! ```text
//! resolve sources -> build loader -> load store -> bind listener -> serve
//! ```
//!
//! Every stage returns a `Result`; there are no backward transitions and no
//! partial rollback. The driver itself never terminates the process - that
//! decision belongs to `main`, which keeps each stage testable.

use crate::api;
use crate::cli::Cli;
use crate::loader::{HttpManifestFetcher, RegistryLoader};
use appregistry_core::{RegistryError, RegistryStore, ResolvedSources};
use std::sync::Arc;

/// Run the full bootstrap, writing any fatal error to the termination log
/// before handing it back. The caller decides to terminate; nothing in here
/// exits the process.
pub async fn run(cli: &Cli) -> Result<(), RegistryError> {
    match execute(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            write_termination_log(&cli.termination_log, &e);
            Err(e)
        }
    }
}

/// The bootstrap stages: load the store, bind, then serve until a fatal
/// transport error or an external shutdown signal.
async fn execute(cli: &Cli) -> Result<(), RegistryError> {
    let store = load_store(cli).await?;

    // The listener is bound only after the load has fully succeeded; no
    // client can observe the registry before the store is complete.
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", cli.port))
        .await
        .map_err(|e| RegistryError::IoError(format!("failed to listen on port {}: {e}", cli.port)))?;

    api::serve(listener, Arc::new(store)).await
}

/// The load phase: everything up to (and excluding) the listener bind.
pub async fn load_store(cli: &Cli) -> Result<RegistryStore, RegistryError> {
    let resolved = ResolvedSources::resolve(&cli.sources, &cli.registry);
    if resolved.is_legacy() && !cli.registry.is_empty() {
        // Precedence kept for compatibility with deployments still passing
        // --sources; surfaced instead of silently dropping the modern list.
        tracing::warn!("--sources takes precedence, ignoring --registry values");
    }
    tracing::info!(
        legacy = resolved.is_legacy(),
        sources = resolved.specifiers().len(),
        "sources resolved"
    );

    let loader = RegistryLoader::new(&cli.kubeconfig)?;
    let fetcher = HttpManifestFetcher::new()?;

    let store = loader
        .load(&fetcher, &cli.database, &resolved, &cli.packages)
        .await?;
    tracing::info!(
        packages = store.package_count()?,
        bundles = store.bundle_count()?,
        database = %cli.database.display(),
        "store loaded"
    );
    Ok(store)
}

/// Write the final fatal diagnostic where the host can read it.
pub fn write_termination_log(path: &std::path::Path, err: &RegistryError) {
    if let Err(io_err) = std::fs::write(path, format!("{err}\n")) {
        tracing::warn!(
            "failed to write termination log at {}: {}",
            path.display(),
            io_err
        );
    }
}
