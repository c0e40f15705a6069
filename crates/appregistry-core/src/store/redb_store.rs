//! # redb-backed Registry Store
//!
//! A disk-backed bundle store using the redb embedded database.
//!
//! The store has a one-shot lifecycle: `create` overwrites any previous
//! database at the path and populates it in a single write transaction, then
//! the handle serves reads for the rest of the process. There is no
//! incremental update path; a failed load never commits.
//!
//! Concurrent reads need no locking: redb's MVCC gives every read transaction
//! a consistent snapshot, and nothing writes after `create` returns.

use crate::manifest::{Bundle, PackageManifest, SourceManifests};
use crate::types::RegistryError;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

/// Table for packages: package name -> serialized PackageManifest
const PACKAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("packages");

/// Table for bundles: (package name, csv name) -> serialized Bundle
///
/// The composite key keeps a package's bundles adjacent, so replaces-chain
/// queries are a single range scan.
const BUNDLES: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("bundles");

/// A disk-backed registry store.
pub struct RegistryStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RegistryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryStore").finish_non_exhaustive()
    }
}

impl RegistryStore {
    /// Create (or overwrite) the database at `path` and populate it from the
    /// already-validated manifests, in a single ACID transaction.
    pub fn create(
        path: impl AsRef<Path>,
        manifests: &SourceManifests,
    ) -> Result<Self, RegistryError> {
        let path = path.as_ref();

        // Overwrite semantics: a stale database from a previous run must not
        // leak old bundles into this one.
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| RegistryError::IoError(e.to_string()))?;
        }

        let db = Database::create(path).map_err(|e| RegistryError::IoError(e.to_string()))?;

        let write_txn = db
            .begin_write()
            .map_err(|e| RegistryError::IoError(e.to_string()))?;
        {
            let mut packages = write_txn
                .open_table(PACKAGES)
                .map_err(|e| RegistryError::IoError(e.to_string()))?;
            for package in &manifests.packages {
                let bytes = postcard::to_allocvec(package)
                    .map_err(|e| RegistryError::SerializationError(e.to_string()))?;
                packages
                    .insert(package.name.as_str(), bytes.as_slice())
                    .map_err(|e| RegistryError::IoError(e.to_string()))?;
            }

            let mut bundles = write_txn
                .open_table(BUNDLES)
                .map_err(|e| RegistryError::IoError(e.to_string()))?;
            for bundle in &manifests.bundles {
                let bytes = postcard::to_allocvec(bundle)
                    .map_err(|e| RegistryError::SerializationError(e.to_string()))?;
                bundles
                    .insert(
                        (bundle.package_name.as_str(), bundle.csv_name.as_str()),
                        bytes.as_slice(),
                    )
                    .map_err(|e| RegistryError::IoError(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| RegistryError::IoError(e.to_string()))?;

        Ok(Self { db })
    }

    /// Open an existing database read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let db =
            Database::open(path.as_ref()).map_err(|e| RegistryError::IoError(e.to_string()))?;
        Ok(Self { db })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// All package names, sorted.
    pub fn list_packages(&self) -> Result<Vec<String>, RegistryError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| RegistryError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(PACKAGES)
            .map_err(|e| RegistryError::IoError(e.to_string()))?;

        let mut names = Vec::new();
        for entry in table
            .iter()
            .map_err(|e| RegistryError::IoError(e.to_string()))?
        {
            let (key, _) = entry.map_err(|e| RegistryError::IoError(e.to_string()))?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }

    /// Look up one package manifest.
    pub fn get_package(&self, name: &str) -> Result<Option<PackageManifest>, RegistryError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| RegistryError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(PACKAGES)
            .map_err(|e| RegistryError::IoError(e.to_string()))?;

        table
            .get(name)
            .map_err(|e| RegistryError::IoError(e.to_string()))?
            .map(|guard| {
                postcard::from_bytes(guard.value())
                    .map_err(|e| RegistryError::SerializationError(e.to_string()))
            })
            .transpose()
    }

    /// Look up one bundle by package, channel, and csv name.
    ///
    /// Returns `None` when the bundle is absent or is not an entry of the
    /// requested channel.
    pub fn get_bundle(
        &self,
        package: &str,
        channel: &str,
        csv: &str,
    ) -> Result<Option<Bundle>, RegistryError> {
        Ok(self
            .read_bundle(package, csv)?
            .filter(|bundle| bundle.in_channel(channel)))
    }

    /// The bundle at the head of the given channel.
    ///
    /// Unlike `get_bundle` this distinguishes "unknown package" from "unknown
    /// channel", since the caller named both explicitly.
    pub fn get_bundle_for_channel(
        &self,
        package: &str,
        channel: &str,
    ) -> Result<Bundle, RegistryError> {
        let manifest = self
            .get_package(package)?
            .ok_or_else(|| RegistryError::PackageNotFound(package.to_string()))?;
        let head = manifest
            .channel(channel)
            .ok_or_else(|| RegistryError::ChannelNotFound {
                package: package.to_string(),
                channel: channel.to_string(),
            })?
            .current_csv
            .clone();

        // Load-time validation guarantees the head exists; a miss here means
        // the database was tampered with or corrupted.
        self.read_bundle(package, &head)?.ok_or_else(|| {
            RegistryError::InvalidManifest(format!(
                "store is missing head '{head}' of channel '{channel}' in package '{package}'"
            ))
        })
    }

    /// The bundle in the given channel that replaces `csv`, if any.
    pub fn get_bundle_that_replaces(
        &self,
        package: &str,
        channel: &str,
        csv: &str,
    ) -> Result<Option<Bundle>, RegistryError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| RegistryError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(BUNDLES)
            .map_err(|e| RegistryError::IoError(e.to_string()))?;

        // Composite keys keep one package's bundles adjacent; scan the prefix.
        for entry in table
            .range((package, "")..)
            .map_err(|e| RegistryError::IoError(e.to_string()))?
        {
            let (key, value) = entry.map_err(|e| RegistryError::IoError(e.to_string()))?;
            if key.value().0 != package {
                break;
            }
            let bundle: Bundle = postcard::from_bytes(value.value())
                .map_err(|e| RegistryError::SerializationError(e.to_string()))?;
            if bundle.replaces.as_deref() == Some(csv) && bundle.in_channel(channel) {
                return Ok(Some(bundle));
            }
        }
        Ok(None)
    }

    /// Number of packages in the store.
    pub fn package_count(&self) -> Result<u64, RegistryError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| RegistryError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(PACKAGES)
            .map_err(|e| RegistryError::IoError(e.to_string()))?;
        table.len().map_err(|e| RegistryError::IoError(e.to_string()))
    }

    /// Number of bundles in the store.
    pub fn bundle_count(&self) -> Result<u64, RegistryError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| RegistryError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(BUNDLES)
            .map_err(|e| RegistryError::IoError(e.to_string()))?;
        table.len().map_err(|e| RegistryError::IoError(e.to_string()))
    }

    fn read_bundle(&self, package: &str, csv: &str) -> Result<Option<Bundle>, RegistryError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| RegistryError::IoError(e.to_string()))?;
        let table = read_txn
            .open_table(BUNDLES)
            .map_err(|e| RegistryError::IoError(e.to_string()))?;

        table
            .get((package, csv))
            .map_err(|e| RegistryError::IoError(e.to_string()))?
            .map(|guard| {
                postcard::from_bytes(guard.value())
                    .map_err(|e| RegistryError::SerializationError(e.to_string()))
            })
            .transpose()
    }
}

// =============================================================================
// TESTS
// =============================================================================
