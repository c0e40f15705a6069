//! # Manifest Data Model
//!
//! The decoded shape of one fetched source payload, plus the structural
//! validation the loader applies before anything reaches the store.
//!
//! A payload declares packages (each with named channels pointing at a current
//! head) and bundles (the channel entries themselves, carrying the raw
//! manifest blob served back to clients). Validation is strict: a payload
//! that references an undeclared package or channel is rejected as a whole,
//! because the store must never expose a dangling reference.

use crate::types::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// PACKAGES & CHANNELS
// =============================================================================

/// A named channel within a package, pointing at its current head bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel name, unique within its package.
    pub name: String,
    /// Name of the bundle currently at the head of this channel.
    pub current_csv: String,
}

/// A package manifest: the channel table for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Package name, unique across the whole store.
    pub name: String,
    /// Name of the channel served when the client does not ask for one.
    pub default_channel: String,
    /// All channels declared by this package.
    pub channels: Vec<Channel>,
}

impl PackageManifest {
    /// Look up a channel by name.
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }
}

// =============================================================================
// BUNDLES
// =============================================================================

/// One channel entry: a versioned bundle and the raw manifest blob behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// Bundle name, unique within its package.
    pub csv_name: String,
    /// The package this bundle belongs to.
    pub package_name: String,
    /// The channels this bundle appears in.
    pub channel_names: Vec<String>,
    /// The bundle this one replaces in its upgrade graph, if any.
    pub replaces: Option<String>,
    /// Raw manifest content, served to clients verbatim.
    pub manifest: String,
}

impl Bundle {
    /// True when this bundle is an entry of the given channel.
    #[must_use]
    pub fn in_channel(&self, channel: &str) -> bool {
        self.channel_names.iter().any(|c| c == channel)
    }
}

// =============================================================================
// SOURCE PAYLOAD
// =============================================================================

/// The decoded payload of one or more fetched sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceManifests {
    pub packages: Vec<PackageManifest>,
    pub bundles: Vec<Bundle>,
}

impl SourceManifests {
    /// Decode a raw JSON payload.
    pub fn from_json(raw: &[u8]) -> Result<Self, RegistryError> {
        serde_json::from_slice(raw).map_err(|e| RegistryError::InvalidManifest(e.to_string()))
    }

    /// Structural validation.
    ///
    /// Rejects the payload if:
    /// - a package name or a bundle name within a package is duplicated
    /// - a package's default channel is not among its channels
    /// - a bundle references an undeclared package or channel
    /// - a channel's current head is not present as a bundle
    pub fn validate(&self) -> Result<(), RegistryError> {
        let mut package_names = BTreeSet::new();
        for package in &self.packages {
            if !package_names.insert(package.name.as_str()) {
                return Err(RegistryError::InvalidManifest(format!(
                    "duplicate package '{}'",
                    package.name
                )));
            }
            if package.channel(&package.default_channel).is_none() {
                return Err(RegistryError::InvalidManifest(format!(
                    "package '{}' declares unknown default channel '{}'",
                    package.name, package.default_channel
                )));
            }
        }

        let mut bundle_keys = BTreeSet::new();
        for bundle in &self.bundles {
            if !bundle_keys.insert((bundle.package_name.as_str(), bundle.csv_name.as_str())) {
                return Err(RegistryError::InvalidManifest(format!(
                    "duplicate bundle '{}' in package '{}'",
                    bundle.csv_name, bundle.package_name
                )));
            }
            let Some(package) = self.packages.iter().find(|p| p.name == bundle.package_name)
            else {
                return Err(RegistryError::InvalidManifest(format!(
                    "bundle '{}' references undeclared package '{}'",
                    bundle.csv_name, bundle.package_name
                )));
            };
            for channel in &bundle.channel_names {
                if package.channel(channel).is_none() {
                    return Err(RegistryError::InvalidManifest(format!(
                        "bundle '{}' references undeclared channel '{}' of package '{}'",
                        bundle.csv_name, channel, package.name
                    )));
                }
            }
        }

        // Every channel head must exist as a bundle in that channel.
        for package in &self.packages {
            for channel in &package.channels {
                let head_present = self.bundles.iter().any(|b| {
                    b.package_name == package.name
                        && b.csv_name == channel.current_csv
                        && b.in_channel(&channel.name)
                });
                if !head_present {
                    return Err(RegistryError::InvalidManifest(format!(
                        "channel '{}' of package '{}' has missing head '{}'",
                        channel.name, package.name, channel.current_csv
                    )));
                }
            }
        }

        Ok(())
    }

    /// Drop every package not allowed by the filter, and its bundles with it.
    pub fn retain_packages(&mut self, filter: &PackageFilter) {
        if filter.is_unrestricted() {
            return;
        }
        self.packages.retain(|p| filter.allows(&p.name));
        self.bundles.retain(|b| filter.allows(&b.package_name));
    }

    /// Merge another source's payload into this one.
    ///
    /// A package appearing in more than one source is a configuration error,
    /// not a merge: the load aborts rather than guessing which source wins.
    pub fn merge(&mut self, other: SourceManifests) -> Result<(), RegistryError> {
        for package in &other.packages {
            if self.packages.iter().any(|p| p.name == package.name) {
                return Err(RegistryError::InvalidManifest(format!(
                    "package '{}' is provided by more than one source",
                    package.name
                )));
            }
        }
        self.packages.extend(other.packages);
        self.bundles.extend(other.bundles);
        Ok(())
    }

    /// True when no package was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

// =============================================================================
// PACKAGE FILTER
// =============================================================================

/// Optional allow-list restricting which packages the loader ingests.
///
/// Parsed once from the `--packages` flag and passed through unmodified; an
/// empty filter allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageFilter(BTreeSet<String>);

impl PackageFilter {
    /// Parse a comma-separated allow-list. Blank entries are ignored.
    #[must_use]
    pub fn parse(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// True when the filter allows every package.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the given package passes the filter.
    #[must_use]
    pub fn allows(&self, package: &str) -> bool {
        self.is_unrestricted() || self.0.contains(package)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn channel(name: &str, head: &str) -> Channel {
        Channel {
            name: name.to_string(),
            current_csv: head.to_string(),
        }
    }

    fn bundle(pkg: &str, csv: &str, channels: &[&str], replaces: Option<&str>) -> Bundle {
        Bundle {
            csv_name: csv.to_string(),
            package_name: pkg.to_string(),
            channel_names: channels.iter().map(|c| (*c).to_string()).collect(),
            replaces: replaces.map(str::to_string),
            manifest: format!("{{\"csv\":\"{csv}\"}}"),
        }
    }

    fn valid_manifests() -> SourceManifests {
        SourceManifests {
            packages: vec![PackageManifest {
                name: "etcd".to_string(),
                default_channel: "stable".to_string(),
                channels: vec![channel("stable", "etcd.v0.9.2"), channel("alpha", "etcd.v0.9.2")],
            }],
            bundles: vec![
                bundle("etcd", "etcd.v0.9.0", &["stable"], None),
                bundle("etcd", "etcd.v0.9.2", &["stable", "alpha"], Some("etcd.v0.9.0")),
            ],
        }
    }

    #[test]
    fn valid_payload_passes_validation() {
        valid_manifests().validate().unwrap();
    }

    #[test]
    fn unknown_default_channel_is_rejected() {
        let mut manifests = valid_manifests();
        manifests.packages[0].default_channel = "beta".to_string();

        let err = manifests.validate().unwrap_err();
        assert!(matches!(err, RegistryError::InvalidManifest(_)));
    }

    #[test]
    fn bundle_with_undeclared_package_is_rejected() {
        let mut manifests = valid_manifests();
        manifests.bundles.push(bundle("other", "other.v1", &[], None));

        assert!(manifests.validate().is_err());
    }

    #[test]
    fn bundle_with_undeclared_channel_is_rejected() {
        let mut manifests = valid_manifests();
        manifests.bundles[0].channel_names.push("beta".to_string());

        assert!(manifests.validate().is_err());
    }

    #[test]
    fn missing_channel_head_is_rejected() {
        let mut manifests = valid_manifests();
        manifests.packages[0].channels[0].current_csv = "etcd.v9.9.9".to_string();

        assert!(manifests.validate().is_err());
    }

    #[test]
    fn duplicate_bundle_is_rejected() {
        let mut manifests = valid_manifests();
        let dup = manifests.bundles[0].clone();
        manifests.bundles.push(dup);

        assert!(manifests.validate().is_err());
    }

    #[test]
    fn json_round_trip() {
        let manifests = valid_manifests();
        let raw = serde_json::to_vec(&manifests).unwrap();

        assert_eq!(SourceManifests::from_json(&raw).unwrap(), manifests);
    }

    #[test]
    fn malformed_json_is_an_invalid_manifest() {
        let err = SourceManifests::from_json(b"not json").unwrap_err();
        assert!(matches!(err, RegistryError::InvalidManifest(_)));
    }

    #[test]
    fn merge_rejects_duplicate_package_across_sources() {
        let mut first = valid_manifests();
        let second = valid_manifests();

        let err = first.merge(second).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidManifest(_)));
    }

    #[test]
    fn merge_combines_distinct_sources() {
        let mut first = valid_manifests();
        let mut second = valid_manifests();
        second.packages[0].name = "prometheus".to_string();
        for b in &mut second.bundles {
            b.package_name = "prometheus".to_string();
        }

        first.merge(second).unwrap();
        assert_eq!(first.packages.len(), 2);
        assert_eq!(first.bundles.len(), 4);
    }

    #[test]
    fn empty_filter_allows_everything() {
        let filter = PackageFilter::parse("");
        assert!(filter.is_unrestricted());
        assert!(filter.allows("anything"));
    }

    #[test]
    fn filter_restricts_to_listed_packages() {
        let filter = PackageFilter::parse("etcd, prometheus,");
        assert!(filter.allows("etcd"));
        assert!(filter.allows("prometheus"));
        assert!(!filter.allows("jaeger"));
    }

    #[test]
    fn retain_packages_drops_bundles_too() {
        let mut manifests = valid_manifests();
        manifests.retain_packages(&PackageFilter::parse("prometheus"));

        assert!(manifests.is_empty());
        assert!(manifests.bundles.is_empty());
    }
}
