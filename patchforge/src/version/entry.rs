//! Catalog version entries.
//!
//! A version's identity is the pair `(version, base_version_id)`:
//! the same version string can exist for different base assets, and
//! equality/hashing consider only this pair.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Release scope of a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Generally available.
    Public,
    /// Beta testers only.
    Beta,
    /// Internal testing.
    Alpha,
    /// Unrecognised scope value from a newer server.
    #[default]
    #[serde(other)]
    Unknown,
}

/// A single version from the remote catalog.
///
/// Immutable once fetched; the catalog is replaced wholesale on every
/// fetch rather than merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    /// Version string, e.g. `"1.2.0"`.
    pub version: String,

    /// Identifier of the base asset this version patches.
    #[serde(rename = "baseAssetVersionId")]
    pub base_version_id: String,

    /// Release scope.
    #[serde(default)]
    pub scope: Scope,

    /// Release date as reported by the server.
    #[serde(default)]
    pub release_date: Option<String>,

    /// Changelog text.
    #[serde(default)]
    pub changelog: String,

    /// Hash of the installed artifact when already applied to this base.
    #[serde(default)]
    pub content_hash: Option<String>,

    /// Hash the target file has after this version is applied.
    ///
    /// Used to detect which version is currently installed.
    #[serde(default)]
    pub applied_artifact_hash: Option<String>,

    /// Custom blendshape names this version adds.
    #[serde(default)]
    pub custom_blendshapes: Vec<String>,

    /// Dependency name -> version requirement.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    /// Version string of the parent this one derives from.
    #[serde(default)]
    pub parent_version: Option<String>,

    /// True for versions authored locally but not yet published.
    #[serde(default)]
    pub is_unsubmitted: bool,

    /// Local authoring source, never sent over the wire.
    #[serde(skip)]
    pub local_source: Option<PathBuf>,
}

impl VersionEntry {
    /// Create a minimal entry with the given identity pair.
    pub fn new(version: impl Into<String>, base_version_id: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            base_version_id: base_version_id.into(),
            scope: Scope::Unknown,
            release_date: None,
            changelog: String::new(),
            content_hash: None,
            applied_artifact_hash: None,
            custom_blendshapes: Vec::new(),
            dependencies: BTreeMap::new(),
            parent_version: None,
            is_unsubmitted: false,
            local_source: None,
        }
    }

    /// Parse the version string as a semantic version.
    ///
    /// Returns `None` for strings that are not valid semver; such
    /// versions never satisfy "strictly newer" comparisons.
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(self.version.trim()).ok()
    }

    /// Whether this version is strictly newer than `other` by
    /// semantic (major.minor.patch) ordering, not lexical ordering.
    pub fn is_newer_than(&self, other: &VersionEntry) -> bool {
        match (self.semver(), other.semver()) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        }
    }

    /// Whether `other` has the same identity pair.
    pub fn same_identity(&self, other: &VersionEntry) -> bool {
        self == other
    }
}

impl PartialEq for VersionEntry {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.base_version_id == other.base_version_id
    }
}

impl Eq for VersionEntry {}

impl Hash for VersionEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
        self.base_version_id.hash(state);
    }
}
