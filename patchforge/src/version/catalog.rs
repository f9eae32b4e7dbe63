//! The fetched version catalog and version-selection logic.

use serde::Deserialize;

use super::entry::VersionEntry;
use crate::hash::hashes_equal;

/// Wire format of the `/versions` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    /// Version string of the server-recommended version.
    #[serde(default)]
    pub recommended_version: Option<String>,
    /// All versions compatible with the queried identity hash.
    #[serde(default)]
    pub versions: Vec<VersionEntry>,
}

/// An ordered list of available versions plus the recommended one.
///
/// Fetched fresh per request; the previous catalog is discarded, not
/// merged, and entries are immutable once fetched.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Versions in server order.
    pub versions: Vec<VersionEntry>,
    /// The recommended version, resolved by version string.
    pub recommended: Option<VersionEntry>,
}

impl Catalog {
    /// Build a catalog from the wire response, resolving the
    /// recommended entry by its version string (first match wins).
    pub fn from_response(response: CatalogResponse) -> Self {
        let recommended = response.recommended_version.as_deref().and_then(|name| {
            response
                .versions
                .iter()
                .find(|v| v.version == name)
                .cloned()
        });

        Self {
            versions: response.versions,
            recommended,
        }
    }

    /// Whether an entry with the same identity exists in this catalog.
    pub fn contains(&self, entry: &VersionEntry) -> bool {
        self.versions.iter().any(|v| v == entry)
    }

    /// Find the entry whose applied-artifact hash matches `hash`.
    ///
    /// Linear scan, ASCII case-insensitive, first match wins. The
    /// server does not guarantee hash uniqueness across versions.
    pub fn find_by_applied_hash(&self, hash: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| {
            v.applied_artifact_hash
                .as_deref()
                .is_some_and(|h| hashes_equal(h, hash))
        })
    }

    /// Choose the version to pre-select after a successful fetch.
    ///
    /// Priority, first applicable rule wins:
    /// 1. Keep the current selection if it still exists in this catalog.
    /// 2. Otherwise the currently applied version, if present here.
    /// 3. Otherwise the recommended version, but only when it is
    ///    strictly newer (semver) than the applied version (or nothing
    ///    is applied) and its patch payload is already downloaded.
    /// 4. Otherwise nothing; the user must choose manually.
    pub fn select<F>(
        &self,
        current: Option<&VersionEntry>,
        applied: Option<&VersionEntry>,
        is_downloaded: F,
    ) -> Option<VersionEntry>
    where
        F: Fn(&VersionEntry) -> bool,
    {
        if let Some(current) = current {
            if let Some(kept) = self.versions.iter().find(|v| *v == current) {
                return Some(kept.clone());
            }
        }

        if let Some(applied) = applied {
            if let Some(kept) = self.versions.iter().find(|v| *v == applied) {
                return Some(kept.clone());
            }
        }

        if let Some(recommended) = &self.recommended {
            let newer = match applied {
                Some(applied) => recommended.is_newer_than(applied),
                None => true,
            };
            if newer && !recommended.is_unsubmitted && is_downloaded(recommended) {
                return Some(recommended.clone());
            }
        }

        None
    }
}
