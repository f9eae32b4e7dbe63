//! Content-hash identity and applied-state detection.
//!
//! The engine never trusts cached "applied" flags: which version is
//! installed is re-derived from file content on every state change.

use std::path::Path;

use crate::backup;
use crate::error::EngineResult;
use crate::hash;
use crate::version::{Catalog, VersionEntry};

/// Hash used to query the remote catalog for compatible versions.
///
/// If a backup exists for `target`, this is the hash of the backup
/// (the pristine original), not of the possibly-already-patched
/// current file: the catalog is keyed by the base asset's content,
/// which must stay stable regardless of which patch is applied. With
/// no backup, the current file itself is hashed.
///
/// Returns `Ok(None)` when the target file does not exist.
pub fn identity_hash(target: &Path) -> EngineResult<Option<String>> {
    if !target.is_file() {
        return Ok(None);
    }

    let source = if backup::backup_exists(target) {
        backup::backup_path(target)
    } else {
        target.to_path_buf()
    };

    hash::calculate_file_hash(&source).map(Some)
}

/// Hash of the target file as it exists right now.
///
/// Returns `Ok(None)` when the target file does not exist.
pub fn current_hash(target: &Path) -> EngineResult<Option<String>> {
    if !target.is_file() {
        return Ok(None);
    }
    hash::calculate_file_hash(target).map(Some)
}

/// Resolve which catalog entry, if any, is currently applied.
///
/// Scans the catalog for an entry whose applied-artifact hash equals
/// `current_hash` (case-insensitive, first match wins). Returns
/// `None` whenever the hash or the catalog is unavailable: applied
/// state is rebuilt from scratch on each derivation, never carried
/// over from a previous value.
pub fn resolve_applied<'a>(
    current_hash: Option<&str>,
    catalog: Option<&'a Catalog>,
) -> Option<&'a VersionEntry> {
    let hash = current_hash?;
    if hash.is_empty() {
        return None;
    }
    catalog?.find_by_applied_hash(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::version::CatalogResponse;

    fn catalog_with_hash(version: &str, applied_hash: &str) -> Catalog {
        let mut entry = VersionEntry::new(version, "base");
        entry.applied_artifact_hash = Some(applied_hash.to_string());
        Catalog::from_response(CatalogResponse {
            recommended_version: None,
            versions: vec![entry],
        })
    }

    #[test]
    fn test_identity_hash_missing_file_is_none() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("missing.asset");
        assert!(identity_hash(&target).unwrap().is_none());
    }

    #[test]
    fn test_identity_hash_without_backup_uses_current_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("base.asset");
        fs::write(&target, b"pristine").unwrap();

        let id = identity_hash(&target).unwrap().unwrap();
        assert_eq!(id, hash::hash_bytes(b"pristine"));
    }

    #[test]
    fn test_identity_hash_prefers_backup() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("base.asset");
        fs::write(&target, b"pristine").unwrap();
        backup::create_backup(&target).unwrap();

        // Patch the file; identity must still be the pristine hash.
        fs::write(&target, b"patched content").unwrap();

        let id = identity_hash(&target).unwrap().unwrap();
        assert_eq!(id, hash::hash_bytes(b"pristine"));

        let current = current_hash(&target).unwrap().unwrap();
        assert_eq!(current, hash::hash_bytes(b"patched content"));
    }

    #[test]
    fn test_resolve_applied_matches_case_insensitively() {
        let catalog = catalog_with_hash("1.0.0", "AABBCC");
        let applied = resolve_applied(Some("aabbcc"), Some(&catalog));
        assert_eq!(applied.unwrap().version, "1.0.0");
    }

    #[test]
    fn test_resolve_applied_clears_without_hash_or_catalog() {
        let catalog = catalog_with_hash("1.0.0", "aabbcc");

        assert!(resolve_applied(None, Some(&catalog)).is_none());
        assert!(resolve_applied(Some(""), Some(&catalog)).is_none());
        assert!(resolve_applied(Some("aabbcc"), None).is_none());
    }

    #[test]
    fn test_resolve_applied_no_match() {
        let catalog = catalog_with_hash("1.0.0", "aabbcc");
        assert!(resolve_applied(Some("ddeeff"), Some(&catalog)).is_none());
    }
}
