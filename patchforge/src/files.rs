//! File manager service boundary.
//!
//! Everything the engine does to the filesystem beyond its own
//! components goes through [`FileManagerService`]: archive
//! extraction, version folder management, auxiliary asset and logic
//! instantiation, and the external refresh hooks. The production
//! implementation is [`LocalFileManager`]; tests substitute mocks or
//! wrap the local one with counters.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::backup;
use crate::error::{EngineError, EngineResult};
use crate::hash;

/// Name prefix for logic objects instantiated into the hierarchy.
///
/// Removal before every apply/reset matches on this prefix, which is
/// what guards against duplicate objects after an interrupted run.
pub const LOGIC_PREFIX: &str = "pf-logic.";

/// Filesystem collaborator for the coordinator.
pub trait FileManagerService: Send + Sync {
    /// Extract `archive` via `temp_dir`, then move its contents into
    /// `dest_dir`. Returns the number of entries moved.
    fn extract_and_move(&self, archive: &Path, temp_dir: &Path, dest_dir: &Path)
        -> EngineResult<usize>;

    /// Delete a version's storage folder.
    fn delete_version_folder(&self, path: &Path) -> EngineResult<()>;

    /// Remove any previously instantiated logic objects under `root`.
    ///
    /// Must be safe to call when none exist.
    fn remove_existing_logic(&self, root: &Path) -> EngineResult<()>;

    /// Apply an auxiliary binding asset for `target` into `root`.
    fn apply_auxiliary_asset(&self, root: &Path, target: &Path, asset: &Path) -> EngineResult<()>;

    /// Instantiate a packaged logic object into the hierarchy.
    fn instantiate_logic_package(&self, package: &Path, root: &Path) -> EngineResult<()>;

    /// Ask the host environment to re-import / refresh assets.
    fn request_refresh(&self);

    /// Block until any pending external compile/refresh cycle settles.
    fn wait_for_refresh(&self);

    /// Content hash of a file (lowercase hex SHA-256).
    fn calculate_file_hash(&self, path: &Path) -> EngineResult<String> {
        hash::calculate_file_hash(path)
    }

    /// Whether a pristine backup exists for `target`.
    fn backup_exists(&self, target: &Path) -> bool {
        backup::backup_exists(target)
    }

    /// Create the pristine backup for `target`. Never overwrites.
    fn create_backup(&self, target: &Path) -> EngineResult<PathBuf> {
        backup::create_backup(target)
    }

    /// Restore `target` byte-for-byte from its backup.
    fn restore_backup(&self, target: &Path) -> EngineResult<()> {
        backup::restore_backup(target)
    }
}

/// Local-filesystem implementation.
///
/// Archive extraction shells out to `tar`, matching the format the
/// server publishes archives in. Refresh hooks are no-ops: outside a
/// host engine there is nothing to re-import.
#[derive(Debug, Default)]
pub struct LocalFileManager;

impl LocalFileManager {
    pub fn new() -> Self {
        Self
    }

    /// Extract a tar.gz archive into a destination directory.
    fn extract_tar_gz(&self, archive: &Path, dest_dir: &Path) -> EngineResult<()> {
        fs::create_dir_all(dest_dir).map_err(|e| EngineError::io("create", dest_dir, e))?;

        let output = Command::new("tar")
            .args([
                "-xzf",
                archive.to_str().unwrap_or(""),
                "-C",
                dest_dir.to_str().unwrap_or(""),
            ])
            .output()
            .map_err(|e| EngineError::Extraction {
                path: archive.to_path_buf(),
                reason: format!("failed to run tar: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Extraction {
                path: archive.to_path_buf(),
                reason: format!("tar extraction failed: {}", stderr.trim()),
            });
        }

        Ok(())
    }

    /// Move every entry of `from` into `to`, rename first with a
    /// copy fallback for cross-filesystem moves.
    fn move_contents(&self, from: &Path, to: &Path) -> EngineResult<usize> {
        fs::create_dir_all(to).map_err(|e| EngineError::io("create", to, e))?;

        let entries: Vec<_> = fs::read_dir(from)
            .map_err(|e| EngineError::io("read", from, e))?
            .filter_map(|e| e.ok())
            .collect();

        let mut moved = 0;
        for entry in entries {
            let source = entry.path();
            let dest = to.join(entry.file_name());

            if fs::rename(&source, &dest).is_err() {
                if source.is_dir() {
                    copy_dir_recursive(&source, &dest)?;
                    fs::remove_dir_all(&source).ok();
                } else {
                    fs::copy(&source, &dest).map_err(|e| EngineError::io("copy", &dest, e))?;
                    fs::remove_file(&source).ok();
                }
            }
            moved += 1;
        }

        Ok(moved)
    }
}

impl FileManagerService for LocalFileManager {
    fn extract_and_move(
        &self,
        archive: &Path,
        temp_dir: &Path,
        dest_dir: &Path,
    ) -> EngineResult<usize> {
        self.extract_tar_gz(archive, temp_dir)?;
        let moved = self.move_contents(temp_dir, dest_dir)?;
        debug!(
            archive = %archive.display(),
            dest = %dest_dir.display(),
            moved,
            "extracted archive"
        );
        Ok(moved)
    }

    fn delete_version_folder(&self, path: &Path) -> EngineResult<()> {
        if !path.exists() {
            return Ok(());
        }
        fs::remove_dir_all(path).map_err(|e| EngineError::io("delete", path, e))
    }

    fn remove_existing_logic(&self, root: &Path) -> EngineResult<()> {
        if !root.is_dir() {
            return Ok(());
        }

        for entry in fs::read_dir(root)
            .map_err(|e| EngineError::io("read", root, e))?
            .filter_map(|e| e.ok())
        {
            let name = entry.file_name();
            if !name.to_string_lossy().starts_with(LOGIC_PREFIX) {
                continue;
            }

            let path = entry.path();
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(e) = removed {
                return Err(EngineError::io("delete", &path, e));
            }
            debug!(path = %path.display(), "removed existing logic object");
        }

        Ok(())
    }

    fn apply_auxiliary_asset(&self, root: &Path, target: &Path, asset: &Path) -> EngineResult<()> {
        fs::create_dir_all(root).map_err(|e| EngineError::io("create", root, e))?;

        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "avatar".to_string());
        let dest = root.join(format!("{}.binding", stem));

        fs::copy(asset, &dest).map_err(|e| EngineError::io("copy", &dest, e))?;
        debug!(asset = %asset.display(), dest = %dest.display(), "applied auxiliary asset");
        Ok(())
    }

    fn instantiate_logic_package(&self, package: &Path, root: &Path) -> EngineResult<()> {
        fs::create_dir_all(root).map_err(|e| EngineError::io("create", root, e))?;

        let name = package
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "logic.pkg".to_string());
        let dest = root.join(format!("{}{}", LOGIC_PREFIX, name));

        fs::copy(package, &dest).map_err(|e| EngineError::io("copy", &dest, e))?;
        debug!(package = %package.display(), dest = %dest.display(), "instantiated logic package");
        Ok(())
    }

    fn request_refresh(&self) {
        // Seam for the host engine's asset re-import; nothing to do locally.
        debug!("asset refresh requested");
    }

    fn wait_for_refresh(&self) {
        // No external compile cycle exists locally.
    }
}

/// Recursively copy a directory.
fn copy_dir_recursive(source: &Path, dest: &Path) -> EngineResult<()> {
    fs::create_dir_all(dest).map_err(|e| EngineError::io("create", dest, e))?;

    for entry in fs::read_dir(source).map_err(|e| EngineError::io("read", source, e))? {
        let entry = entry.map_err(|e| EngineError::io("read", source, e))?;

        let source_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if source_path.is_dir() {
            copy_dir_recursive(&source_path, &dest_path)?;
        } else {
            fs::copy(&source_path, &dest_path)
                .map_err(|e| EngineError::io("copy", &dest_path, e))?;
        }
    }

    Ok(())
}

/// Best-effort removal of a temp file or directory; failures are
/// logged and never change the outcome of the primary operation.
pub fn cleanup_temp(path: &Path) {
    if !path.exists() {
        return;
    }
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "failed to clean up temp path");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_existing_logic_only_touches_prefixed_entries() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("pf-logic.logic.pkg"), b"x").unwrap();
        fs::create_dir(root.join("pf-logic.custom")).unwrap();
        fs::write(root.join("keep.me"), b"y").unwrap();

        LocalFileManager::new().remove_existing_logic(root).unwrap();

        assert!(!root.join("pf-logic.logic.pkg").exists());
        assert!(!root.join("pf-logic.custom").exists());
        assert!(root.join("keep.me").exists());
    }

    #[test]
    fn test_remove_existing_logic_missing_root_is_noop() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(LocalFileManager::new().remove_existing_logic(&missing).is_ok());
    }

    #[test]
    fn test_apply_auxiliary_asset_copies_binding() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("hierarchy");
        let target = temp.path().join("base.asset");
        let asset = temp.path().join("avatar-default.asset");
        fs::write(&asset, b"binding data").unwrap();

        LocalFileManager::new()
            .apply_auxiliary_asset(&root, &target, &asset)
            .unwrap();

        let dest = root.join("base.binding");
        assert_eq!(fs::read(dest).unwrap(), b"binding data");
    }

    #[test]
    fn test_instantiate_logic_package_uses_prefix() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("hierarchy");
        let package = temp.path().join("logic.pkg");
        fs::write(&package, b"logic").unwrap();

        let fm = LocalFileManager::new();
        fm.instantiate_logic_package(&package, &root).unwrap();
        assert!(root.join("pf-logic.logic.pkg").exists());

        // A later remove pass must find and remove it.
        fm.remove_existing_logic(&root).unwrap();
        assert!(!root.join("pf-logic.logic.pkg").exists());
    }

    #[test]
    fn test_move_contents() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("from");
        let to = temp.path().join("to");
        fs::create_dir_all(from.join("sub")).unwrap();
        fs::write(from.join("a.bin"), b"a").unwrap();
        fs::write(from.join("sub/b.bin"), b"b").unwrap();

        let moved = LocalFileManager::new().move_contents(&from, &to).unwrap();

        assert_eq!(moved, 2); // a.bin and sub/
        assert_eq!(fs::read(to.join("a.bin")).unwrap(), b"a");
        assert_eq!(fs::read(to.join("sub/b.bin")).unwrap(), b"b");
    }

    #[test]
    fn test_delete_version_folder_missing_is_ok() {
        let temp = TempDir::new().unwrap();
        let fm = LocalFileManager::new();
        assert!(fm.delete_version_folder(&temp.path().join("none")).is_ok());

        let dir = temp.path().join("v1");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fm.delete_version_folder(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn test_extract_and_move_tar_archive() {
        let temp = TempDir::new().unwrap();

        // Build a small tar.gz with the system tar, the same tool the
        // extractor uses.
        let src = temp.path().join("payload");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("patch.bin"), b"\x01\x01").unwrap();
        fs::write(src.join("avatar-default.asset"), b"default").unwrap();

        let archive = temp.path().join("version.tar.gz");
        let status = Command::new("tar")
            .args(["-czf", archive.to_str().unwrap(), "-C", src.to_str().unwrap(), "."])
            .status()
            .unwrap();
        assert!(status.success());

        let extract_tmp = temp.path().join("extract-tmp");
        let dest = temp.path().join("dest");
        let moved = LocalFileManager::new()
            .extract_and_move(&archive, &extract_tmp, &dest)
            .unwrap();

        assert!(moved >= 2);
        assert_eq!(fs::read(dest.join("patch.bin")).unwrap(), b"\x01\x01");
        assert_eq!(fs::read(dest.join("avatar-default.asset")).unwrap(), b"default");
    }

    #[test]
    fn test_extract_missing_archive_fails() {
        let temp = TempDir::new().unwrap();
        let result = LocalFileManager::new().extract_and_move(
            &temp.path().join("missing.tar.gz"),
            &temp.path().join("tmp"),
            &temp.path().join("dest"),
        );
        assert!(matches!(result, Err(EngineError::Extraction { .. })));
    }

    #[test]
    fn test_cleanup_temp_tolerates_missing() {
        let temp = TempDir::new().unwrap();
        cleanup_temp(&temp.path().join("not-there"));

        let file = temp.path().join("t.bin");
        fs::write(&file, b"x").unwrap();
        cleanup_temp(&file);
        assert!(!file.exists());
    }
}
