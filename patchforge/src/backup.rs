//! Pristine-backup management for the target asset file.
//!
//! The backup is the only way the engine ever reverts a patch. It is
//! taken once, before the first apply, and never overwritten: an
//! overwrite would permanently lose the true original.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{EngineError, EngineResult};

/// Suffix appended to the target path to form the backup path.
pub const BACKUP_SUFFIX: &str = ".original";

/// Backup path for a target file: sibling with the `.original` suffix.
pub fn backup_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Whether a backup exists for the given target file.
pub fn backup_exists(target: &Path) -> bool {
    backup_path(target).is_file()
}

/// Copy the target file to its backup path.
///
/// # Errors
///
/// Returns [`EngineError::BackupExists`] if a backup is already
/// present; an existing backup is never overwritten. Returns an I/O
/// error if the copy fails.
pub fn create_backup(target: &Path) -> EngineResult<PathBuf> {
    let backup = backup_path(target);
    if backup.exists() {
        return Err(EngineError::BackupExists(backup));
    }

    fs::copy(target, &backup).map_err(|e| EngineError::io("copy", target, e))?;
    debug!(target = %target.display(), backup = %backup.display(), "created backup");
    Ok(backup)
}

/// Restore the target file byte-for-byte from its backup.
///
/// # Errors
///
/// Returns [`EngineError::BackupMissing`] if no backup exists, or an
/// I/O error if the copy back fails.
pub fn restore_backup(target: &Path) -> EngineResult<()> {
    let backup = backup_path(target);
    if !backup.is_file() {
        return Err(EngineError::BackupMissing(backup));
    }

    fs::copy(&backup, target).map_err(|e| EngineError::io("restore", target, e))?;
    debug!(target = %target.display(), "restored from backup");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_path_appends_suffix() {
        let path = backup_path(Path::new("/avatars/base.asset"));
        assert_eq!(path, PathBuf::from("/avatars/base.asset.original"));
    }

    #[test]
    fn test_create_and_restore_round_trip() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("base.asset");
        fs::write(&target, b"pristine bytes").unwrap();

        assert!(!backup_exists(&target));
        create_backup(&target).unwrap();
        assert!(backup_exists(&target));

        // Clobber the target, then restore.
        fs::write(&target, b"patched bytes that differ").unwrap();
        restore_backup(&target).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"pristine bytes");
    }

    #[test]
    fn test_create_backup_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("base.asset");
        fs::write(&target, b"original").unwrap();

        create_backup(&target).unwrap();

        // Mutate the target and try to back up again.
        fs::write(&target, b"mutated").unwrap();
        let result = create_backup(&target);
        assert!(matches!(result, Err(EngineError::BackupExists(_))));

        // The first backup must be untouched.
        assert_eq!(fs::read(backup_path(&target)).unwrap(), b"original");
    }

    #[test]
    fn test_restore_without_backup_is_an_error() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("base.asset");
        fs::write(&target, b"content").unwrap();

        let result = restore_backup(&target);
        assert!(matches!(result, Err(EngineError::BackupMissing(_))));
    }

    #[test]
    fn test_create_backup_missing_target_fails() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("missing.asset");

        assert!(create_backup(&target).is_err());
    }
}
