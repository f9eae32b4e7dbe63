//! Error types for the version-state engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::session::OpCategory;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during engine operations.
///
/// Each operation category records its last error message in the
/// session state; these variants are the typed source of those
/// messages.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A catalog fetch or archive download did not succeed.
    ///
    /// Non-fatal and retryable by re-invoking the same operation.
    #[error("network request failed: {0}")]
    Network(String),

    /// The patch payload for the requested version is absent locally.
    ///
    /// Aborts an apply before the target file is touched.
    #[error("patch payload not found at {}", .0.display())]
    MissingArtifact(PathBuf),

    /// Archive processing failed after a successful download.
    #[error("failed to extract {}: {reason}", .path.display())]
    Extraction { path: PathBuf, reason: String },

    /// No content hash could be computed for the target file.
    #[error("no identity hash available for the target file")]
    IdentityUnavailable,

    /// Patching or writing the target file failed.
    #[error("apply failed: {0}")]
    Apply(String),

    /// A backup already exists and must never be overwritten.
    #[error("backup already exists at {}", .0.display())]
    BackupExists(PathBuf),

    /// A restore was requested but no backup is present.
    #[error("no backup found at {}", .0.display())]
    BackupMissing(PathBuf),

    /// An operation of the same category is already in flight.
    #[error("{0} operation already in flight")]
    OperationInFlight(OpCategory),

    /// An apply was requested with no version selected.
    #[error("no version selected")]
    NoVersionSelected,

    /// A download was cancelled via its cancellation handle.
    #[error("download cancelled")]
    Cancelled,

    /// A background task panicked or was aborted.
    #[error("background task failed: {0}")]
    Internal(String),

    /// File I/O failure with the action and path that failed.
    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

impl EngineError {
    /// Helper for wrapping I/O errors with context.
    pub(crate) fn io(action: &'static str, path: &std::path::Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}
