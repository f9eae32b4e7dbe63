//! SHA-256 content hashing for identity and applied-state detection.
//!
//! The catalog is keyed by content hashes of the base asset, and the
//! currently applied version is detected by hashing the target file,
//! so hashing must be deterministic and streaming-friendly.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{EngineError, EngineResult};

/// Buffer size for reading files during hash calculation (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Calculate the SHA-256 hash of a file.
///
/// Returns the lowercase hexadecimal digest of the file contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn calculate_file_hash(path: &Path) -> EngineResult<String> {
    let mut file = File::open(path).map_err(|e| EngineError::io("read", path, e))?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| EngineError::io("read", path, e))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Calculate the SHA-256 hash of an in-memory buffer.
///
/// Used by tests and by callers that already hold the bytes.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// ASCII case-insensitive hash comparison.
///
/// The server is not consistent about hex digest casing, so applied
/// hashes are always compared case-insensitively.
pub fn hashes_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
