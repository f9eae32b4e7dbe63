//! Network service boundary: catalog fetch and archive download.
//!
//! The coordinator only sees the [`NetworkService`] trait; the
//! production implementation is [`HttpNetworkService`], and tests
//! substitute mocks.

mod http;

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::error::EngineResult;
use crate::version::{Catalog, VersionEntry};

pub use http::HttpNetworkService;

/// Remote catalog and archive access.
///
/// Implementations are blocking; the coordinator crosses into them
/// via `spawn_blocking`. They are stateless with respect to the
/// engine's invariants.
pub trait NetworkService: Send + Sync {
    /// Fetch the catalog of versions compatible with `identity_hash`.
    fn fetch_catalog(&self, identity_hash: &str, token: &str) -> EngineResult<Catalog>;

    /// Download the patch archive for `version` to `dest`.
    ///
    /// Checks `cancel` between stream chunks; a cancelled download
    /// returns [`crate::error::EngineError::Cancelled`]. Returns the
    /// number of bytes written.
    fn download_archive(
        &self,
        version: &VersionEntry,
        identity_hash: &str,
        token: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> EngineResult<u64>;
}
