//! HTTP implementation of the network service.
//!
//! URL shapes:
//! - `GET {base}/versions?d={identityHash}&t={token}` -> catalog JSON
//! - `GET {base}/model?version={v}&d={identityHash}&t={token}` -> archive

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::NetworkService;
use crate::error::{EngineError, EngineResult};
use crate::version::{Catalog, CatalogResponse, VersionEntry};

/// Default timeout for HTTP requests.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Buffer size for streaming downloads to disk (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Blocking HTTP client for the version server.
#[derive(Debug)]
pub struct HttpNetworkService {
    client: Client,
    base_url: String,
}

impl HttpNetworkService {
    /// Create a client for the given server base URL.
    pub fn new(base_url: impl Into<String>) -> EngineResult<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Network(format!("failed to build HTTP client: {}", e)))?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { client, base_url })
    }

    fn versions_url(&self) -> String {
        format!("{}/versions", self.base_url)
    }

    fn model_url(&self) -> String {
        format!("{}/model", self.base_url)
    }
}

impl NetworkService for HttpNetworkService {
    fn fetch_catalog(&self, identity_hash: &str, token: &str) -> EngineResult<Catalog> {
        let url = self.versions_url();
        debug!(%url, "fetching version catalog");

        let response = self
            .client
            .get(&url)
            .query(&[("d", identity_hash), ("t", token)])
            .send()
            .map_err(|e| EngineError::Network(format!("catalog request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Network(format!(
                "catalog request to {} returned {}",
                url, status
            )));
        }

        let body: CatalogResponse = response
            .json()
            .map_err(|e| EngineError::Network(format!("failed to parse catalog: {}", e)))?;

        Ok(Catalog::from_response(body))
    }

    fn download_archive(
        &self,
        version: &VersionEntry,
        identity_hash: &str,
        token: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> EngineResult<u64> {
        let url = self.model_url();
        debug!(%url, version = %version.version, dest = %dest.display(), "downloading patch archive");

        // An already-cancelled token never issues the request.
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| EngineError::io("create", parent, e))?;
        }

        let mut response = self
            .client
            .get(&url)
            .query(&[
                ("version", version.version.as_str()),
                ("d", identity_hash),
                ("t", token),
            ])
            .send()
            .map_err(|e| EngineError::Network(format!("archive request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Network(format!(
                "archive request to {} returned {}",
                url, status
            )));
        }

        let file = File::create(dest).map_err(|e| EngineError::io("write", dest, e))?;
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut downloaded = 0u64;

        loop {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| EngineError::Network(format!("read error: {}", e)))?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| EngineError::io("write", dest, e))?;
            downloaded += bytes_read as u64;
        }

        writer
            .flush()
            .map_err(|e| EngineError::io("write", dest, e))?;

        Ok(downloaded)
    }
}
