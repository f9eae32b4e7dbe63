//! Shared argument handling and output helpers for CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use patchforge::{
    EngineConfig, HttpNetworkService, LocalFileManager, SessionSnapshot, VersionCoordinator,
    VersionEntry,
};

use crate::error::CliError;

/// Connection and file arguments shared by every engine command.
#[derive(Debug, Args)]
pub struct EngineArgs {
    /// Path to the asset file the patches target
    #[arg(short = 'f', long = "file")]
    pub target: PathBuf,

    /// Version server base URL
    #[arg(long)]
    pub server: Option<String>,

    /// Access token passed to the version server
    #[arg(short, long, default_value = "")]
    pub token: String,

    /// Directory for downloaded version payloads
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl EngineArgs {
    /// Build the engine configuration from the CLI arguments.
    pub fn config(&self) -> Result<EngineConfig, CliError> {
        if !self.target.is_file() {
            return Err(CliError::Config(format!(
                "target file not found: {}",
                self.target.display()
            )));
        }

        let mut config = EngineConfig::new(&self.target);
        if let Some(server) = &self.server {
            config = config.with_server_url(server);
        }
        if let Some(dir) = &self.data_dir {
            config = config.with_data_dir(dir);
        }
        Ok(config)
    }

    /// Build a coordinator backed by the real HTTP service and the
    /// local filesystem.
    pub fn coordinator(&self) -> Result<VersionCoordinator, CliError> {
        let config = self.config()?;
        let net = HttpNetworkService::with_timeout(config.server_url.clone(), config.timeout)?;
        Ok(VersionCoordinator::new(
            config,
            Arc::new(net),
            Arc::new(LocalFileManager::new()),
        ))
    }
}

/// One catalog row: version string plus status markers.
pub fn format_version_line(
    version: &VersionEntry,
    snapshot: &SessionSnapshot,
    downloaded: bool,
) -> String {
    let mut markers = Vec::new();
    if snapshot.applied_version.as_ref() == Some(version) {
        markers.push("applied");
    }
    if snapshot.selected_version.as_ref() == Some(version) {
        markers.push("selected");
    }
    if downloaded {
        markers.push("downloaded");
    }
    if version.is_unsubmitted {
        markers.push("unsubmitted");
    }

    if markers.is_empty() {
        format!("  {}", version.version)
    } else {
        format!("  {}  [{}]", version.version, markers.join(", "))
    }
}
