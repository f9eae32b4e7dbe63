//! Download command - fetch a version's payload archive and install it
//! into the local data directory.

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::common::EngineArgs;
use crate::error::CliError;

/// Arguments for the download command.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Version to download (e.g. 1.2.0)
    pub version: String,

    /// Apply the version immediately after downloading
    #[arg(long)]
    pub apply: bool,
}

/// Run the download command.
pub async fn run(args: DownloadArgs) -> Result<(), CliError> {
    let coordinator = args.engine.coordinator()?;

    // The catalog is fetched first so the version string can be
    // resolved to a full entry.
    coordinator.fetch(&args.engine.token).await?;
    let version = coordinator
        .find_version(&args.version)
        .ok_or_else(|| CliError::UnknownVersion(args.version.clone()))?;

    if coordinator.layout().is_downloaded(&version) && !args.apply {
        println!("Version {} is already downloaded.", version.version);
        return Ok(());
    }

    // Ctrl-C cancels the transfer; partial files are cleaned up by the
    // engine.
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        debug!(error = %e, "could not install interrupt handler");
    }

    println!("Downloading {}...", version.version);
    coordinator
        .download(version.clone(), args.apply, &args.engine.token, cancel)
        .await?;

    if args.apply {
        println!("Downloaded and applied {}.", version.version);
    } else {
        println!("Downloaded {}.", version.version);
    }
    Ok(())
}
