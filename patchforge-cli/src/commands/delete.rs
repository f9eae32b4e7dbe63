//! Delete command - remove a downloaded version payload from disk.

use clap::Args;
use patchforge::VersionEntry;

use super::common::EngineArgs;
use crate::error::CliError;

/// Arguments for the delete command.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Version to delete (e.g. 1.2.0)
    pub version: String,

    /// Base asset identifier the payload was downloaded for
    #[arg(long, default_value = "default")]
    pub base_id: String,
}

/// Run the delete command.
pub async fn run(args: DeleteArgs) -> Result<(), CliError> {
    let coordinator = args.engine.coordinator()?;

    // Deletion is local; prefer the catalog entry when the server is
    // reachable, fall back to the supplied coordinates otherwise.
    let version = match coordinator.fetch(&args.engine.token).await {
        Ok(()) => coordinator
            .find_version(&args.version)
            .ok_or_else(|| CliError::UnknownVersion(args.version.clone()))?,
        Err(_) => VersionEntry::new(&args.version, &args.base_id),
    };

    if !coordinator.layout().is_downloaded(&version) {
        println!("Version {} is not downloaded; nothing to delete.", args.version);
        return Ok(());
    }

    coordinator.delete(version).await?;
    println!("Deleted {}.", args.version);
    Ok(())
}
