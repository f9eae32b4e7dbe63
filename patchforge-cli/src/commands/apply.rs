//! Apply command - patch the target file to a chosen version.

use clap::Args;

use super::common::EngineArgs;
use crate::error::CliError;

/// Arguments for the apply command.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Version to apply (e.g. 1.2.0)
    pub version: String,
}

/// Run the apply command.
pub async fn run(args: ApplyArgs) -> Result<(), CliError> {
    let coordinator = args.engine.coordinator()?;

    coordinator.fetch(&args.engine.token).await?;
    let version = coordinator
        .find_version(&args.version)
        .ok_or_else(|| CliError::UnknownVersion(args.version.clone()))?;

    if !coordinator.layout().is_downloaded(&version) {
        return Err(CliError::Config(format!(
            "version {} is not downloaded. Run 'patchforge download {}' first.",
            version.version, version.version
        )));
    }

    println!("Applying {}...", version.version);
    coordinator.apply(Some(version.clone())).await?;

    let snapshot = coordinator.snapshot();
    match &snapshot.applied_version {
        Some(v) if v == &version => println!("Applied {}.", v.version),
        Some(v) => println!(
            "Applied, but the file now matches {} instead of {}.",
            v.version, version.version
        ),
        None => println!(
            "Patch written, but the result does not match any catalog entry."
        ),
    }
    Ok(())
}
