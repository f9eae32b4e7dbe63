//! Reset command - restore the target file from its pristine backup.

use clap::Args;

use super::common::EngineArgs;
use crate::error::CliError;

/// Arguments for the reset command.
#[derive(Debug, Args)]
pub struct ResetArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Fetch the catalog first so default assets can be reapplied
    #[arg(long)]
    pub fetch: bool,
}

/// Run the reset command.
pub async fn run(args: ResetArgs) -> Result<(), CliError> {
    let coordinator = args.engine.coordinator()?;

    // An up-to-date catalog lets the engine pick the right default
    // asset set for the restored file; the restore itself is local.
    if args.fetch {
        coordinator.fetch(&args.engine.token).await?;
    }

    println!("Restoring original file...");
    coordinator.reset().await?;
    println!("Restored.");
    Ok(())
}
