//! Versions command - fetch the catalog and list what is available.

use clap::Args;

use super::common::{format_version_line, EngineArgs};
use crate::error::CliError;

/// Arguments for the versions command.
#[derive(Debug, Args)]
pub struct VersionsArgs {
    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Run the versions command.
pub async fn run(args: VersionsArgs) -> Result<(), CliError> {
    let coordinator = args.engine.coordinator()?;
    coordinator.fetch(&args.engine.token).await?;

    let snapshot = coordinator.snapshot();
    let Some(count) = snapshot.catalog_len else {
        println!("No catalog available for this file.");
        return Ok(());
    };

    println!("{} version(s) available:", count);
    for version in coordinator.catalog_versions() {
        let downloaded = coordinator.layout().is_downloaded(&version);
        println!("{}", format_version_line(&version, &snapshot, downloaded));
    }

    match &snapshot.applied_version {
        Some(v) => println!("\nCurrently applied: {}", v.version),
        None => println!("\nCurrently applied: none detected"),
    }

    Ok(())
}
