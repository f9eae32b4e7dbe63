//! Fetch command - refresh the catalog and summarise the session.

use clap::Args;

use super::common::EngineArgs;
use crate::error::CliError;

/// Arguments for the fetch command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Run the fetch command.
pub async fn run(args: FetchArgs) -> Result<(), CliError> {
    let coordinator = args.engine.coordinator()?;
    coordinator.fetch(&args.engine.token).await?;

    let snapshot = coordinator.snapshot();
    match snapshot.catalog_len {
        Some(count) => println!("Fetched {} version(s).", count),
        None => println!("No catalog available for this file."),
    }
    if let Some(v) = &snapshot.applied_version {
        println!("Applied:  {}", v.version);
    }
    if let Some(v) = &snapshot.selected_version {
        println!("Selected: {}", v.version);
    }
    Ok(())
}
