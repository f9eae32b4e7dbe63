//! Status command - report local file state without touching the network.

use clap::Args;
use patchforge::{backup, identity};

use super::common::EngineArgs;
use crate::error::CliError;

/// Arguments for the status command.
#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub engine: EngineArgs,
}

/// Run the status command.
pub fn run(args: StatusArgs) -> Result<(), CliError> {
    let config = args.engine.config()?;
    let target = &config.target_file;

    println!("Target:   {}", target.display());

    let has_backup = backup::backup_exists(target);
    if has_backup {
        println!("Backup:   {}", backup::backup_path(target).display());
    } else {
        println!("Backup:   (none - file is unpatched)");
    }

    match identity::identity_hash(target)? {
        Some(hash) => println!("Identity: {}", hash),
        None => println!("Identity: (target file missing)"),
    }

    if has_backup {
        match identity::current_hash(target)? {
            Some(hash) => println!("Current:  {}", hash),
            None => println!("Current:  (target file missing)"),
        }
    }

    println!("Server:   {}", config.server_url);
    println!("Data:     {}", config.data_dir.display());

    Ok(())
}
