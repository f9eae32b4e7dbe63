//! Patchforge CLI - versioned binary patch management for user-owned
//! asset files.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{apply, delete, download, fetch, reset, status, versions};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "patchforge", version, about = "Manage versioned binary patches for an asset file")]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the local patch state of the target file
    Status(status::StatusArgs),
    /// Refresh the catalog and summarise the session
    Fetch(fetch::FetchArgs),
    /// Fetch the catalog and list available versions
    Versions(versions::VersionsArgs),
    /// Download a version's payload archive
    Download(download::DownloadArgs),
    /// Apply a downloaded version to the target file
    Apply(apply::ApplyArgs),
    /// Restore the target file from its pristine backup
    Reset(reset::ResetArgs),
    /// Delete a downloaded version payload
    Delete(delete::DeleteArgs),
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "patchforge=info",
        1 => "patchforge=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Status(args) => status::run(args),
        Commands::Fetch(args) => fetch::run(args).await,
        Commands::Versions(args) => versions::run(args).await,
        Commands::Download(args) => download::run(args).await,
        Commands::Apply(args) => apply::run(args).await,
        Commands::Reset(args) => reset::run(args).await,
        Commands::Delete(args) => delete::run(args).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = dispatch(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
