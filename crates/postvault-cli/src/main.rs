mod sync;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "postvault-cli")]
#[command(about = "Merge captured post snapshots into per-account archives")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge snapshots into their datasets and download referenced media
    Sync(SyncArgs),
}

#[derive(Debug, Default, Args)]
pub(crate) struct SyncArgs {
    /// Directory scanned for `*_tweets_raw.json` (overrides `POSTVAULT_INPUT_DIR`)
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Directory holding datasets and media (overrides `POSTVAULT_OUTPUT_DIR`)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Snapshot files to process instead of scanning the input directory
    snapshots: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = postvault_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Sync(args)) => sync::run_sync(&config, args).await,
        None => sync::run_sync(&config, SyncArgs::default()).await,
    }
}
