//! murmur CLI - housekeeping for transcription files and filter presets
//!
//! Finds duplicate recordings, applies the retention policy, and moves saved
//! filter presets in and out of the local store.

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::common::resolve_db_path;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::duplicates::run_duplicates;
use crate::commands::files::run_files;
use crate::commands::presets::run_presets;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "murmur=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Files { command } => run_files(command, &db_path).await?,
        Commands::Duplicates { json, csv, delete } => {
            run_duplicates(json, csv.as_deref(), delete, &db_path).await?;
        }
        Commands::Presets { command } => run_presets(command, &db_path).await?,
        Commands::Config { command } => run_config(command, &db_path)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}
