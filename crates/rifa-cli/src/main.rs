//! Rifa CLI - Command-line interface for tracking raffle ticket sales
//!
//! Reserve numbers, record manual sales and keep the remote sheet in sync.

mod cli;
mod commands;
mod config;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::add::run_add;
use crate::commands::admin::run_admin;
use crate::commands::available::run_available;
use crate::commands::completions::run_completions;
use crate::commands::export::run_export;
use crate::commands::list::run_list;
use crate::commands::remove::run_remove;
use crate::commands::reserve::run_reserve;
use crate::commands::stats::run_stats;
use crate::commands::status::run_status;
use crate::commands::sync::{run_pull, run_sync, run_sync_conflicts};
use crate::commands::watch::run_watch;
use crate::config::AppContext;
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVE: &str = "rifa=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    // Completions need neither config nor database.
    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let ctx = AppContext::load(cli.db_path, cli.config)?;

    match cli.command {
        Commands::Reserve {
            group,
            number,
            name,
            phone,
        } => run_reserve(&ctx, &group, number, name, phone).await?,
        Commands::Add {
            group,
            number,
            name,
            phone,
            status,
        } => run_add(&ctx, &group, number, name, phone, status.as_deref()).await?,
        Commands::List { group, json } => run_list(&ctx, group.as_deref(), json).await?,
        Commands::Available { group, json } => run_available(&ctx, &group, json).await?,
        Commands::Remove { id } => run_remove(&ctx, &id).await?,
        Commands::Status { id, status } => run_status(&ctx, &id, &status).await?,
        Commands::Stats { json } => run_stats(&ctx, json).await?,
        Commands::Export { format, output } => {
            run_export(&ctx, format, output.as_deref()).await?;
        }
        Commands::Sync { command } => match command {
            Some(SyncCommands::Conflicts { json }) => run_sync_conflicts(&ctx, json).await?,
            None => run_sync(&ctx).await?,
        },
        Commands::Pull => run_pull(&ctx).await?,
        Commands::Watch => run_watch(&ctx).await?,
        Commands::Admin { command } => run_admin(&ctx, command)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = DEFAULT_LOG_DIRECTIVE.parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
