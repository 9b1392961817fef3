//! Reconcile local todos with a GitHub Project board through the `gh` CLI.
//! The board wins on conflicts; `--push` also uploads local-only todos.

use std::path::PathBuf;

use clap::Parser;

use agent_dashboard::config::Config;
use agent_dashboard::db::Repository;
use agent_dashboard::error::Result;
use agent_dashboard::sync::{self, GhCli};

#[derive(Debug, Parser)]
#[command(name = "sync-github", version, about = "Sync GitHub Project items with dashboard todos")]
struct Cli {
    /// Project number (default from config)
    #[arg(long)]
    project: Option<String>,

    /// Project owner (default from config)
    #[arg(long)]
    owner: Option<String>,

    /// Create board items for open todos that have none
    #[arg(long)]
    push: bool,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    agent_dashboard::init_logging();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.ensure_data_dir()?;

    let project = cli.project.unwrap_or_else(|| config.github_project.clone());
    let owner = cli.owner.unwrap_or_else(|| config.github_owner.clone());
    tracing::info!("GitHub Project #{} (owner: {})", project, owner);

    let repo = Repository::new(&config.db_path().to_string_lossy()).await?;
    let board = GhCli::new(project, owner);

    let pulled = sync::pull(&repo, &board).await?;
    tracing::info!(
        "Pulled: created {}, updated {}, removed {}",
        pulled.created,
        pulled.updated,
        pulled.removed
    );

    if cli.push {
        let pushed = sync::push(&repo, &board).await?;
        tracing::info!("Pushed: {} items ({} failed)", pushed.pushed, pushed.failed);
    }

    tracing::info!("Sync complete");
    Ok(())
}
