use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use agent_dashboard::config::Config;
use agent_dashboard::error::{AppError, Result};
use agent_dashboard::server::{self, AppState};

#[derive(Debug, Parser)]
#[command(name = "agent-dashboard", version, about = "Agent dashboard API server")]
struct Cli {
    /// Config file (default: <config dir>/agent-dashboard/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding `bind_addr`
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    agent_dashboard::init_logging();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let addr = match cli.bind {
        Some(addr) => addr,
        None => config.bind_addr.parse().map_err(|e| {
            AppError::Config(format!("invalid bind_addr {:?}: {}", config.bind_addr, e))
        })?,
    };

    tracing::info!("Data directory: {}", config.data_dir.display());
    let state = AppState::from_config(&config).await?;

    server::serve(Arc::new(state), addr).await
}
