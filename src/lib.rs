//! Backend for a personal agent dashboard: todos, content tiles, project
//! tracking, chat and voice proxies, and GitHub Project sync over a local
//! SQLite database.

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod intent;
pub mod models;
pub mod server;
pub mod services;
pub mod sync;

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}
