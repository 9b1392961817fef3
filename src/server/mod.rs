//! JSON HTTP API over the repository, the chat gateway and the file stores.

mod chat;
mod debug;
mod error;
mod now;
mod projects;
mod tiles;
mod todos;
mod voice;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ai::{GatewayClient, SpeechClient};
use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::services::{DebugLog, NowStore, QuoteStore};

/// Screenshots and voice clips are carried in request bodies.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub struct AppState {
    pub repo: Repository,
    pub gateway: GatewayClient,
    /// Absent when no OpenAI API key is configured.
    pub speech: Option<SpeechClient>,
    pub now: NowStore,
    pub quotes: QuoteStore,
    pub debug_log: DebugLog,
    pub screenshots_dir: PathBuf,
    pub chat_context_messages: u32,
}

impl AppState {
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.ensure_data_dir()?;

        let repo = Repository::new(&config.db_path().to_string_lossy()).await?;
        let speech = match &config.openai_api_key {
            Some(key) => Some(SpeechClient::new(key.clone())?),
            None => {
                tracing::warn!("OPENAI_API_KEY not set, voice endpoint disabled");
                None
            }
        };

        Ok(Self {
            repo,
            gateway: GatewayClient::new(config)?,
            speech,
            now: NowStore::new(config.now_path()),
            quotes: QuoteStore::new(config.quotes_path()),
            debug_log: DebugLog::new(config.debug_log_path()),
            screenshots_dir: config.screenshots_dir(),
            chat_context_messages: config.chat_context_messages,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route("/todos/smart", post(todos::smart_todo))
        .route(
            "/todos/{id}",
            get(todos::get_todo)
                .patch(todos::update_todo)
                .delete(todos::delete_todo),
        )
        .route("/tiles", get(tiles::list_tiles).post(tiles::create_tile))
        .route(
            "/tiles/{id}",
            get(tiles::get_tile)
                .patch(tiles::update_tile)
                .delete(tiles::delete_tile),
        )
        .route("/feedback", post(tiles::submit_feedback))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/projects/{id}/items",
            get(projects::list_items).post(projects::create_item),
        )
        .route(
            "/projects/{id}/items/{item_id}",
            get(projects::get_item)
                .patch(projects::update_item)
                .delete(projects::delete_item),
        )
        .route(
            "/projects/{id}/docs",
            get(projects::list_docs).post(projects::create_doc),
        )
        .route(
            "/projects/{id}/docs/{doc_id}",
            get(projects::get_doc)
                .patch(projects::update_doc)
                .delete(projects::delete_doc),
        )
        .route(
            "/messages",
            get(chat::list_messages)
                .post(chat::create_message)
                .delete(chat::clear_messages),
        )
        .route("/chat", post(chat::chat))
        .route("/voice", post(voice::voice))
        .route("/now", get(now::get_now).post(now::update_now))
        .route("/quotes", get(now::list_quotes).post(now::add_quote))
        .route(
            "/debug",
            get(debug::list_debug)
                .post(debug::append_debug)
                .delete(debug::clear_debug),
        );

    Router::new()
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// State over an in-memory database and a temp data directory. The
    /// gateway points at a closed local port so chat calls fail fast.
    pub async fn state() -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            gateway_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            ..Config::default()
        };

        let state = AppState {
            repo: Repository::open_in_memory().await.unwrap(),
            gateway: GatewayClient::new(&config).unwrap(),
            speech: None,
            now: NowStore::new(config.now_path()),
            quotes: QuoteStore::new(config.quotes_path()),
            debug_log: DebugLog::new(config.debug_log_path()),
            screenshots_dir: config.screenshots_dir(),
            chat_context_messages: config.chat_context_messages,
        };
        (Arc::new(state), dir)
    }
}
