use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Result;

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DebugEntry {
    #[serde(default)]
    pub msg: String,
}

/// Best effort: a failed write is logged and still acknowledged.
pub async fn append_debug(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<DebugEntry>,
) -> Json<Value> {
    tracing::debug!(target: "chat_debug", "{}", entry.msg);
    if let Err(e) = state.debug_log.append(&entry.msg).await {
        tracing::error!("Failed to write debug log: {}", e);
    }
    Json(json!({ "ok": true }))
}

pub async fn list_debug(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let logs = state.debug_log.recent().await?;
    Ok(Json(json!({ "logs": logs })))
}

pub async fn clear_debug(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    state.debug_log.clear().await?;
    Ok(Json(json!({ "ok": true })))
}
