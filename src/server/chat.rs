use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::ai::ChatMessage;
use crate::error::{AppError, Result};
use crate::models::{Message, Role};

use super::AppState;

const DEFAULT_MESSAGE_LIMIT: u32 = 100;
const NO_RESPONSE: &str = "No response";

type EventSender = mpsc::Sender<std::result::Result<Event, Infallible>>;

#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<Vec<Message>>> {
    let limit = query.limit.unwrap_or(DEFAULT_MESSAGE_LIMIT);
    Ok(Json(state.repo.recent_messages(limit).await?))
}

pub async fn create_message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMessage>,
) -> Result<(StatusCode, Json<Message>)> {
    if body.role.is_empty() || body.content.is_empty() {
        return Err(AppError::Validation(
            "role and content are required".to_string(),
        ));
    }
    let role: Role = body
        .role
        .parse()
        .map_err(|_| AppError::Validation("role must be user or assistant".to_string()))?;

    let message = state.repo.create_message(role, body.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn clear_messages(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let deleted = state.repo.delete_all_messages().await?;
    tracing::info!("Cleared {} chat messages", deleted);
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatReply {
    user_message: Message,
    assistant_message: Message,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatFailure {
    error: String,
    user_message: Message,
}

/// Persist the user's message and forward the recent conversation to the
/// gateway, either as one JSON reply or as an SSE stream.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }

    let user_message = state
        .repo
        .create_message(Role::User, request.content)
        .await?;
    let context: Vec<ChatMessage> = state
        .repo
        .recent_messages(state.chat_context_messages)
        .await?
        .iter()
        .map(ChatMessage::from)
        .collect();

    if request.stream {
        return Ok(stream_reply(state, user_message, context).into_response());
    }

    match state.gateway.complete(&context, None).await {
        Ok(content) => {
            let assistant_message = state.repo.create_message(Role::Assistant, content).await?;
            Ok(Json(ChatReply {
                user_message,
                assistant_message,
            })
            .into_response())
        }
        Err(e) => {
            tracing::error!("Gateway request failed: {}", e);
            let failure = ChatFailure {
                error: e.public_message(),
                user_message,
            };
            Ok((StatusCode::BAD_GATEWAY, Json(failure)).into_response())
        }
    }
}

fn stream_reply(
    state: Arc<AppState>,
    user_message: Message,
    context: Vec<ChatMessage>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(relay(state, user_message, context, tx));
    Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default())
}

fn json_event<T: Serialize>(name: &str, data: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(data)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

fn error_event(err: &AppError) -> Event {
    json_event("error", &json!({ "error": err.public_message() }))
}

/// Pump gateway deltas into the SSE channel. Returns as soon as the client
/// side is gone, which drops the upstream response.
async fn relay(
    state: Arc<AppState>,
    user_message: Message,
    context: Vec<ChatMessage>,
    tx: EventSender,
) {
    if tx.send(Ok(json_event("user", &user_message))).await.is_err() {
        return;
    }

    let mut upstream = match state.gateway.stream(&context).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::error!("Gateway stream failed: {}", e);
            let _ = tx.send(Ok(error_event(&e))).await;
            return;
        }
    };

    let mut reply = String::new();
    loop {
        let next = tokio::select! {
            _ = tx.closed() => {
                tracing::debug!("Chat client disconnected, dropping upstream");
                return;
            }
            next = upstream.next_delta() => next,
        };

        match next {
            Ok(Some(delta)) => {
                reply.push_str(&delta);
                let event = json_event("delta", &json!({ "content": delta }));
                if tx.send(Ok(event)).await.is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Gateway stream interrupted: {}", e);
                let _ = tx.send(Ok(error_event(&e))).await;
                return;
            }
        }
    }

    if reply.is_empty() {
        reply = NO_RESPONSE.to_string();
    }
    let event = match state.repo.create_message(Role::Assistant, reply).await {
        Ok(assistant_message) => json_event("done", &assistant_message),
        Err(e) => {
            tracing::error!("Failed to store assistant reply: {}", e);
            error_event(&e)
        }
    };
    let _ = tx.send(Ok(event)).await;
}
