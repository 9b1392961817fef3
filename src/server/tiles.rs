use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::models::{FilterMode, NewTile, Tile, TileUpdate};
use crate::services::save_screenshot;

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TileQuery {
    #[serde(rename = "type")]
    pub tile_type: Option<String>,
    pub filter: Option<FilterMode>,
    /// Legacy switch for `filter=all`.
    #[serde(default)]
    pub archived: bool,
    pub q: Option<String>,
}

pub async fn list_tiles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TileQuery>,
) -> Result<Json<Vec<Tile>>> {
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        return Ok(Json(state.repo.search_tiles(q).await?));
    }

    let mode = query.filter.unwrap_or(if query.archived {
        FilterMode::All
    } else {
        FilterMode::New
    });
    let tiles = state.repo.list_tiles(query.tile_type, mode).await?;
    Ok(Json(tiles))
}

pub async fn create_tile(
    State(state): State<Arc<AppState>>,
    Json(tile): Json<NewTile>,
) -> Result<(StatusCode, Json<Tile>)> {
    if tile.tile_type.trim().is_empty() || tile.content.is_null() {
        return Err(AppError::Validation(
            "type and content are required".to_string(),
        ));
    }

    let tile = state.repo.create_tile(tile).await?;
    Ok((StatusCode::CREATED, Json(tile)))
}

pub async fn get_tile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Tile>> {
    let tile = state
        .repo
        .get_tile(&id)
        .await?
        .ok_or(AppError::NotFound("Tile"))?;
    Ok(Json(tile))
}

pub async fn update_tile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<TileUpdate>,
) -> Result<Json<Tile>> {
    let tile = state
        .repo
        .update_tile(&id, update)
        .await?
        .ok_or(AppError::NotFound("Tile"))?;
    Ok(Json(tile))
}

pub async fn delete_tile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    if !state.repo.delete_tile(&id).await? {
        return Err(AppError::NotFound("Tile"));
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(default)]
    pub text: String,
    pub screenshot: Option<String>,
    pub url: Option<String>,
    pub user_agent: Option<String>,
}

/// Store user feedback as a `feedback` tile, saving any attached screenshot.
pub async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Json(feedback): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    if feedback.text.trim().is_empty() {
        return Err(AppError::Validation("text is required".to_string()));
    }

    let screenshot = match feedback.screenshot.as_deref().filter(|s| !s.is_empty()) {
        Some(data) => Some(
            save_screenshot(&state.screenshots_dir, data)
                .await?
                .to_string_lossy()
                .into_owned(),
        ),
        None => None,
    };

    let tile = state
        .repo
        .create_tile(NewTile {
            id: None,
            tile_type: "feedback".to_string(),
            content: json!({
                "text": feedback.text,
                "screenshot": screenshot,
                "url": feedback.url,
                "userAgent": feedback.user_agent,
            }),
            source: Some("dashboard".to_string()),
            tags: vec!["feedback".to_string()],
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": tile.id })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testing;
    use base64::Engine;

    fn new_tile(tile_type: &str, content: Value) -> NewTile {
        NewTile {
            id: None,
            tile_type: tile_type.to_string(),
            content,
            source: None,
            tags: vec!["a".to_string(), "b".to_string()],
        }
    }

    #[tokio::test]
    async fn create_list_and_archive() {
        let (state, _dir) = testing::state().await;

        let (status, Json(tile)) = create_tile(
            State(state.clone()),
            Json(new_tile("note", json!({"text": "hello"}))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tile.tags, vec!["a", "b"]);

        let update: TileUpdate = serde_json::from_str(r#"{"archived": true}"#).unwrap();
        update_tile(State(state.clone()), Path(tile.id.clone()), Json(update))
            .await
            .unwrap();

        let Json(fresh) = list_tiles(State(state.clone()), Query(TileQuery::default()))
            .await
            .unwrap();
        assert!(fresh.is_empty());

        let Json(all) = list_tiles(
            State(state),
            Query(TileQuery {
                archived: true,
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn create_requires_type_and_content() {
        let (state, _dir) = testing::state().await;
        let err = create_tile(State(state), Json(new_tile("note", Value::Null)))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn feedback_saves_screenshot_and_tile() {
        let (state, _dir) = testing::state().await;
        let screenshot = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(b"png bytes")
        );

        let (status, Json(body)) = submit_feedback(
            State(state.clone()),
            Json(FeedbackRequest {
                text: "Button is broken".to_string(),
                screenshot: Some(screenshot),
                url: Some("/todos".to_string()),
                user_agent: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);

        let id = body["id"].as_str().unwrap().to_string();
        let Json(tile) = get_tile(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(tile.tile_type, "feedback");
        assert_eq!(tile.source.as_deref(), Some("dashboard"));
        assert_eq!(tile.tags, vec!["feedback"]);
        assert_eq!(tile.content["url"], "/todos");

        let path = tile.content["screenshot"].as_str().unwrap();
        assert!(std::path::Path::new(path).starts_with(&state.screenshots_dir));
        assert_eq!(std::fs::read(path).unwrap(), b"png bytes");
    }

    #[tokio::test]
    async fn missing_tile_is_not_found() {
        let (state, _dir) = testing::state().await;
        let err = get_tile(State(state), Path("nope".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("Tile")));
    }
}
