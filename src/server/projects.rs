use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::models::{
    DocType, ItemStatus, NewProjectDoc, NewProjectItem, Project, ProjectDoc, ProjectDocUpdate,
    ProjectItem, ProjectItemUpdate, ProjectUpdate,
};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateProject {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
}

/// A project with its items and documents.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub items: Vec<ProjectItem>,
    pub docs: Vec<ProjectDoc>,
}

async fn require_project(state: &AppState, id: &str) -> Result<Project> {
    state
        .repo
        .get_project(id)
        .await?
        .ok_or(AppError::NotFound("Project"))
}

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<Project>>> {
    Ok(Json(state.repo.list_projects(query.archived).await?))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateProject>,
) -> Result<(StatusCode, Json<Project>)> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let project = state
        .repo
        .create_project(name.to_string(), body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ProjectDetail>> {
    let project = require_project(&state, &id).await?;
    let items = state.repo.list_project_items(&id, None).await?;
    let docs = state.repo.list_project_docs(&id).await?;
    Ok(Json(ProjectDetail {
        project,
        items,
        docs,
    }))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<ProjectUpdate>,
) -> Result<Json<Project>> {
    let project = state
        .repo
        .update_project(&id, update)
        .await?
        .ok_or(AppError::NotFound("Project"))?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    if !state.repo.delete_project(&id).await? {
        return Err(AppError::NotFound("Project"));
    }
    Ok(Json(json!({ "success": true })))
}

// Items

#[derive(Debug, Default, Deserialize)]
pub struct ItemQuery {
    pub status: Option<ItemStatus>,
}

/// Load an item, treating one that belongs to another project as missing.
async fn require_item(state: &AppState, project_id: &str, item_id: &str) -> Result<ProjectItem> {
    state
        .repo
        .get_project_item(item_id)
        .await?
        .filter(|item| item.project_id == project_id)
        .ok_or(AppError::NotFound("Item"))
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ItemQuery>,
) -> Result<Json<Vec<ProjectItem>>> {
    require_project(&state, &id).await?;
    Ok(Json(state.repo.list_project_items(&id, query.status).await?))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(item): Json<NewProjectItem>,
) -> Result<(StatusCode, Json<ProjectItem>)> {
    require_project(&state, &id).await?;
    if item.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    let item = state.repo.create_project_item(&id, item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<ProjectItem>> {
    Ok(Json(require_item(&state, &id, &item_id).await?))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
    Json(update): Json<ProjectItemUpdate>,
) -> Result<Json<ProjectItem>> {
    require_item(&state, &id, &item_id).await?;
    let item = state
        .repo
        .update_project_item(&item_id, update)
        .await?
        .ok_or(AppError::NotFound("Item"))?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    require_item(&state, &id, &item_id).await?;
    if !state.repo.delete_project_item(&item_id).await? {
        return Err(AppError::NotFound("Item"));
    }
    Ok(Json(json!({ "success": true })))
}

// Docs

#[derive(Debug, Default, Deserialize)]
pub struct DocQuery {
    #[serde(rename = "type")]
    pub doc_type: Option<DocType>,
}

async fn require_doc(state: &AppState, project_id: &str, doc_id: &str) -> Result<ProjectDoc> {
    state
        .repo
        .get_project_doc(doc_id)
        .await?
        .filter(|doc| doc.project_id == project_id)
        .ok_or(AppError::NotFound("Document"))
}

/// All documents of a project, or the one of `?type=` when given.
pub async fn list_docs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DocQuery>,
) -> Result<Response> {
    require_project(&state, &id).await?;

    if let Some(doc_type) = query.doc_type {
        let doc = state
            .repo
            .get_project_doc_by_type(&id, doc_type)
            .await?
            .ok_or(AppError::NotFound("Document"))?;
        return Ok(Json(doc).into_response());
    }

    let docs = state.repo.list_project_docs(&id).await?;
    Ok(Json(docs).into_response())
}

pub async fn create_doc(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(doc): Json<NewProjectDoc>,
) -> Result<(StatusCode, Json<ProjectDoc>)> {
    require_project(&state, &id).await?;
    if doc.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    let doc = state.repo.create_project_doc(&id, doc).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn get_doc(
    State(state): State<Arc<AppState>>,
    Path((id, doc_id)): Path<(String, String)>,
) -> Result<Json<ProjectDoc>> {
    Ok(Json(require_doc(&state, &id, &doc_id).await?))
}

pub async fn update_doc(
    State(state): State<Arc<AppState>>,
    Path((id, doc_id)): Path<(String, String)>,
    Json(update): Json<ProjectDocUpdate>,
) -> Result<Json<ProjectDoc>> {
    require_doc(&state, &id, &doc_id).await?;
    let doc = state
        .repo
        .update_project_doc(&doc_id, update)
        .await?
        .ok_or(AppError::NotFound("Document"))?;
    Ok(Json(doc))
}

pub async fn delete_doc(
    State(state): State<Arc<AppState>>,
    Path((id, doc_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    require_doc(&state, &id, &doc_id).await?;
    if !state.repo.delete_project_doc(&doc_id).await? {
        return Err(AppError::NotFound("Document"));
    }
    Ok(Json(json!({ "success": true })))
}
