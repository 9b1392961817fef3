use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::db::TodoFilter;
use crate::error::{AppError, Result};
use crate::intent::{parse_intent, Intent, TodoRef, RODION};
use crate::models::{NewTodo, Todo, TodoUpdate};

use super::AppState;

const UNCLEAR_HELP: &str = "I couldn't understand that. Try something like 'call dentist tomorrow' or 'done with the dentist call'";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoQuery {
    pub assignee: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(alias = "project_item_id")]
    pub project_item_id: Option<String>,
    pub q: Option<String>,
    /// Open todos due within this many days.
    pub due_within: Option<i64>,
}

pub async fn list_todos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TodoQuery>,
) -> Result<Json<Vec<Todo>>> {
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        return Ok(Json(state.repo.search_todos(q).await?));
    }
    if let Some(days) = query.due_within {
        let today = Local::now().date_naive();
        return Ok(Json(state.repo.todos_due_soon(today, days).await?));
    }

    let todos = state
        .repo
        .list_todos(TodoFilter {
            assignee: query.assignee,
            project_item_id: query.project_item_id,
            include_completed: query.completed,
        })
        .await?;
    Ok(Json(todos))
}

pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    Json(mut todo): Json<NewTodo>,
) -> Result<(StatusCode, Json<Todo>)> {
    todo.title = todo.title.trim().to_string();
    if todo.title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    let todo = state.repo.create_todo(todo).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn get_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Todo>> {
    let todo = state
        .repo
        .get_todo(&id)
        .await?
        .ok_or(AppError::NotFound("Todo"))?;
    Ok(Json(todo))
}

pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<TodoUpdate>,
) -> Result<Json<Todo>> {
    if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }

    let todo = state
        .repo
        .update_todo(&id, update)
        .await?
        .ok_or(AppError::NotFound("Todo"))?;
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    if !state.repo.delete_todo(&id).await? {
        return Err(AppError::NotFound("Todo"));
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct SmartRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SmartResponse {
    pub action: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub todo: Option<Todo>,
}

impl SmartResponse {
    fn unclear(message: &str) -> Self {
        Self {
            action: "unclear",
            message: message.to_string(),
            todo: None,
        }
    }
}

fn due_suffix(due_date: Option<NaiveDate>) -> String {
    due_date
        .map(|date| format!(" - due {}", date))
        .unwrap_or_default()
}

/// Interpret free text as a create, complete or reschedule command and apply it.
pub async fn smart_todo(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SmartRequest>,
) -> Result<Json<SmartResponse>> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("text is required".to_string()));
    }

    let open_todos: Vec<TodoRef> = state
        .repo
        .open_todo_titles()
        .await?
        .into_iter()
        .map(|(id, title)| TodoRef { id, title })
        .collect();
    let today = Local::now().date_naive();

    let intent = parse_intent(text, &open_todos, today);
    tracing::debug!("Smart todo {:?} -> {:?}", text, intent);

    let response = match intent {
        Intent::Complete { todo_id } => match state.repo.complete_todo(&todo_id).await? {
            Some(todo) => SmartResponse {
                action: "completed",
                message: format!("Marked \"{}\" as done", todo.title),
                todo: Some(todo),
            },
            None => SmartResponse::unclear("Couldn't find a matching todo to complete"),
        },
        Intent::Update { todo_id, due_date } => {
            let update = TodoUpdate {
                due_date: due_date.map(Some),
                ..Default::default()
            };
            match state.repo.update_todo(&todo_id, update).await? {
                Some(todo) => SmartResponse {
                    action: "updated",
                    message: format!("Updated \"{}\"{}", todo.title, due_suffix(due_date)),
                    todo: Some(todo),
                },
                None => SmartResponse::unclear("Couldn't find a matching todo to update"),
            }
        }
        Intent::Create {
            title,
            assignee,
            due_date,
        } => {
            let todo = state
                .repo
                .create_todo(NewTodo {
                    title,
                    assignee: Some(assignee),
                    created_by: Some(RODION.to_string()),
                    due_date,
                    project_item_id: None,
                })
                .await?;
            SmartResponse {
                action: "created",
                message: format!(
                    "Created \"{}\" for {}{}",
                    todo.title,
                    todo.assignee,
                    due_suffix(todo.due_date)
                ),
                todo: Some(todo),
            }
        }
        Intent::Unclear => SmartResponse::unclear(UNCLEAR_HELP),
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::testing;

    fn smart(text: &str) -> Json<SmartRequest> {
        Json(SmartRequest {
            text: text.to_string(),
        })
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let (state, _dir) = testing::state().await;

        let (status, Json(created)) =
            create_todo(State(state.clone()), Json(NewTodo::new("  Buy milk ")))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.title, "Buy milk");
        assert_eq!(created.assignee, "coby");

        let update: TodoUpdate = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        let Json(done) = update_todo(State(state.clone()), Path(created.id.clone()), Json(update))
            .await
            .unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());

        let Json(open) = list_todos(State(state.clone()), Query(TodoQuery::default()))
            .await
            .unwrap();
        assert!(open.is_empty());

        delete_todo(State(state.clone()), Path(created.id.clone()))
            .await
            .unwrap();
        let err = get_todo(State(state), Path(created.id)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Todo")));
    }

    #[tokio::test]
    async fn create_requires_title() {
        let (state, _dir) = testing::state().await;
        let err = create_todo(State(state), Json(NewTodo::new("   ")))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn huge_due_within_is_a_bad_request() {
        let (state, _dir) = testing::state().await;
        let query = TodoQuery {
            due_within: Some(i64::MAX),
            ..Default::default()
        };
        let err = list_todos(State(state), Query(query)).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_todo_is_not_found() {
        let (state, _dir) = testing::state().await;
        let err = update_todo(
            State(state.clone()),
            Path("missing".to_string()),
            Json(TodoUpdate::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = delete_todo(State(state), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn smart_create_then_complete() {
        let (state, _dir) = testing::state().await;

        let Json(created) = smart_todo(State(state.clone()), smart("call dentist tomorrow"))
            .await
            .unwrap();
        assert_eq!(created.action, "created");
        let todo = created.todo.unwrap();
        assert_eq!(todo.title, "Call dentist");
        assert_eq!(todo.assignee, "rodion");
        assert_eq!(todo.created_by, "rodion");
        let tomorrow = Local::now().date_naive() + chrono::Duration::days(1);
        assert_eq!(todo.due_date, Some(tomorrow));
        assert_eq!(
            created.message,
            format!("Created \"Call dentist\" for rodion - due {}", tomorrow)
        );

        let Json(completed) =
            smart_todo(State(state.clone()), smart("done with the dentist call"))
                .await
                .unwrap();
        assert_eq!(completed.action, "completed");
        assert_eq!(completed.message, "Marked \"Call dentist\" as done");
        assert_eq!(completed.todo.unwrap().id, todo.id);
    }

    #[tokio::test]
    async fn smart_unclear_is_not_an_error() {
        let (state, _dir) = testing::state().await;
        let Json(response) = smart_todo(State(state.clone()), smart("finished the taxes"))
            .await
            .unwrap();
        assert_eq!(response.action, "unclear");
        assert_eq!(response.message, UNCLEAR_HELP);
        assert!(response.todo.is_none());

        let err = smart_todo(State(state), smart("  ")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn smart_reschedule_updates_due_date() {
        let (state, _dir) = testing::state().await;
        create_todo(State(state.clone()), Json(NewTodo::new("Quarterly report")))
            .await
            .unwrap();

        let Json(response) = smart_todo(
            State(state.clone()),
            smart("push the quarterly report to tomorrow"),
        )
        .await
        .unwrap();
        assert_eq!(response.action, "updated");
        let tomorrow = Local::now().date_naive() + chrono::Duration::days(1);
        assert_eq!(response.todo.unwrap().due_date, Some(tomorrow));
    }
}
