use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::nullable;

pub const DEFAULT_ASSIGNEE: &str = "coby";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub assignee: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub due_date: Option<NaiveDate>,
    pub project_item_id: Option<String>,
    pub github_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub project_item_id: Option<String>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Fields a PATCH may touch. `completed` is applied through
/// complete/uncomplete so `completed_at` stays consistent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub assignee: Option<String>,
    #[serde(default, deserialize_with = "nullable", alias = "dueDate")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable", alias = "projectItemId")]
    pub project_item_id: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TodoUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.assignee.is_none()
            && self.due_date.is_none()
            && self.project_item_id.is_none()
            && self.completed.is_none()
    }
}
