use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use crate::error::{AppError, Result};
use crate::models::{NewTodo, Todo, TodoUpdate, DEFAULT_ASSIGNEE};

use super::repository::{
    format_date, new_id, optional_text, optional_timestamp, parse_date, text, timestamp,
    update_fields, Repository,
};

const TODO_COLUMNS: &str = "id, title, assignee, completed, created_at, completed_at, created_by, due_date, project_item_id, github_id";

/// Creator recorded on todos inserted by the GitHub reconciliation.
pub const SYNC_CREATOR: &str = "github-sync";

#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    pub assignee: Option<String>,
    pub project_item_id: Option<String>,
    pub include_completed: bool,
}

/// A remote board item as the store sees it.
#[derive(Debug, Clone)]
pub struct LinkedTodo {
    pub github_id: String,
    pub title: String,
    pub assignee: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PullStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

impl Repository {
    pub async fn list_todos(&self, filter: TodoFilter) -> Result<Vec<Todo>> {
        let todos = self
            .conn
            .call(move |conn| {
                let mut clauses: Vec<&str> = Vec::new();
                let mut values: Vec<String> = Vec::new();

                if let Some(assignee) = filter.assignee {
                    clauses.push("assignee = ?");
                    values.push(assignee);
                }
                if let Some(item_id) = filter.project_item_id {
                    clauses.push("project_item_id = ?");
                    values.push(item_id);
                }
                if !filter.include_completed {
                    clauses.push("completed = 0");
                }

                let where_sql = if clauses.is_empty() {
                    String::new()
                } else {
                    format!("WHERE {}", clauses.join(" AND "))
                };
                let sql = format!(
                    "SELECT {} FROM todos {} ORDER BY completed ASC, created_at DESC, rowid DESC",
                    TODO_COLUMNS, where_sql
                );

                let mut stmt = conn.prepare(&sql)?;
                let todos = stmt
                    .query_map(rusqlite::params_from_iter(values), todo_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(todos)
            })
            .await?;
        Ok(todos)
    }

    /// `(id, title)` of every open todo, newest first. Input for the intent parser.
    pub async fn open_todo_titles(&self) -> Result<Vec<(String, String)>> {
        let todos = self.list_todos(TodoFilter::default()).await?;
        Ok(todos.into_iter().map(|t| (t.id, t.title)).collect())
    }

    pub async fn search_todos(&self, query: &str) -> Result<Vec<Todo>> {
        let pattern = format!("%{}%", query.to_lowercase());
        let todos = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM todos WHERE completed = 0 AND LOWER(title) LIKE ?1 ORDER BY created_at DESC",
                    TODO_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let todos = stmt
                    .query_map(params![pattern], todo_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(todos)
            })
            .await?;
        Ok(todos)
    }

    /// Open todos with a due date no later than `today + within_days`.
    pub async fn todos_due_soon(&self, today: NaiveDate, within_days: i64) -> Result<Vec<Todo>> {
        let horizon = chrono::TimeDelta::try_days(within_days)
            .and_then(|delta| today.checked_add_signed(delta))
            .map(format_date)
            .ok_or_else(|| AppError::Validation(format!("dueWithin out of range: {}", within_days)))?;
        let todos = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM todos WHERE completed = 0 AND due_date IS NOT NULL AND date(due_date) <= date(?1) ORDER BY due_date ASC",
                    TODO_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let todos = stmt
                    .query_map(params![horizon], todo_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(todos)
            })
            .await?;
        Ok(todos)
    }

    pub async fn get_todo(&self, id: &str) -> Result<Option<Todo>> {
        let id = id.to_string();
        let todo = self
            .conn
            .call(move |conn| Ok(select_todo(conn, &id)?))
            .await?;
        Ok(todo)
    }

    pub async fn create_todo(&self, todo: NewTodo) -> Result<Todo> {
        let created = self
            .conn
            .call(move |conn| {
                let id = new_id();
                conn.execute(
                    "INSERT INTO todos (id, title, assignee, created_by, due_date, project_item_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        id,
                        todo.title,
                        todo.assignee.unwrap_or_else(|| DEFAULT_ASSIGNEE.to_string()),
                        todo.created_by.unwrap_or_else(|| DEFAULT_ASSIGNEE.to_string()),
                        todo.due_date.map(format_date),
                        todo.project_item_id,
                    ],
                )?;
                Ok(select_todo(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?)
            })
            .await?;
        Ok(created)
    }

    /// Apply the present fields of `update`. Returns `None` for an unknown id.
    pub async fn update_todo(&self, id: &str, update: TodoUpdate) -> Result<Option<Todo>> {
        let id = id.to_string();
        let todo = self
            .conn
            .call(move |conn| {
                let mut fields = Vec::new();
                if let Some(title) = update.title {
                    fields.push(("title", text(title)));
                }
                if let Some(assignee) = update.assignee {
                    fields.push(("assignee", text(assignee)));
                }
                if let Some(due_date) = update.due_date {
                    fields.push(("due_date", optional_text(due_date.map(format_date))));
                }
                if let Some(item_id) = update.project_item_id {
                    fields.push(("project_item_id", optional_text(item_id)));
                }
                update_fields(conn, "todos", &id, fields, false)?;

                if let Some(completed) = update.completed {
                    set_completed(conn, &id, completed)?;
                }

                Ok(select_todo(conn, &id)?)
            })
            .await?;
        Ok(todo)
    }

    pub async fn complete_todo(&self, id: &str) -> Result<Option<Todo>> {
        self.set_todo_completed(id, true).await
    }

    pub async fn uncomplete_todo(&self, id: &str) -> Result<Option<Todo>> {
        self.set_todo_completed(id, false).await
    }

    async fn set_todo_completed(&self, id: &str, completed: bool) -> Result<Option<Todo>> {
        let id = id.to_string();
        let todo = self
            .conn
            .call(move |conn| {
                set_completed(conn, &id, completed)?;
                Ok(select_todo(conn, &id)?)
            })
            .await?;
        Ok(todo)
    }

    pub async fn delete_todo(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| Ok(conn.execute("DELETE FROM todos WHERE id = ?1", params![id])?))
            .await?;
        Ok(deleted > 0)
    }

    // GitHub reconciliation

    /// Upsert every remote item by `github_id` and complete linked todos whose
    /// item vanished upstream. Runs in one transaction.
    pub async fn apply_remote_items(&self, items: Vec<LinkedTodo>) -> Result<PullStats> {
        let stats = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut stats = PullStats::default();

                let existing: HashSet<String> = {
                    let mut stmt =
                        tx.prepare("SELECT github_id FROM todos WHERE github_id IS NOT NULL")?;
                    let ids = stmt
                        .query_map([], |row| row.get::<_, String>(0))?
                        .collect::<std::result::Result<HashSet<_>, _>>()?;
                    ids
                };
                let remote: HashSet<&str> = items.iter().map(|i| i.github_id.as_str()).collect();

                let mut seen = HashSet::new();
                for item in &items {
                    if !seen.insert(item.github_id.as_str()) {
                        tracing::warn!("Duplicate remote item {}, keeping the first", item.github_id);
                        continue;
                    }
                    if existing.contains(&item.github_id) {
                        tx.execute(
                            r#"UPDATE todos SET
                                   title = ?1,
                                   completed = ?2,
                                   completed_at = CASE WHEN ?2 THEN COALESCE(completed_at, datetime('now')) ELSE NULL END
                               WHERE github_id = ?3"#,
                            params![item.title, item.completed, item.github_id],
                        )?;
                        stats.updated += 1;
                    } else {
                        tx.execute(
                            r#"INSERT INTO todos (id, title, github_id, assignee, completed, completed_at, created_by)
                               VALUES (?1, ?2, ?3, ?4, ?5, CASE WHEN ?5 THEN datetime('now') ELSE NULL END, ?6)
                               ON CONFLICT(github_id) DO UPDATE SET
                                   title = excluded.title,
                                   completed = excluded.completed,
                                   completed_at = CASE WHEN excluded.completed THEN COALESCE(todos.completed_at, datetime('now')) ELSE NULL END"#,
                            params![
                                new_id(),
                                item.title,
                                item.github_id,
                                item.assignee,
                                item.completed,
                                SYNC_CREATOR,
                            ],
                        )?;
                        stats.created += 1;
                    }
                }

                for github_id in existing.iter().filter(|id| !remote.contains(id.as_str())) {
                    stats.removed += tx.execute(
                        "UPDATE todos SET completed = 1, completed_at = datetime('now') WHERE github_id = ?1 AND completed = 0",
                        params![github_id],
                    )?;
                }

                tx.commit()?;
                Ok(stats)
            })
            .await?;
        Ok(stats)
    }

    /// Open todos that were never pushed upstream.
    pub async fn unlinked_open_todos(&self) -> Result<Vec<Todo>> {
        let todos = self
            .conn
            .call(|conn| {
                let sql = format!(
                    "SELECT {} FROM todos WHERE github_id IS NULL AND completed = 0 ORDER BY created_at ASC, rowid ASC",
                    TODO_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let todos = stmt
                    .query_map([], todo_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(todos)
            })
            .await?;
        Ok(todos)
    }

    /// Record the remote id for a pushed todo. A second link attempt for the
    /// same todo is a no-op; a remote id already owned by another todo fails
    /// on the unique index.
    pub async fn link_github_id(&self, todo_id: &str, github_id: &str) -> Result<bool> {
        let todo_id = todo_id.to_string();
        let github_id = github_id.to_string();
        let changed = self
            .conn
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE todos SET github_id = ?1 WHERE id = ?2 AND github_id IS NULL",
                    params![github_id, todo_id],
                )?)
            })
            .await?;
        Ok(changed > 0)
    }
}

fn set_completed(conn: &rusqlite::Connection, id: &str, completed: bool) -> rusqlite::Result<usize> {
    if completed {
        conn.execute(
            "UPDATE todos SET completed = 1, completed_at = datetime('now') WHERE id = ?1",
            params![id],
        )
    } else {
        conn.execute(
            "UPDATE todos SET completed = 0, completed_at = NULL WHERE id = ?1",
            params![id],
        )
    }
}

fn select_todo(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Todo>> {
    let sql = format!("SELECT {} FROM todos WHERE id = ?1", TODO_COLUMNS);
    conn.query_row(&sql, params![id], todo_from_row).optional()
}

fn todo_from_row(row: &Row) -> rusqlite::Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        assignee: row
            .get::<_, Option<String>>(2)?
            .unwrap_or_else(|| DEFAULT_ASSIGNEE.to_string()),
        completed: row.get::<_, Option<i64>>(3)?.unwrap_or(0) != 0,
        created_at: timestamp(row, 4)?,
        completed_at: optional_timestamp(row, 5)?,
        created_by: row
            .get::<_, Option<String>>(6)?
            .unwrap_or_else(|| DEFAULT_ASSIGNEE.to_string()),
        due_date: row.get::<_, Option<String>>(7)?.and_then(|s| parse_date(&s)),
        project_item_id: row.get(8)?,
        github_id: row.get(9)?,
    })
}
