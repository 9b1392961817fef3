use rusqlite::{params, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{
    DocType, ItemStatus, NewProjectDoc, NewProjectItem, Project, ProjectDoc, ProjectDocUpdate,
    ProjectItem, ProjectItemUpdate, ProjectStatus, ProjectUpdate, DEFAULT_ASSIGNEE,
};

use super::repository::{
    json_list, json_text, new_id, optional_text, optional_timestamp, text, timestamp,
    update_fields, Repository,
};

const PROJECT_COLUMNS: &str = "id, name, description, status, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, project_id, title, description, acceptance_criteria, status, priority, assignee, created_at, updated_at, started_at, completed_at";
const DOC_COLUMNS: &str = "id, project_id, doc_type, title, content, created_at, updated_at";

const DEFAULT_PRIORITY: i64 = 3;

impl Repository {
    // Project operations

    pub async fn list_projects(&self, include_archived: bool) -> Result<Vec<Project>> {
        let projects = self
            .conn
            .call(move |conn| {
                let filter = if include_archived { "" } else { "WHERE status = 'active'" };
                let sql = format!(
                    "SELECT {} FROM projects {} ORDER BY created_at DESC, rowid DESC",
                    PROJECT_COLUMNS, filter
                );
                let mut stmt = conn.prepare(&sql)?;
                let projects = stmt
                    .query_map([], project_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(projects)
            })
            .await?;
        Ok(projects)
    }

    pub async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let id = id.to_string();
        let project = self
            .conn
            .call(move |conn| Ok(select_project(conn, &id)?))
            .await?;
        Ok(project)
    }

    /// Insert the project and its default documents. The statements are not
    /// wrapped in a transaction.
    pub async fn create_project(&self, name: String, description: Option<String>) -> Result<Project> {
        let project = self
            .conn
            .call(move |conn| {
                let id = new_id();
                conn.execute(
                    "INSERT INTO projects (id, name, description) VALUES (?1, ?2, ?3)",
                    params![id, name, description],
                )?;

                for (doc_type, title) in DocType::DEFAULTS {
                    conn.execute(
                        "INSERT INTO project_docs (id, project_id, doc_type, title, content) VALUES (?1, ?2, ?3, ?4, '')",
                        params![new_id(), id, doc_type.as_str(), title],
                    )?;
                }

                Ok(select_project(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?)
            })
            .await?;
        Ok(project)
    }

    pub async fn update_project(&self, id: &str, update: ProjectUpdate) -> Result<Option<Project>> {
        let id = id.to_string();
        let project = self
            .conn
            .call(move |conn| {
                let mut fields = Vec::new();
                if let Some(name) = update.name {
                    fields.push(("name", text(name)));
                }
                if let Some(description) = update.description {
                    fields.push(("description", optional_text(description)));
                }
                if let Some(status) = update.status {
                    fields.push(("status", text(status.as_str())));
                }
                update_fields(conn, "projects", &id, fields, true)?;
                Ok(select_project(conn, &id)?)
            })
            .await?;
        Ok(project)
    }

    pub async fn delete_project(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| Ok(conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?))
            .await?;
        Ok(deleted > 0)
    }

    // Project item operations

    pub async fn list_project_items(
        &self,
        project_id: &str,
        status: Option<ItemStatus>,
    ) -> Result<Vec<ProjectItem>> {
        let project_id = project_id.to_string();
        let items = self
            .conn
            .call(move |conn| {
                let mut values = vec![project_id];
                let mut sql = format!("SELECT {} FROM project_items WHERE project_id = ?", ITEM_COLUMNS);
                if let Some(status) = status {
                    sql.push_str(" AND status = ?");
                    values.push(status.as_str().to_string());
                }
                sql.push_str(" ORDER BY priority ASC, created_at ASC, rowid ASC");

                let mut stmt = conn.prepare(&sql)?;
                let items = stmt
                    .query_map(rusqlite::params_from_iter(values), item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        Ok(items)
    }

    pub async fn get_project_item(&self, id: &str) -> Result<Option<ProjectItem>> {
        let id = id.to_string();
        let item = self
            .conn
            .call(move |conn| Ok(select_item(conn, &id)?))
            .await?;
        Ok(item)
    }

    pub async fn create_project_item(&self, project_id: &str, item: NewProjectItem) -> Result<ProjectItem> {
        let project_id = project_id.to_string();
        let criteria = serde_json::to_string(&item.acceptance_criteria.unwrap_or_default())?;
        let created = self
            .conn
            .call(move |conn| {
                let id = new_id();
                conn.execute(
                    r#"INSERT INTO project_items (id, project_id, title, description, acceptance_criteria, priority, assignee)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
                    params![
                        id,
                        project_id,
                        item.title,
                        item.description,
                        criteria,
                        item.priority.unwrap_or(DEFAULT_PRIORITY),
                        item.assignee.unwrap_or_else(|| DEFAULT_ASSIGNEE.to_string()),
                    ],
                )?;
                Ok(select_item(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?)
            })
            .await?;
        Ok(created)
    }

    /// Apply the present fields. A status change stamps `started_at` on
    /// backlog -> in-progress and `completed_at` on any move into complete.
    pub async fn update_project_item(
        &self,
        id: &str,
        update: ProjectItemUpdate,
    ) -> Result<Option<ProjectItem>> {
        let id = id.to_string();
        let item = self
            .conn
            .call(move |conn| {
                let Some(current) = select_item(conn, &id)? else {
                    return Ok(None);
                };

                let mut fields = Vec::new();
                if let Some(title) = update.title {
                    fields.push(("title", text(title)));
                }
                if let Some(description) = update.description {
                    fields.push(("description", optional_text(description)));
                }
                if let Some(criteria) = &update.acceptance_criteria {
                    fields.push(("acceptance_criteria", json_text(criteria)));
                }
                if let Some(priority) = update.priority {
                    fields.push(("priority", rusqlite::types::Value::Integer(priority)));
                }
                if let Some(assignee) = update.assignee {
                    fields.push(("assignee", text(assignee)));
                }
                if let Some(status) = update.status {
                    fields.push(("status", text(status.as_str())));
                }
                update_fields(conn, "project_items", &id, fields, true)?;

                if let Some(status) = update.status {
                    stamp_transition(conn, &id, current.status, status)?;
                }

                Ok(select_item(conn, &id)?)
            })
            .await?;
        Ok(item)
    }

    pub async fn delete_project_item(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| {
                Ok(conn.execute("DELETE FROM project_items WHERE id = ?1", params![id])?)
            })
            .await?;
        Ok(deleted > 0)
    }

    // Project doc operations

    pub async fn list_project_docs(&self, project_id: &str) -> Result<Vec<ProjectDoc>> {
        let project_id = project_id.to_string();
        let docs = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM project_docs WHERE project_id = ?1 ORDER BY doc_type, created_at",
                    DOC_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let docs = stmt
                    .query_map(params![project_id], doc_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(docs)
            })
            .await?;
        Ok(docs)
    }

    pub async fn get_project_doc(&self, id: &str) -> Result<Option<ProjectDoc>> {
        let id = id.to_string();
        let doc = self
            .conn
            .call(move |conn| Ok(select_doc(conn, &id)?))
            .await?;
        Ok(doc)
    }

    pub async fn get_project_doc_by_type(
        &self,
        project_id: &str,
        doc_type: DocType,
    ) -> Result<Option<ProjectDoc>> {
        let project_id = project_id.to_string();
        let doc = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM project_docs WHERE project_id = ?1 AND doc_type = ?2 ORDER BY created_at LIMIT 1",
                    DOC_COLUMNS
                );
                Ok(conn
                    .query_row(&sql, params![project_id, doc_type.as_str()], doc_from_row)
                    .optional()?)
            })
            .await?;
        Ok(doc)
    }

    pub async fn create_project_doc(&self, project_id: &str, doc: NewProjectDoc) -> Result<ProjectDoc> {
        let project_id = project_id.to_string();
        let created = self
            .conn
            .call(move |conn| {
                let id = new_id();
                conn.execute(
                    "INSERT INTO project_docs (id, project_id, doc_type, title, content) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![id, project_id, doc.doc_type.as_str(), doc.title, doc.content],
                )?;
                Ok(select_doc(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?)
            })
            .await?;
        Ok(created)
    }

    /// Replace title/content, or append to the content when `append` is set.
    pub async fn update_project_doc(
        &self,
        id: &str,
        update: ProjectDocUpdate,
    ) -> Result<Option<ProjectDoc>> {
        let id = id.to_string();
        let doc = self
            .conn
            .call(move |conn| {
                let Some(current) = select_doc(conn, &id)? else {
                    return Ok(None);
                };

                let mut fields = Vec::new();
                if let Some(extra) = update.append {
                    let content = if current.content.is_empty() {
                        extra
                    } else {
                        format!("{}\n\n{}", current.content, extra)
                    };
                    fields.push(("content", text(content)));
                } else {
                    if let Some(title) = update.title {
                        fields.push(("title", text(title)));
                    }
                    if let Some(content) = update.content {
                        fields.push(("content", text(content)));
                    }
                }
                update_fields(conn, "project_docs", &id, fields, true)?;
                Ok(select_doc(conn, &id)?)
            })
            .await?;
        Ok(doc)
    }

    pub async fn delete_project_doc(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| {
                Ok(conn.execute("DELETE FROM project_docs WHERE id = ?1", params![id])?)
            })
            .await?;
        Ok(deleted > 0)
    }
}

fn stamp_transition(
    conn: &rusqlite::Connection,
    id: &str,
    from: ItemStatus,
    to: ItemStatus,
) -> rusqlite::Result<()> {
    match (from, to) {
        (ItemStatus::Backlog, ItemStatus::InProgress) => {
            conn.execute(
                "UPDATE project_items SET started_at = datetime('now') WHERE id = ?1",
                params![id],
            )?;
        }
        (from, ItemStatus::Complete) if from != ItemStatus::Complete => {
            conn.execute(
                "UPDATE project_items SET completed_at = datetime('now') WHERE id = ?1",
                params![id],
            )?;
        }
        _ => {}
    }
    Ok(())
}

fn select_project(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Project>> {
    let sql = format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS);
    conn.query_row(&sql, params![id], project_from_row).optional()
}

fn select_item(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<ProjectItem>> {
    let sql = format!("SELECT {} FROM project_items WHERE id = ?1", ITEM_COLUMNS);
    conn.query_row(&sql, params![id], item_from_row).optional()
}

fn select_doc(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<ProjectDoc>> {
    let sql = format!("SELECT {} FROM project_docs WHERE id = ?1", DOC_COLUMNS);
    conn.query_row(&sql, params![id], doc_from_row).optional()
}

/// Parse a text enum column. Unknown values (rows written by other tools)
/// read as `fallback` so one odd row cannot break a whole listing.
fn enum_column_or<T: std::str::FromStr<Err = String>>(
    row: &Row,
    idx: usize,
    fallback: T,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    Ok(raw.parse().unwrap_or_else(|e: String| {
        tracing::warn!("{}, using fallback", e);
        fallback
    }))
}

fn project_from_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: enum_column_or(row, 3, ProjectStatus::Active)?,
        created_at: timestamp(row, 4)?,
        updated_at: timestamp(row, 5)?,
    })
}

fn item_from_row(row: &Row) -> rusqlite::Result<ProjectItem> {
    Ok(ProjectItem {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        acceptance_criteria: json_list(row, 4)?,
        status: enum_column_or(row, 5, ItemStatus::Backlog)?,
        priority: row.get::<_, Option<i64>>(6)?.unwrap_or(DEFAULT_PRIORITY),
        assignee: row
            .get::<_, Option<String>>(7)?
            .unwrap_or_else(|| DEFAULT_ASSIGNEE.to_string()),
        created_at: timestamp(row, 8)?,
        updated_at: timestamp(row, 9)?,
        started_at: optional_timestamp(row, 10)?,
        completed_at: optional_timestamp(row, 11)?,
    })
}

fn doc_from_row(row: &Row) -> rusqlite::Result<ProjectDoc> {
    Ok(ProjectDoc {
        id: row.get(0)?,
        project_id: row.get(1)?,
        doc_type: enum_column_or(row, 2, DocType::Notes)?,
        title: row.get(3)?,
        content: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        created_at: timestamp(row, 5)?,
        updated_at: timestamp(row, 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (Repository, Project) {
        let repo = Repository::open_in_memory().await.unwrap();
        let project = repo
            .create_project("Dashboard".to_string(), Some("Personal board".to_string()))
            .await
            .unwrap();
        (repo, project)
    }

    fn status_update(status: ItemStatus) -> ProjectItemUpdate {
        ProjectItemUpdate {
            status: Some(status),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn new_project_gets_default_docs() {
        let (repo, project) = seeded().await;
        assert_eq!(project.status, ProjectStatus::Active);

        let docs = repo.list_project_docs(&project.id).await.unwrap();
        let mut types: Vec<DocType> = docs.iter().map(|d| d.doc_type).collect();
        types.sort_by_key(|t| t.as_str());
        assert_eq!(types, vec![DocType::Features, DocType::Progress, DocType::Technical]);
        assert!(docs.iter().all(|d| d.content.is_empty()));

        let progress = repo
            .get_project_doc_by_type(&project.id, DocType::Progress)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(progress.title, "Progress Notes");
    }

    #[tokio::test]
    async fn unknown_enum_values_fall_back() {
        let (repo, project) = seeded().await;
        let project_id = project.id.clone();
        repo.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO project_docs (id, project_id, doc_type, title) VALUES ('d-odd', ?1, 'roadmap', 'Roadmap')",
                    params![project_id],
                )?;
                conn.execute(
                    "INSERT INTO project_items (id, project_id, title, status) VALUES ('i-odd', ?1, 'Odd', 'blocked')",
                    params![project_id],
                )?;
                conn.execute(
                    "UPDATE projects SET status = 'paused' WHERE id = ?1",
                    params![project_id],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let docs = repo.list_project_docs(&project.id).await.unwrap();
        assert_eq!(docs.len(), 4);
        let odd = docs.iter().find(|d| d.id == "d-odd").unwrap();
        assert_eq!(odd.doc_type, DocType::Notes);

        let item = repo.get_project_item("i-odd").await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::Backlog);

        let projects = repo.list_projects(true).await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].status, ProjectStatus::Active);
    }

    #[tokio::test]
    async fn archived_projects_hidden_by_default() {
        let (repo, project) = seeded().await;
        repo.update_project(
            &project.id,
            ProjectUpdate {
                status: Some(ProjectStatus::Archived),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(repo.list_projects(false).await.unwrap().is_empty());
        assert_eq!(repo.list_projects(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn item_transitions_stamp_timestamps() {
        let (repo, project) = seeded().await;
        let item = repo
            .create_project_item(
                &project.id,
                NewProjectItem {
                    title: "Smart todos".to_string(),
                    acceptance_criteria: Some(vec!["parses dates".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(item.status, ItemStatus::Backlog);
        assert_eq!(item.priority, 3);
        assert_eq!(item.acceptance_criteria, vec!["parses dates".to_string()]);
        assert!(item.started_at.is_none());

        let started = repo
            .update_project_item(&item.id, status_update(ItemStatus::InProgress))
            .await
            .unwrap()
            .unwrap();
        assert!(started.started_at.is_some());
        assert!(started.completed_at.is_none());

        let done = repo
            .update_project_item(&item.id, status_update(ItemStatus::Complete))
            .await
            .unwrap()
            .unwrap();
        assert!(done.completed_at.is_some());
        assert_eq!(done.started_at, started.started_at);

        // complete -> in-progress is not a backlog start; the stamp is kept.
        let reopened = repo
            .update_project_item(&item.id, status_update(ItemStatus::InProgress))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reopened.started_at, started.started_at);
    }

    #[tokio::test]
    async fn items_sort_by_priority_and_filter_by_status() {
        let (repo, project) = seeded().await;
        for (title, priority) in [("low", 5), ("urgent", 1)] {
            repo.create_project_item(
                &project.id,
                NewProjectItem {
                    title: title.to_string(),
                    priority: Some(priority),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let items = repo.list_project_items(&project.id, None).await.unwrap();
        assert_eq!(items[0].title, "urgent");

        let in_progress = repo
            .list_project_items(&project.id, Some(ItemStatus::InProgress))
            .await
            .unwrap();
        assert!(in_progress.is_empty());
    }

    #[tokio::test]
    async fn doc_append_joins_with_blank_line() {
        let (repo, project) = seeded().await;
        let doc = repo
            .get_project_doc_by_type(&project.id, DocType::Progress)
            .await
            .unwrap()
            .unwrap();

        let append = |text: &str| ProjectDocUpdate {
            append: Some(text.to_string()),
            ..Default::default()
        };

        let first = repo.update_project_doc(&doc.id, append("Day 1")).await.unwrap().unwrap();
        assert_eq!(first.content, "Day 1");
        let second = repo.update_project_doc(&doc.id, append("Day 2")).await.unwrap().unwrap();
        assert_eq!(second.content, "Day 1\n\nDay 2");
    }

    #[tokio::test]
    async fn deleting_project_cascades() {
        let (repo, project) = seeded().await;
        let item = repo
            .create_project_item(
                &project.id,
                NewProjectItem {
                    title: "x".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(repo.delete_project(&project.id).await.unwrap());
        assert!(repo.get_project_item(&item.id).await.unwrap().is_none());
        assert!(repo.list_project_docs(&project.id).await.unwrap().is_empty());
    }
}
