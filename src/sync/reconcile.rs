use crate::db::{LinkedTodo, PullStats, Repository};
use crate::error::Result;
use crate::models::DEFAULT_ASSIGNEE;

use super::github::{ProjectBoard, RemoteItem};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushStats {
    pub pushed: usize,
    pub failed: usize,
}

impl From<RemoteItem> for LinkedTodo {
    fn from(item: RemoteItem) -> Self {
        let completed = item.is_done();
        let assignee = item
            .assignees
            .first()
            .map(|a| a.login().to_string())
            .unwrap_or_else(|| DEFAULT_ASSIGNEE.to_string());
        Self {
            github_id: item.id,
            title: item.title,
            assignee,
            completed,
        }
    }
}

/// Mirror the board into the local todos table.
///
/// The remote list is fetched before anything is written; a fetch failure
/// leaves the database untouched.
pub async fn pull(repo: &Repository, board: &dyn ProjectBoard) -> Result<PullStats> {
    let items = board.list_items().await?;
    tracing::info!("Found {} remote items", items.len());

    let linked = items.into_iter().map(LinkedTodo::from).collect();
    repo.apply_remote_items(linked).await
}

/// Create a board item for every open, never-pushed todo. Failures are logged
/// per todo and do not stop the run.
pub async fn push(repo: &Repository, board: &dyn ProjectBoard) -> Result<PushStats> {
    let mut stats = PushStats::default();

    for todo in repo.unlinked_open_todos().await? {
        let result = match board.create_item(&todo.title).await {
            Ok(github_id) => repo.link_github_id(&todo.id, &github_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(_) => {
                tracing::info!("Pushed: {}", todo.title);
                stats.pushed += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to push \"{}\": {}", todo.title, e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TodoFilter;
    use crate::error::AppError;
    use crate::models::NewTodo;
    use crate::sync::RemoteAssignee;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBoard {
        items: Vec<RemoteItem>,
        fail_list: bool,
        fail_titles: Vec<String>,
        created: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProjectBoard for FakeBoard {
        async fn list_items(&self) -> Result<Vec<RemoteItem>> {
            if self.fail_list {
                return Err(AppError::GitHub("offline".to_string()));
            }
            Ok(self.items.clone())
        }

        async fn create_item(&self, title: &str) -> Result<String> {
            if self.fail_titles.iter().any(|t| t == title) {
                return Err(AppError::GitHub("rejected".to_string()));
            }
            let mut created = self.created.lock().unwrap();
            created.push(title.to_string());
            Ok(format!("PVTI_new_{}", created.len()))
        }
    }

    fn item(id: &str, title: &str, status: &str, assignees: &[&str]) -> RemoteItem {
        RemoteItem {
            id: id.to_string(),
            title: title.to_string(),
            status: Some(status.to_string()),
            assignees: assignees
                .iter()
                .map(|a| RemoteAssignee::Login(a.to_string()))
                .collect(),
        }
    }

    async fn all_todos(repo: &Repository) -> Vec<crate::models::Todo> {
        repo.list_todos(TodoFilter {
            include_completed: true,
            ..Default::default()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn pull_creates_with_first_assignee_or_default() {
        let repo = Repository::open_in_memory().await.unwrap();
        let board = FakeBoard {
            items: vec![
                item("A", "Alpha", "Todo", &["rodion", "coby"]),
                item("B", "Beta", "In Progress", &[]),
            ],
            ..Default::default()
        };

        let stats = pull(&repo, &board).await.unwrap();
        assert_eq!(
            stats,
            PullStats {
                created: 2,
                updated: 0,
                removed: 0
            }
        );

        let todos = all_todos(&repo).await;
        let alpha = todos.iter().find(|t| t.title == "Alpha").unwrap();
        let beta = todos.iter().find(|t| t.title == "Beta").unwrap();
        assert_eq!(alpha.assignee, "rodion");
        assert_eq!(beta.assignee, DEFAULT_ASSIGNEE);
    }

    #[tokio::test]
    async fn failed_fetch_changes_nothing() {
        let repo = Repository::open_in_memory().await.unwrap();
        let seeded = FakeBoard {
            items: vec![item("A", "Alpha", "Todo", &[])],
            ..Default::default()
        };
        pull(&repo, &seeded).await.unwrap();

        let offline = FakeBoard {
            fail_list: true,
            ..Default::default()
        };
        assert!(pull(&repo, &offline).await.is_err());

        let todos = all_todos(&repo).await;
        assert_eq!(todos.len(), 1);
        assert!(!todos[0].completed);
    }

    #[tokio::test]
    async fn second_pull_reports_updates() {
        let repo = Repository::open_in_memory().await.unwrap();
        let mut board = FakeBoard {
            items: vec![item("A", "Alpha", "Todo", &[])],
            ..Default::default()
        };
        pull(&repo, &board).await.unwrap();

        board.items = vec![item("A", "Alpha renamed", "done", &[])];
        let stats = pull(&repo, &board).await.unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.created, 0);

        let todos = all_todos(&repo).await;
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "Alpha renamed");
        assert!(todos[0].completed);
        assert!(todos[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn push_links_each_todo_once_and_survives_failures() {
        let repo = Repository::open_in_memory().await.unwrap();
        repo.create_todo(NewTodo::new("Write report")).await.unwrap();
        repo.create_todo(NewTodo::new("Broken one")).await.unwrap();
        let done = repo.create_todo(NewTodo::new("Already done")).await.unwrap();
        repo.complete_todo(&done.id).await.unwrap();

        let board = FakeBoard {
            fail_titles: vec!["Broken one".to_string()],
            ..Default::default()
        };

        let stats = push(&repo, &board).await.unwrap();
        assert_eq!(stats, PushStats { pushed: 1, failed: 1 });
        assert_eq!(*board.created.lock().unwrap(), vec!["Write report".to_string()]);

        let todos = all_todos(&repo).await;
        let report = todos.iter().find(|t| t.title == "Write report").unwrap();
        assert_eq!(report.github_id.as_deref(), Some("PVTI_new_1"));

        // The linked todo is no longer selected; only the failed one retries.
        let stats = push(&repo, &board).await.unwrap();
        assert_eq!(stats, PushStats { pushed: 0, failed: 1 });
        assert_eq!(board.created.lock().unwrap().len(), 1);
    }
}
