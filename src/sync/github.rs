use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::{AppError, Result};

/// Upper bound passed to `gh project item-list`; the CLI default (30) would
/// make older items look removed.
const ITEM_LIMIT: &str = "1000";

/// A GitHub Project item as reported by `gh project item-list`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub status: Option<String>,
    #[serde(default)]
    pub assignees: Vec<RemoteAssignee>,
}

/// `gh` reports assignees either as plain logins or as user objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RemoteAssignee {
    Login(String),
    User { login: String },
}

impl RemoteAssignee {
    pub fn login(&self) -> &str {
        match self {
            RemoteAssignee::Login(login) | RemoteAssignee::User { login } => login,
        }
    }
}

impl RemoteItem {
    pub fn is_done(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("done"))
    }
}

#[derive(Debug, Deserialize)]
struct ItemList {
    #[serde(default)]
    items: Vec<RemoteItem>,
}

#[derive(Debug, Deserialize)]
struct CreatedItem {
    id: Option<String>,
}

#[async_trait]
pub trait ProjectBoard: Send + Sync {
    async fn list_items(&self) -> Result<Vec<RemoteItem>>;

    /// Create a draft item and return its remote id.
    async fn create_item(&self, title: &str) -> Result<String>;
}

/// [`ProjectBoard`] backed by the `gh` command line tool.
pub struct GhCli {
    project: String,
    owner: String,
}

impl GhCli {
    pub fn new(project: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            owner: owner.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        tracing::debug!("gh {}", args.join(" "));

        let output = Command::new("gh")
            .args(args)
            .output()
            .await
            .map_err(|e| AppError::GitHub(format!("failed to run gh: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::GitHub(format!(
                "gh exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl ProjectBoard for GhCli {
    async fn list_items(&self) -> Result<Vec<RemoteItem>> {
        let stdout = self
            .run(&[
                "project",
                "item-list",
                &self.project,
                "--owner",
                &self.owner,
                "--limit",
                ITEM_LIMIT,
                "--format",
                "json",
            ])
            .await?;
        parse_item_list(&stdout)
    }

    async fn create_item(&self, title: &str) -> Result<String> {
        let stdout = self
            .run(&[
                "project",
                "item-create",
                &self.project,
                "--owner",
                &self.owner,
                "--title",
                title,
                "--format",
                "json",
            ])
            .await?;
        parse_created_id(&stdout)
    }
}

fn parse_item_list(json: &str) -> Result<Vec<RemoteItem>> {
    let list: ItemList = serde_json::from_str(json)?;
    Ok(list.items)
}

fn parse_created_id(json: &str) -> Result<String> {
    let created: CreatedItem = serde_json::from_str(json)?;
    created
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::GitHub("item-create returned no id".to_string()))
}
