use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::new_id;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct NewQuote {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: String,
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

const DEFAULT_QUOTES: &[(&str, &str, &[&str])] = &[
    ("The best way to predict the future is to invent it.", "Alan Kay", &["tech", "innovation"]),
    ("Simplicity is the ultimate sophistication.", "Leonardo da Vinci", &["design"]),
    ("The only way to do great work is to love what you do.", "Steve Jobs", &["work", "passion"]),
    ("Code is like humor. When you have to explain it, it's bad.", "Cory House", &["programming"]),
    ("First, solve the problem. Then, write the code.", "John Johnson", &["programming"]),
    (
        "Any fool can write code that a computer can understand. Good programmers write code that humans can understand.",
        "Martin Fowler",
        &["programming"],
    ),
    ("The best error message is the one that never shows up.", "Thomas Fuchs", &["ux", "programming"]),
    ("In the middle of difficulty lies opportunity.", "Albert Einstein", &["motivation"]),
    ("Stay hungry, stay foolish.", "Stewart Brand", &["motivation", "tech"]),
    ("It's not a bug, it's a feature.", "Anonymous", &["programming", "humor"]),
    (
        "There are only two hard things in Computer Science: cache invalidation and naming things.",
        "Phil Karlton",
        &["programming", "humor"],
    ),
    ("Weeks of coding can save you hours of planning.", "Anonymous", &["programming", "humor"]),
];

fn default_quotes() -> Vec<Quote> {
    DEFAULT_QUOTES
        .iter()
        .map(|(text, author, tags)| Quote {
            id: None,
            text: text.to_string(),
            author: author.to_string(),
            source: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: None,
        })
        .collect()
}

/// Quote collection persisted as a JSON array.
pub struct QuoteStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl QuoteStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Stored quotes, optionally only those carrying `tag`.
    pub async fn list(&self, tag: Option<&str>) -> Vec<Quote> {
        let quotes = self.load().await.unwrap_or_default();
        match tag {
            Some(tag) => quotes
                .into_iter()
                .filter(|q| q.tags.iter().any(|t| t == tag))
                .collect(),
            None => quotes,
        }
    }

    /// A random stored quote, drawing from the built-in list when the file is
    /// missing, unreadable or empty.
    pub async fn random(&self) -> Option<Quote> {
        let quotes = self
            .load()
            .await
            .filter(|quotes| !quotes.is_empty())
            .unwrap_or_else(default_quotes);
        quotes.choose(&mut rand::thread_rng()).cloned()
    }

    pub async fn add(&self, new: NewQuote) -> Result<Quote> {
        if new.text.trim().is_empty() {
            return Err(AppError::Validation("text is required".to_string()));
        }

        let _guard = self.lock.lock().await;
        // An unparseable file is left alone rather than replaced.
        let mut quotes = self.read_all().await?.unwrap_or_default();

        let quote = Quote {
            id: Some(new_id()),
            text: new.text,
            author: new.author,
            source: new.source,
            tags: new.tags,
            created_at: Some(Utc::now()),
        };
        quotes.push(quote.clone());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_string_pretty(&quotes)?).await?;

        Ok(quote)
    }

    async fn load(&self) -> Option<Vec<Quote>> {
        match self.read_all().await {
            Ok(quotes) => quotes,
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// `None` when the file does not exist yet.
    async fn read_all(&self) -> Result<Option<Vec<Quote>>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_quote(text: &str, tags: &[&str]) -> NewQuote {
        NewQuote {
            text: text.to_string(),
            author: "Someone".to_string(),
            source: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn random_falls_back_to_builtin_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = QuoteStore::new(dir.path().join("quotes.json"));

        assert!(store.list(None).await.is_empty());
        let quote = store.random().await.unwrap();
        assert!(default_quotes().contains(&quote));
    }

    #[tokio::test]
    async fn add_persists_and_filters_by_tag() {
        let dir = tempfile::tempdir().unwrap();
        let store = QuoteStore::new(dir.path().join("quotes.json"));

        let added = store.add(new_quote("Ship it.", &["work"])).await.unwrap();
        assert!(added.id.is_some());
        assert!(added.created_at.is_some());
        store.add(new_quote("Rest.", &["life"])).await.unwrap();

        assert_eq!(store.list(None).await.len(), 2);
        let work = store.list(Some("work")).await;
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].text, "Ship it.");

        // Once the file has content, random draws from it.
        let reopened = QuoteStore::new(dir.path().join("quotes.json"));
        let quote = reopened.random().await.unwrap();
        assert!(quote.text == "Ship it." || quote.text == "Rest.");
    }

    #[tokio::test]
    async fn quotes_without_author_are_kept_on_add() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(&path, r#"[{"text":"old one"},{"text":"old two","author":"A"}]"#).unwrap();
        let store = QuoteStore::new(path);

        let existing = store.list(None).await;
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].author, "");

        store.add(new_quote("new", &[])).await.unwrap();
        let texts: Vec<String> = store.list(None).await.into_iter().map(|q| q.text).collect();
        assert_eq!(texts, vec!["old one", "old two", "new"]);
    }

    #[tokio::test]
    async fn add_refuses_to_overwrite_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = QuoteStore::new(path.clone());

        assert!(store.add(new_quote("new", &[])).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
        assert!(store.list(None).await.is_empty());
        assert!(store.random().await.is_some());
    }

    #[tokio::test]
    async fn add_requires_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = QuoteStore::new(dir.path().join("quotes.json"));
        assert!(matches!(
            store.add(new_quote("  ", &[])).await,
            Err(AppError::Validation(_))
        ));
    }
}
