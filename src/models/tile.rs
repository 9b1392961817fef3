use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub id: String,
    #[serde(rename = "type")]
    pub tile_type: String,
    pub content: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub read: bool,
    pub starred: bool,
    pub archived: bool,
    pub pinned: bool,
    #[serde(rename = "savedForLater")]
    pub saved_for_later: bool,
    pub reactions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub tile_type: String,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TileUpdate {
    pub content: Option<serde_json::Value>,
    pub tags: Option<Vec<String>>,
    pub read: Option<bool>,
    pub starred: Option<bool>,
    pub archived: Option<bool>,
    pub pinned: Option<bool>,
    #[serde(alias = "savedForLater")]
    pub saved_for_later: Option<bool>,
    pub reactions: Option<Vec<String>>,
}

/// Which tiles a listing returns, based on the archived and saved-for-later flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Neither archived nor saved for later.
    #[default]
    New,
    /// Saved for later and not archived.
    Saved,
    All,
}

impl FilterMode {
    pub fn where_clause(&self) -> &'static str {
        match self {
            FilterMode::New => "archived = 0 AND saved_for_later = 0",
            FilterMode::Saved => "saved_for_later = 1 AND archived = 0",
            FilterMode::All => "1 = 1",
        }
    }
}
