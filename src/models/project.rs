use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::nullable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    Backlog,
    InProgress,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Features,
    Technical,
    Progress,
    Notes,
}

macro_rules! string_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!(concat!("unknown ", stringify!($ty), ": {}"), other)),
                }
            }
        }
    };
}

string_enum!(ProjectStatus { Active => "active", Archived => "archived" });
string_enum!(ItemStatus { Backlog => "backlog", InProgress => "in-progress", Complete => "complete" });
string_enum!(DocType {
    Features => "features",
    Technical => "technical",
    Progress => "progress",
    Notes => "notes",
});

impl DocType {
    /// Documents every new project starts with, in creation order.
    pub const DEFAULTS: [(DocType, &'static str); 3] = [
        (DocType::Features, "Features Design"),
        (DocType::Technical, "Technical Design"),
        (DocType::Progress, "Progress Notes"),
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectItem {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub acceptance_criteria: Vec<String>,
    pub status: ItemStatus,
    pub priority: i64,
    pub assignee: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProjectItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "acceptanceCriteria")]
    pub acceptance_criteria: Option<Vec<String>>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectItemUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(alias = "acceptanceCriteria")]
    pub acceptance_criteria: Option<Vec<String>>,
    pub status: Option<ItemStatus>,
    pub priority: Option<i64>,
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDoc {
    pub id: String,
    pub project_id: String,
    pub doc_type: DocType,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProjectDoc {
    #[serde(alias = "docType")]
    pub doc_type: DocType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectDocUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Appended after a blank line instead of replacing the content.
    pub append: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_status_uses_kebab_case_on_the_wire() {
        let status: ItemStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, ItemStatus::InProgress);
        assert_eq!(status.as_str(), "in-progress");
        assert_eq!("complete".parse::<ItemStatus>(), Ok(ItemStatus::Complete));
        assert!("done".parse::<ItemStatus>().is_err());
    }
}
