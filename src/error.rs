use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Speech API error: {0}")]
    Speech(String),

    #[error("GitHub CLI error: {0}")]
    GitHub(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// True for failures of an external collaborator (gateway, speech API, gh).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Http(_) | AppError::Gateway(_) | AppError::Speech(_) | AppError::GitHub(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
