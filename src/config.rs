use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    pub gateway_token: Option<String>,
    #[serde(default = "default_gateway_model")]
    pub gateway_model: String,
    #[serde(default = "default_gateway_agent_id")]
    pub gateway_agent_id: String,

    pub openai_api_key: Option<String>,

    #[serde(default = "default_github_owner")]
    pub github_owner: String,
    #[serde(default = "default_github_project")]
    pub github_project: String,

    #[serde(default = "default_chat_context_messages")]
    pub chat_context_messages: u32,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agent-dashboard")
        .join("data")
}

fn default_bind_addr() -> String {
    "127.0.0.1:5173".to_string()
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:18789/v1/chat/completions".to_string()
}

fn default_gateway_model() -> String {
    "openclaw".to_string()
}

fn default_gateway_agent_id() -> String {
    "main".to_string()
}

fn default_github_owner() -> String {
    "rodionsteshenko".to_string()
}

fn default_github_project() -> String {
    "1".to_string()
}

fn default_chat_context_messages() -> u32 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bind_addr: default_bind_addr(),
            gateway_url: default_gateway_url(),
            gateway_token: None,
            gateway_model: default_gateway_model(),
            gateway_agent_id: default_gateway_agent_id(),
            openai_api_key: None,
            github_owner: default_github_owner(),
            github_project: default_github_project(),
            chat_context_messages: default_chat_context_messages(),
        }
    }
}

impl Config {
    /// Load from the default location, writing a fresh default file if none exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            config
        };

        Ok(config.with_env_overrides())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("agent-dashboard")
            .join("config.toml")
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.openai_api_key = Some(key);
            }
        }
        if let Ok(token) = std::env::var("GATEWAY_TOKEN") {
            if !token.is_empty() {
                self.gateway_token = Some(token);
            }
        }
        self
    }

    /// Create the data directory tree if it is missing.
    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("tiles.db")
    }

    pub fn now_path(&self) -> PathBuf {
        self.data_dir.join("now.json")
    }

    pub fn quotes_path(&self) -> PathBuf {
        self.data_dir.join("quotes.json")
    }

    pub fn debug_log_path(&self) -> PathBuf {
        self.data_dir.join("chat-debug.log")
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.data_dir.join("screenshots")
    }
}
