use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::Result;

use super::quotes::Quote;

type Object = Map<String, Value>;

/// Contents of `now.json`. Unknown top-level keys are carried through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NowData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weather: Option<Object>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<Object>,
    #[serde(flatten)]
    extra: Object,
}

#[derive(Debug, Default, Deserialize)]
pub struct NowUpdate {
    pub weather: Option<Object>,
    pub image: Option<Object>,
}

#[derive(Debug, Serialize)]
pub struct NowSnapshot {
    pub weather: Option<Object>,
    pub image: Option<Object>,
    pub quote: Option<Quote>,
}

/// The "now" panel: last reported weather and image.
pub struct NowStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl NowStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Current weather and image, or `None` for each when never set.
    pub async fn current(&self) -> (Option<Object>, Option<Object>) {
        let data = self.load().await;
        (data.weather, data.image)
    }

    /// Replace whichever sections are present, stamping each with `updatedAt`.
    pub async fn update(&self, update: NowUpdate) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await;
        let stamp = Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        if let Some(mut weather) = update.weather {
            weather.insert("updatedAt".to_string(), stamp.clone());
            data.weather = Some(weather);
        }
        if let Some(mut image) = update.image {
            image.insert("updatedAt".to_string(), stamp);
            data.image = Some(image);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&data)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    async fn load(&self) -> NowData {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable {}: {}", self.path.display(), e);
                NowData::default()
            }),
            Err(_) => NowData::default(),
        }
    }
}
