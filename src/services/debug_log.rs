use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::Result;

/// Lines returned by [`DebugLog::recent`].
const RECENT_LINES: usize = 50;

/// Append-only text log the chat client writes diagnostics to.
pub struct DebugLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DebugLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Append `[timestamp] msg`. Embedded newlines are flattened so each
    /// entry stays on one line.
    pub async fn append(&self, msg: &str) -> Result<()> {
        let line = format!(
            "[{}] {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            msg.replace(['\r', '\n'], " ")
        );

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// The last non-empty lines, oldest first.
    pub async fn recent(&self) -> Result<Vec<String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).collect();
        let start = lines.len().saturating_sub(RECENT_LINES);
        Ok(lines[start..].iter().map(|l| l.to_string()).collect())
    }

    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, "").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_the_last_fifty_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = DebugLog::new(dir.path().join("chat-debug.log"));
        assert!(log.recent().await.unwrap().is_empty());

        for i in 0..60 {
            log.append(&format!("event {}", i)).await.unwrap();
        }

        let recent = log.recent().await.unwrap();
        assert_eq!(recent.len(), 50);
        assert!(recent[0].starts_with('['));
        assert!(recent[0].ends_with("] event 10"));
        assert!(recent[49].ends_with("] event 59"));
    }

    #[tokio::test]
    async fn multiline_messages_stay_on_one_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = DebugLog::new(dir.path().join("chat-debug.log"));

        log.append("first\nsecond").await.unwrap();
        let recent = log.recent().await.unwrap();
        assert_eq!(recent.len(), 1);
        assert!(recent[0].ends_with("] first second"));
    }

    #[tokio::test]
    async fn clear_empties_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = DebugLog::new(dir.path().join("chat-debug.log"));

        log.append("something").await.unwrap();
        log.clear().await.unwrap();
        assert!(log.recent().await.unwrap().is_empty());
        log.append("after").await.unwrap();
        assert_eq!(log.recent().await.unwrap().len(), 1);
    }
}
