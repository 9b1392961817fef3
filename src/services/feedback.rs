use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{AppError, Result};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Decode a PNG screenshot (bare base64 or a `data:image/png;base64,` URL) and
/// write it as `feedback-<millis>.png` under `dir`.
pub async fn save_screenshot(dir: &Path, screenshot: &str) -> Result<PathBuf> {
    let encoded = screenshot
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .unwrap_or(screenshot);
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::Validation(format!("invalid screenshot: {}", e)))?;

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!(
        "feedback-{}.png",
        chrono::Utc::now().timestamp_millis()
    ));
    tokio::fs::write(&path, bytes).await?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_decoded_data_url() {
        let dir = tempfile::tempdir().unwrap();
        let screenshots = dir.path().join("screenshots");
        let data_url = format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(b"\x89PNG fake"));

        let path = save_screenshot(&screenshots, &data_url).await.unwrap();
        assert!(path.starts_with(&screenshots));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("feedback-"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG fake");
    }

    #[tokio::test]
    async fn rejects_invalid_base64() {
        let dir = tempfile::tempdir().unwrap();
        let result = save_screenshot(dir.path(), "data:image/png;base64,@@@").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
