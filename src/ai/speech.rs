use std::time::Duration;

use axum::body::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";
const TRANSCRIPTION_MODEL: &str = "whisper-1";
const TTS_MODEL: &str = "tts-1";
const TTS_VOICE: &str = "alloy";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// OpenAI speech endpoints: Whisper transcription and TTS.
pub struct SpeechClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SpeechClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: OPENAI_API_URL.to_string(),
        })
    }

    /// Transcribe an uploaded audio clip to text.
    pub async fn transcribe(
        &self,
        audio: Bytes,
        file_name: &str,
        mime_type: Option<&str>,
    ) -> Result<String> {
        let mut part = Part::stream(audio).file_name(file_name.to_string());
        if let Some(mime) = mime_type {
            part = part
                .mime_str(mime)
                .map_err(|e| AppError::Speech(e.to_string()))?;
        }

        let form = Form::new()
            .part("file", part)
            .text("model", TRANSCRIPTION_MODEL);

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Speech(format!(
                "transcription failed {}: {}",
                status, error_text
            )));
        }

        let transcription: TranscriptionResponse = response.json().await?;
        Ok(transcription.text.trim().to_string())
    }

    /// Synthesize mp3 speech for `text`.
    pub async fn synthesize(&self, text: &str) -> Result<Bytes> {
        let request = SpeechRequest {
            model: TTS_MODEL,
            input: text,
            voice: TTS_VOICE,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Speech(format!(
                "speech synthesis failed {}: {}",
                status, error_text
            )));
        }

        Ok(response.bytes().await?)
    }
}
