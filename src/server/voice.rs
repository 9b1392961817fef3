use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::ai::ChatMessage;
use crate::error::{AppError, Result};

use super::AppState;

const VOICE_USER: &str = "dashboard-voice";
const DEFAULT_FILE_NAME: &str = "audio.webm";

#[derive(Debug, Serialize)]
pub struct VoiceReply {
    pub transcript: String,
    pub response: String,
    /// Base64 mp3; absent when speech synthesis failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

/// Transcribe the `audio` upload, ask the gateway, and speak the answer back.
pub async fn voice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<VoiceReply>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart read error: {e}")))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        let file_name = field.file_name().unwrap_or(DEFAULT_FILE_NAME).to_string();
        let mime_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read audio: {e}")))?;
        upload = Some((data, file_name, mime_type));
    }

    let (audio, file_name, mime_type) = upload
        .filter(|(data, _, _)| !data.is_empty())
        .ok_or_else(|| AppError::Validation("No audio file provided".to_string()))?;
    let speech = state
        .speech
        .as_ref()
        .ok_or_else(|| AppError::Config("OpenAI API key not configured".to_string()))?;

    tracing::debug!("Transcribing {} bytes of audio", audio.len());
    let transcript = speech
        .transcribe(audio, &file_name, mime_type.as_deref())
        .await?;
    if transcript.is_empty() {
        return Err(AppError::Validation("No speech detected".to_string()));
    }
    tracing::info!("Voice transcript: {}", transcript);

    let prompt = [ChatMessage {
        role: "user".to_string(),
        content: transcript.clone(),
    }];
    let response = state.gateway.complete(&prompt, Some(VOICE_USER)).await?;

    let audio = match speech.synthesize(&response).await {
        Ok(bytes) => Some(STANDARD.encode(bytes)),
        Err(e) => {
            tracing::warn!("Speech synthesis failed, replying with text only: {}", e);
            None
        }
    };

    Ok(Json(VoiceReply {
        transcript,
        response,
        audio,
    }))
}
