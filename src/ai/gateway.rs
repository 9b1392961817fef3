use std::collections::VecDeque;
use std::time::Duration;

use axum::body::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Message;

const NO_RESPONSE: &str = "No response";

/// Client for the local OpenAI-compatible LLM gateway.
pub struct GatewayClient {
    client: Client,
    url: String,
    token: Option<String>,
    model: String,
    agent_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceContent>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<ChoiceContent>,
}

#[derive(Debug, Deserialize)]
struct ChoiceContent {
    content: Option<String>,
}

impl GatewayClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: config.gateway_url.clone(),
            token: config.gateway_token.clone(),
            model: config.gateway_model.clone(),
            agent_id: config.gateway_agent_id.clone(),
        })
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        stream: bool,
        user: Option<&str>,
    ) -> Result<reqwest::Response> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            stream,
            user,
        };

        let mut builder = self
            .client
            .post(&self.url)
            .header("x-openclaw-agent-id", &self.agent_id)
            .json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!("{}: {}", status, error_text)));
        }

        Ok(response)
    }

    /// Request a full (non-streaming) reply.
    pub async fn complete(&self, messages: &[ChatMessage], user: Option<&str>) -> Result<String> {
        let response = self.send(messages, false, user).await?;
        let completion: CompletionResponse = response.json().await?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| NO_RESPONSE.to_string());

        Ok(content)
    }

    /// Request a streamed reply. Dropping the returned stream closes the
    /// upstream connection.
    pub async fn stream(&self, messages: &[ChatMessage]) -> Result<ChatStream> {
        let response = self.send(messages, true, None).await?;
        Ok(ChatStream::new(response.bytes_stream().boxed()))
    }
}

/// Text deltas of a streamed completion.
pub struct ChatStream {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl ChatStream {
    fn new(body: BoxStream<'static, reqwest::Result<Bytes>>) -> Self {
        Self {
            body,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// Next non-empty delta, or `None` once the gateway signals completion or
    /// closes the connection.
    pub async fn next_delta(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(delta) = self.pending.pop_front() {
                return Ok(Some(delta));
            }
            if self.finished {
                return Ok(None);
            }

            let Some(chunk) = self.body.next().await else {
                self.finished = true;
                continue;
            };

            for payload in self.decoder.push(&chunk?) {
                if payload == "[DONE]" {
                    self.finished = true;
                    break;
                }
                match serde_json::from_str::<StreamChunk>(&payload) {
                    Ok(chunk) => self.pending.extend(
                        chunk
                            .choices
                            .into_iter()
                            .filter_map(|choice| choice.delta.and_then(|d| d.content))
                            .filter(|content| !content.is_empty()),
                    ),
                    Err(e) => tracing::debug!("Skipping malformed stream chunk: {}", e),
                }
            }
        }
    }
}

/// Incremental decoder for `text/event-stream` bodies. Yields the payload of
/// each `data:` line; other fields are ignored.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(data) = line.strip_prefix("data:") {
                payloads.push(data.trim_start().to_string());
            }
        }
        payloads
    }
}
