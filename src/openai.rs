use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    #[error("no API key configured")]
    MissingKey,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("status={status} body={body}")]
    Status { status: u16, body: String },
    #[error("parse error: {0}")]
    Decode(String),
    #[error("the model returned no content")]
    Empty,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Something that turns a chat request into the model's reply text.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Whether a call could be attempted at all.
    fn has_credentials(&self) -> bool;

    async fn complete(&self, request: &ChatRequest) -> Result<String, InferenceError>;
}

pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InferenceError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, InferenceError> {
        let api_key = self.api_key.as_deref().ok_or(InferenceError::MissingKey)?;
        let url = format!("{}/chat/completions", self.base_url);

        info!("🔗 Calling {} with model {} ({} messages)", url, request.model, request.messages.len());

        let response = self.client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| InferenceError::Http(e.to_string()))?;

        let status = response.status();
        let response_text = response.text().await
            .map_err(|e| InferenceError::Http(e.to_string()))?;

        if !status.is_success() {
            error!("❌ API error response ({}): {}", status, preview(&response_text, 500));
            return Err(InferenceError::Status { status: status.as_u16(), body: response_text });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| InferenceError::Decode(e.to_string()))?;
        let text = first_choice_text(parsed)?;

        info!("📥 Model replied with {}", reply_summary(&text));
        Ok(text)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice { message: ResponseMessage }

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn first_choice_text(resp: ChatCompletionResponse) -> Result<String, InferenceError> {
    let text = resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(InferenceError::Empty);
    }
    Ok(text)
}

fn reply_summary(text: &str) -> String {
    format!("{} chars: {}", text.chars().count(), preview(text, 200))
}

/// Char-boundary-safe prefix for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...[{} chars]", &text[..idx], text.chars().count()),
        None => text.to_string(),
    }
}
