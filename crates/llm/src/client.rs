//! Chat-completions client for OpenAI-compatible endpoints.
//!
//! Wraps `POST {base_url}/chat/completions` using [`reqwest`]. Only the top
//! choice's message content is returned; usage and finish reasons are
//! ignored.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storyloom_core::error::{GenerationError, GenerationStage};

use crate::config::LlmConfig;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A remote completion capability.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Run the conversation and return the top completion's text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError>;
}

/// Errors from the completion HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The request did not finish within the client timeout.
    #[error("Completion request timed out after {0}s")]
    Timeout(u64),

    /// 401 or 403 from the endpoint.
    #[error("Completion endpoint rejected credentials ({status}): {body}")]
    Auth { status: u16, body: String },

    /// 429 from the endpoint.
    #[error("Completion endpoint rate limited the request")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-2xx status.
    #[error("Completion API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// 2xx with a body lacking `choices[0].message.content`.
    #[error("Invalid completion response: {0}")]
    InvalidResponse(String),
}

impl From<CompletionError> for GenerationError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Request(e) => GenerationError::Transport(e.to_string()),
            CompletionError::Timeout(secs) => GenerationError::Timeout {
                stage: GenerationStage::Text,
                secs,
            },
            CompletionError::Auth { status, body } => {
                GenerationError::Auth(format!("status {status}: {body}"))
            }
            CompletionError::RateLimited { retry_after_secs } => {
                GenerationError::RateLimited { retry_after_secs }
            }
            CompletionError::ApiError { status, body } => {
                GenerationError::Upstream { status, body }
            }
            CompletionError::InvalidResponse(msg) => GenerationError::InvalidResponse(msg),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// HTTP client for one completion endpoint and model.
pub struct CompletionClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
    timeout_secs: u64,
}

impl CompletionClient {
    /// Build a client from configuration. The configured timeout bounds
    /// every request.
    pub fn new(config: &LlmConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
        })
    }

    // ---- private helpers ----

    /// Map a non-success status to the matching [`CompletionError`].
    async fn classify_failure(response: reqwest::Response) -> CompletionError {
        let status = response.status();
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok());
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                CompletionError::Auth {
                    status: status.as_u16(),
                    body,
                }
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                CompletionError::RateLimited { retry_after_secs }
            }
            _ => CompletionError::ApiError {
                status: status.as_u16(),
                body,
            },
        }
    }
}

#[async_trait]
impl ChatCompletion for CompletionClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, CompletionError> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout(self.timeout_secs)
                } else {
                    CompletionError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::classify_failure(response).await);
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                CompletionError::InvalidResponse("missing choices[0].message.content".into())
            })
    }
}
