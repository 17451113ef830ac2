/// LLM Client: the single point of entry for all model backend calls.
///
/// ARCHITECTURAL RULE: No other module may talk to a model endpoint directly.
/// All generation stages go through the `ModelBackend` trait defined here.
///
/// One call per stage, no retries: a failed call fails the whole request.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, ModelProvider};

pub mod prompts;
pub mod readiness;

pub use readiness::{BackendUnavailable, ModelSlot};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("model endpoint unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("model call timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed model response: {0}")]
    Malformed(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Unreachable(e)
        }
    }
}

/// The model backend seam. One operation: rendered prompt in, generated text out.
///
/// Carried in `ModelSlot` as `Arc<dyn ModelBackend>` so tests can script responses.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

/// Error envelope shared closely enough by both providers: `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP client
// ────────────────────────────────────────────────────────────────────────────

/// HTTP model backend speaking either the Anthropic Messages API or an
/// OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    provider: ModelProvider,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn from_config(config: &Config, api_key: String) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.model_timeout_secs))
            .build()
            .map_err(LlmError::Client)?;

        Ok(Self {
            client,
            provider: config.model_provider,
            api_url: config.model_api_url.clone(),
            api_key,
            model: config.model_name.clone(),
            max_tokens: config.model_max_tokens,
        })
    }

    fn build_request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let system = prompts::CAREER_COACH_SYSTEM;
        match self.provider {
            ModelProvider::Anthropic => self
                .client
                .post(&self.api_url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&AnthropicRequest {
                    model: &self.model,
                    max_tokens: self.max_tokens,
                    system,
                    messages: vec![ChatMessage {
                        role: "user",
                        content: prompt,
                    }],
                }),
            ModelProvider::OpenAi => self
                .client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .json(&OpenAiRequest {
                    model: &self.model,
                    max_tokens: self.max_tokens,
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: system,
                        },
                        ChatMessage {
                            role: "user",
                            content: prompt,
                        },
                    ],
                }),
        }
    }
}

#[async_trait]
impl ModelBackend for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .build_request(prompt)
            .send()
            .await
            .map_err(LlmError::from_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(LlmError::from_transport)?;

        if !status.is_success() {
            // Try to parse error message
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = match self.provider {
            ModelProvider::Anthropic => anthropic_text(&body)?,
            ModelProvider::OpenAi => openai_text(&body)?,
        };

        debug!(
            "Model call succeeded: prompt_chars={}, response_chars={}",
            prompt.len(),
            text.len()
        );

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Extracts the text content from the first text block of a Messages API body.
fn anthropic_text(body: &str) -> Result<String, LlmError> {
    let response: AnthropicResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Malformed(e.to_string()))?;

    if let Some(usage) = &response.usage {
        debug!(
            "Token usage: input_tokens={}, output_tokens={}",
            usage.input_tokens, usage.output_tokens
        );
    }

    let text = response
        .content
        .into_iter()
        .find(|b| b.block_type == "text")
        .and_then(|b| b.text)
        .ok_or(LlmError::EmptyContent)?;

    non_empty(text)
}

fn openai_text(body: &str) -> Result<String, LlmError> {
    let response: OpenAiResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Malformed(e.to_string()))?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(LlmError::EmptyContent)?;

    non_empty(text)
}

fn non_empty(text: String) -> Result<String, LlmError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(LlmError::EmptyContent)
    } else {
        Ok(trimmed.to_string())
    }
}
