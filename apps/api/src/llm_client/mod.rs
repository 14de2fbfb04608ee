/// LLM Client — the single point of entry for completion-service calls.
///
/// ARCHITECTURAL RULE: No other module may talk to the completion service directly.
/// All LLM interactions MUST go through `CompletionService`.
///
/// Speaks the OpenAI-compatible `/chat/completions` protocol, always streamed.
/// Sampling parameters are chosen per model tier, see `MODEL_TIERS`.
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod parser;
pub mod prompts;
pub mod stream;

use stream::StreamAccumulator;

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Stream interrupted: {0}")]
    Stream(String),
}

/// Where and how to reach the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Sampling parameters sent with a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingBudget {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Lowercased model-id marker → budget. First match wins; `None` means the
/// service defaults are used and neither field is sent.
const MODEL_TIERS: &[(&str, Option<SamplingBudget>)] = &[
    ("thinking", None),
    (
        "gemini",
        Some(SamplingBudget {
            max_tokens: 8192,
            temperature: 0.8,
        }),
    ),
];

const DEFAULT_BUDGET: SamplingBudget = SamplingBudget {
    max_tokens: 16384,
    temperature: 0.8,
};

pub fn sampling_budget(model: &str) -> Option<SamplingBudget> {
    let model = model.to_lowercase();
    MODEL_TIERS
        .iter()
        .find(|(marker, _)| model.contains(*marker))
        .map(|(_, budget)| *budget)
        .unwrap_or(Some(DEFAULT_BUDGET))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Anything that can turn a system + user message pair into completion text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Returns the full completion text once the stream is drained.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Streaming client for one configured service and model.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    config: ServiceConfig,
}

impl CompletionClient {
    pub fn new(config: ServiceConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body<'a>(&'a self, system: &'a str, user: &'a str) -> ChatRequest<'a> {
        let budget = sampling_budget(&self.config.model);
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            stream: true,
            max_tokens: budget.map(|b| b.max_tokens),
            temperature: budget.map(|b| b.temperature),
        }
    }
}

#[async_trait]
impl CompletionService for CompletionClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = self.request_body(system, user);
        debug!(
            "Sending streaming completion request: model={}, system_chars={}",
            self.config.model,
            system.chars().count()
        );

        let mut request = self
            .client
            .post(self.endpoint())
            .header("Accept", "text/event-stream")
            .json(&body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Completion service returned {}: {}", status, body);
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut accumulator = StreamAccumulator::new();
        let mut bytes = response.bytes_stream();
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| LlmError::Stream(e.to_string()))?;
            accumulator.push(&chunk);
            if accumulator.is_done() {
                break;
            }
        }

        if let Some(message) = accumulator.error() {
            warn!("Completion stream reported an error: {message}");
            return Err(LlmError::Stream(message.to_string()));
        }

        debug!(
            "Completion stream drained: frames={}, done={}",
            accumulator.frames(),
            accumulator.is_done()
        );
        Ok(accumulator.finish())
    }
}
