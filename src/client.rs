//! Completion clients that produce usage for the tracker
//!
//! The tracker only needs `(usage, text, latency)` triples. Anything able
//! to produce them implements [`CompletionClient`]: the real chat
//! completions API through [`OpenAiClient`], or [`SimulatedClient`] for
//! offline runs and tests.

use crate::tracker::CostTracker;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokencost_core::error::{Result, TokenCostError};
use tokencost_core::types::{ModelId, Session, UsageRecord};
use tracing::{debug, info};

/// Default chat completions endpoint root
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// One chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A chat completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: ModelId,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(model: ModelId, messages: Vec<ChatMessage>) -> Self {
        Self {
            model,
            messages,
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// What a completion call returned
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub usage: UsageRecord,
    pub text: String,
    pub response_time_ms: u64,
}

/// Anything that can run a chat completion and report its usage
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run `request` and return usage, text and latency
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

/// Run a completion and record it on `tracker`
///
/// A failed call records nothing.
pub async fn track_completion(
    client: &dyn CompletionClient,
    tracker: &CostTracker,
    request: &CompletionRequest,
    description: &str,
) -> Result<Session> {
    let completion = client.complete(request).await?;
    let session = tracker.record_session(
        completion.usage,
        request.model.as_str(),
        description,
        completion.response_time_ms,
        completion.text,
    )?;

    info!(
        "{}: {} tokens on {} (${:.6})",
        description, session.usage.total_tokens, session.model, session.costs.total_cost
    );

    Ok(session)
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: UsageRecord,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Extract usage and first-choice text from a chat completions body
pub fn parse_chat_response(body: &str) -> Result<(UsageRecord, String)> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();
    Ok((response.usage, text))
}

/// Chat completions client over HTTP
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client authenticating with `api_key`
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TokenCostError::Config("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
        })
    }

    /// Create a client from `OPENAI_API_KEY`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| TokenCostError::Config("OPENAI_API_KEY is not set".to_string()))?;
        Self::new(api_key)
    }

    /// Point the client at a compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let started = Instant::now();
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let response_time_ms = started.elapsed().as_millis() as u64;
        debug!("Completion response {} in {}ms", status, response_time_ms);

        if !status.is_success() {
            return Err(TokenCostError::Completion(format!("{status}: {body}")));
        }

        let (usage, text) = parse_chat_response(&body)?;
        Ok(Completion {
            usage,
            text,
            response_time_ms,
        })
    }
}

/// Offline stand-in producing deterministic usage
///
/// Prompt tokens are estimated at four characters per token over all
/// message contents; completion tokens are fixed per client.
#[derive(Debug, Clone)]
pub struct SimulatedClient {
    reply_tokens: u64,
    response_time_ms: u64,
}

impl SimulatedClient {
    pub fn new() -> Self {
        Self {
            reply_tokens: 120,
            response_time_ms: 250,
        }
    }

    pub fn with_reply_tokens(mut self, reply_tokens: u64) -> Self {
        self.reply_tokens = reply_tokens;
        self
    }

    pub fn with_response_time_ms(mut self, response_time_ms: u64) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    /// Rough token estimate for a piece of text
    pub fn estimate_tokens(text: &str) -> u64 {
        (text.chars().count() as u64).div_ceil(4)
    }
}

impl Default for SimulatedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for SimulatedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let prompt_tokens = request
            .messages
            .iter()
            .map(|m| Self::estimate_tokens(&m.content))
            .sum::<u64>()
            .max(1);
        let completion_tokens = match request.max_tokens {
            Some(limit) => self.reply_tokens.min(u64::from(limit)),
            None => self.reply_tokens,
        };

        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        Ok(Completion {
            usage: UsageRecord::new(prompt_tokens, completion_tokens),
            text: format!("[simulated {}] reply to: {}", request.model, last_user),
            response_time_ms: self.response_time_ms,
        })
    }
}
