//! Core domain types for tokencost
//!
//! These types give strong typing to the concepts the accounting layer
//! works with: which model served a call, how many tokens it used, what
//! that cost, and the recorded session tying them together.

use crate::error::{Result, TokenCostError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of chat completion models tokencost knows how to price
///
/// Parsing is the validation boundary: any identifier outside this set
/// fails with [`TokenCostError::UnknownModel`].
///
/// # Examples
/// ```
/// use tokencost_core::types::ModelId;
///
/// let model: ModelId = "gpt-4o-mini".parse().unwrap();
/// assert_eq!(model, ModelId::Gpt4oMini);
/// assert_eq!(model.to_string(), "gpt-4o-mini");
/// assert!("not-a-real-model".parse::<ModelId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelId {
    /// Low-cost, high-throughput tier
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    /// Premium tier
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    /// Legacy mid tier
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    /// Legacy premium tier
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
}

impl ModelId {
    /// Every known model, in declaration order
    pub const ALL: [ModelId; 4] = [
        ModelId::Gpt4oMini,
        ModelId::Gpt4o,
        ModelId::Gpt35Turbo,
        ModelId::Gpt4Turbo,
    ];

    /// Canonical identifier as used by the completion API
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Gpt35Turbo => "gpt-3.5-turbo",
            ModelId::Gpt4Turbo => "gpt-4-turbo",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = TokenCostError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        ModelId::ALL
            .into_iter()
            .find(|model| model.as_str() == normalized)
            .ok_or_else(|| TokenCostError::UnknownModel(s.to_string()))
    }
}

/// Token counts reported for one completion call
///
/// Field names follow the `usage` object of the chat completions API so a
/// response body deserializes straight into this type.
///
/// # Examples
/// ```
/// use tokencost_core::types::UsageRecord;
///
/// let usage = UsageRecord::new(120, 80);
/// assert_eq!(usage.total_tokens, 200);
/// assert!(usage.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Tokens sent to the model
    pub prompt_tokens: u64,
    /// Tokens generated by the model
    pub completion_tokens: u64,
    /// Sum of prompt and completion tokens, as reported upstream
    pub total_tokens: u64,
}

impl UsageRecord {
    /// Create a record with `total_tokens` derived from its parts
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    /// Check that the reported total matches its parts
    ///
    /// Upstream counts are trusted but never priced blindly: a record whose
    /// total disagrees with prompt + completion is rejected.
    pub fn validate(&self) -> Result<()> {
        let sum = self
            .prompt_tokens
            .checked_add(self.completion_tokens)
            .ok_or_else(|| {
                TokenCostError::InvalidUsage(format!(
                    "prompt_tokens ({}) + completion_tokens ({}) overflows",
                    self.prompt_tokens, self.completion_tokens
                ))
            })?;

        if sum != self.total_tokens {
            return Err(TokenCostError::InvalidUsage(format!(
                "total_tokens ({}) != prompt_tokens ({}) + completion_tokens ({})",
                self.total_tokens, self.prompt_tokens, self.completion_tokens
            )));
        }

        Ok(())
    }
}

/// Monetary cost of one usage record, in USD
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Cost of prompt tokens
    pub input_cost: f64,
    /// Cost of completion tokens
    pub output_cost: f64,
    /// `input_cost + output_cost`
    pub total_cost: f64,
}

impl CostBreakdown {
    /// Build a breakdown, deriving the total
    pub fn new(input_cost: f64, output_cost: f64) -> Self {
        Self {
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
        }
    }
}

/// One recorded, costed interaction
///
/// Sessions are created by the tracker only; `id` is the 1-based position
/// in the tracker's append-only log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Sequential identifier, starting at 1
    pub id: u64,
    /// Model that served the call
    pub model: ModelId,
    /// Free-form label supplied by the caller
    pub description: String,
    /// Token counts for the call
    pub usage: UsageRecord,
    /// Priced cost of the call
    pub costs: CostBreakdown,
    /// Wall-clock latency of the upstream call
    pub response_time_ms: u64,
    /// When the session was recorded
    pub timestamp: DateTime<Utc>,
    /// Text returned by the model
    pub response_text: String,
}
