//! Scripted conversation runs
//!
//! Runs a fixed set of prompts through a [`CompletionClient`] for each
//! requested model and records every successful call on a tracker. Used
//! by the `demo` and `compare` commands.

use crate::client::{ChatMessage, CompletionClient, CompletionRequest, track_completion};
use crate::tracker::CostTracker;
use tokencost_core::error::Result;
use tokencost_core::types::{ModelId, Session};
use tracing::warn;

/// System prompt sent with every scripted conversation
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. Keep answers concise.";

/// Completion token cap for scripted conversations
pub const MAX_REPLY_TOKENS: u32 = 300;

/// `(description, prompt)` pairs run by the demo
pub const DEMO_CONVERSATIONS: &[(&str, &str)] = &[
    ("Simple question", "What is the capital of France?"),
    (
        "Explanation",
        "Explain how token-based pricing works for language model APIs.",
    ),
    (
        "Creative writing",
        "Write a short poem about a programmer debugging late at night.",
    ),
    (
        "Code generation",
        "Write a function that checks whether a string is a palindrome.",
    ),
];

/// Outcome of one scripted conversation
#[derive(Debug)]
pub struct ConversationOutcome {
    pub model: ModelId,
    pub description: String,
    pub result: Result<Session>,
}

fn request_for(model: ModelId, prompt: &str) -> CompletionRequest {
    CompletionRequest::new(
        model,
        vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
    )
    .with_max_tokens(MAX_REPLY_TOKENS)
}

/// Run every conversation on every model, in order
///
/// Failures are logged and returned alongside successes; one failed call
/// does not stop the run.
pub async fn run_conversations(
    client: &dyn CompletionClient,
    tracker: &CostTracker,
    models: &[ModelId],
    conversations: &[(&str, &str)],
) -> Vec<ConversationOutcome> {
    let mut outcomes = Vec::with_capacity(models.len() * conversations.len());

    for &model in models {
        for &(description, prompt) in conversations {
            let request = request_for(model, prompt);
            let result = track_completion(client, tracker, &request, description).await;
            if let Err(e) = &result {
                warn!("{} on {} failed: {}", description, model, e);
            }
            outcomes.push(ConversationOutcome {
                model,
                description: description.to_string(),
                result,
            });
        }
    }

    outcomes
}

/// Send one prompt to each model
pub async fn compare_models(
    client: &dyn CompletionClient,
    tracker: &CostTracker,
    models: &[ModelId],
    prompt: &str,
) -> Vec<ConversationOutcome> {
    run_conversations(client, tracker, models, &[("Model comparison", prompt)]).await
}
