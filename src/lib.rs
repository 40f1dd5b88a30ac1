//! tokencost - token usage and cost accounting for chat completion APIs
//!
//! This library provides functionality to:
//! - Price token usage against a per-model pricing table
//! - Track costed sessions with running totals and per-model reports
//! - Export recorded sessions as CSV
//! - Project the cost of hypothetical workloads
//! - Drive completions through a pluggable client and record their usage
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokencost::{
//!     client::{ChatMessage, CompletionRequest, SimulatedClient, track_completion},
//!     tracker::CostTracker,
//!     ModelId, PricingTable,
//! };
//!
//! #[tokio::main]
//! async fn main() -> tokencost::Result<()> {
//!     let pricing = Arc::new(PricingTable::embedded()?);
//!     let tracker = CostTracker::new(pricing);
//!     let client = SimulatedClient::new();
//!
//!     let request = CompletionRequest::new(ModelId::Gpt4oMini, vec![ChatMessage::user("Hello")]);
//!     track_completion(&client, &tracker, &request, "Greeting").await?;
//!
//!     println!("{}", tracker.export_csv()?);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod demo;
pub mod export;
pub mod output;
pub mod tracker;

// Re-export commonly used types
pub use tokencost_core::error::{Result, TokenCostError};
pub use tokencost_core::types::{CostBreakdown, ModelId, Session, UsageRecord};
pub use tokencost_pricing::{
    CostCalculator, PricingEntry, PricingTable, Projection, ProjectionCalculator,
    ProjectionRequest,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
