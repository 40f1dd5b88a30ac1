//! Core types and error handling for tokencost
//!
//! This crate provides the domain types shared by the pricing crate and
//! the tracker: model identifiers, token usage records, cost breakdowns
//! and recorded sessions.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TokenCostError};
pub use types::{CostBreakdown, ModelId, Session, UsageRecord};
