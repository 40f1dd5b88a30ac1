//! Error types for tokencost
//!
//! This module defines the error type used throughout the tokencost crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use tokencost_core::error::{Result, TokenCostError};
//! use tokencost_core::types::ModelId;
//!
//! fn parse_model(name: &str) -> Result<ModelId> {
//!     name.parse()
//! }
//!
//! assert!(matches!(
//!     parse_model("not-a-real-model"),
//!     Err(TokenCostError::UnknownModel(_))
//! ));
//! ```

use thiserror::Error;

/// Main error type for tokencost operations
///
/// The accounting core only ever produces `UnknownModel`, `InvalidUsage`
/// and `InvalidArgument`. The remaining variants come from the layers
/// around it: pricing files, the completion client and the CLI.
#[derive(Error, Debug)]
pub enum TokenCostError {
    /// Model identifier with no known pricing
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Token counts that cannot be priced
    #[error("Invalid usage record: {0}")]
    InvalidUsage(String),

    /// Pricing data that violates table invariants
    #[error("Invalid pricing: {0}")]
    InvalidPricing(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Completion service answered with an error
    #[error("Completion request failed: {0}")]
    Completion(String),
}

/// Convenience type alias for Results in tokencost
pub type Result<T> = std::result::Result<T, TokenCostError>;
