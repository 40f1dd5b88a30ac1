//! Cost calculator module for computing usage costs
//!
//! Every price in tokencost is quoted per million tokens, so a cost is
//! always `tokens / 1_000_000 * price_per_million`, applied separately to
//! prompt and completion tokens.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tokencost_core::types::UsageRecord;
//! use tokencost_pricing::{CostCalculator, PricingTable};
//!
//! let table = Arc::new(PricingTable::embedded().unwrap());
//! let calculator = CostCalculator::new(table);
//!
//! let usage = UsageRecord::new(1_000_000, 500_000);
//! let cost = calculator.calculate("gpt-4o", &usage).unwrap();
//! assert!((cost.total_cost - 7.50).abs() < 0.01);
//! ```

use crate::pricing_table::{PricingEntry, PricingTable};
use std::sync::Arc;
use tokencost_core::error::Result;
use tokencost_core::types::{CostBreakdown, UsageRecord};
use tracing::debug;

/// Tokens per pricing unit
pub const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Cost of `tokens` at `price_per_million`
///
/// Takes `f64` tokens so projections over fractional averages share the
/// exact formula used for recorded usage.
pub fn cost_for_tokens(tokens: f64, price_per_million: f64) -> f64 {
    tokens / TOKENS_PER_MILLION * price_per_million
}

/// Calculates costs based on token usage and pricing
pub struct CostCalculator {
    pricing: Arc<PricingTable>,
}

impl CostCalculator {
    /// Create a new CostCalculator over a pricing table
    pub fn new(pricing: Arc<PricingTable>) -> Self {
        Self { pricing }
    }

    /// Calculate the cost of `usage` for the given model
    ///
    /// # Errors
    ///
    /// Returns `UnknownModel` if the model has no pricing entry
    pub fn calculate(&self, model_id: &str, usage: &UsageRecord) -> Result<CostBreakdown> {
        let pricing = self.pricing.price_for(model_id)?;
        Ok(Self::calculate_from_pricing(usage, pricing))
    }

    /// Calculate cost from a pricing entry without a table lookup
    pub fn calculate_from_pricing(usage: &UsageRecord, pricing: &PricingEntry) -> CostBreakdown {
        let input_cost =
            cost_for_tokens(usage.prompt_tokens as f64, pricing.input_price_per_million);
        let output_cost = cost_for_tokens(
            usage.completion_tokens as f64,
            pricing.output_price_per_million,
        );
        let costs = CostBreakdown::new(input_cost, output_cost);

        debug!(
            "Calculated cost: ${:.6} for {} total tokens on {}",
            costs.total_cost, usage.total_tokens, pricing.model
        );

        costs
    }
}
