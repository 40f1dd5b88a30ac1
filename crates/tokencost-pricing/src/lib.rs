//! Pricing table, cost calculator and workload projections for tokencost
//!
//! This crate owns everything that turns token counts into money: the
//! per-model price list, the per-million-token cost formula, and the
//! projection of a hypothetical workload onto that formula.

pub mod cost_calculator;
pub mod pricing_table;
pub mod projection;

pub use cost_calculator::CostCalculator;
pub use pricing_table::{PricingEntry, PricingTable};
pub use projection::{Projection, ProjectionCalculator, ProjectionRequest};
