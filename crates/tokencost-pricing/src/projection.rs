//! Cost projections for hypothetical workloads
//!
//! A projection answers "what would N conversations of about T tokens
//! each cost on model M" without recording anything. It applies the same
//! per-million formula as [`CostCalculator`](crate::CostCalculator), so
//! projecting a workload and recording it call by call agree.

use crate::cost_calculator::cost_for_tokens;
use crate::pricing_table::PricingTable;
use serde::Serialize;
use std::sync::Arc;
use tokencost_core::error::{Result, TokenCostError};
use tokencost_core::types::ModelId;
use tracing::debug;

/// Share of a conversation's tokens that are prompt tokens when unspecified
pub const DEFAULT_INPUT_RATIO: f64 = 0.4;

/// Parameters of a hypothetical workload
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionRequest {
    /// Average tokens per conversation, prompt and completion together
    pub avg_tokens_per_conversation: f64,
    /// Number of conversations
    pub conversation_count: u64,
    /// Model identifier to price against
    pub model: String,
    /// Fraction of tokens that are prompt tokens, in `[0, 1]`
    pub input_ratio: f64,
}

impl ProjectionRequest {
    /// Create a request with the default 40/60 input/output split
    pub fn new(
        avg_tokens_per_conversation: f64,
        conversation_count: u64,
        model: impl Into<String>,
    ) -> Self {
        Self {
            avg_tokens_per_conversation,
            conversation_count,
            model: model.into(),
            input_ratio: DEFAULT_INPUT_RATIO,
        }
    }

    /// Override the input/output split
    pub fn with_input_ratio(mut self, input_ratio: f64) -> Self {
        self.input_ratio = input_ratio;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.avg_tokens_per_conversation.is_finite() || self.avg_tokens_per_conversation <= 0.0
        {
            return Err(TokenCostError::InvalidArgument(format!(
                "average tokens per conversation must be positive, got {}",
                self.avg_tokens_per_conversation
            )));
        }
        if self.conversation_count == 0 {
            return Err(TokenCostError::InvalidArgument(
                "conversation count must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.input_ratio) {
            return Err(TokenCostError::InvalidArgument(format!(
                "input ratio must be between 0 and 1, got {}",
                self.input_ratio
            )));
        }
        Ok(())
    }
}

/// Estimated cost of a workload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub model: ModelId,
    pub conversation_count: u64,
    pub avg_tokens_per_conversation: f64,
    pub input_ratio: f64,
    pub input_tokens: f64,
    pub output_tokens: f64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
    pub cost_per_conversation: f64,
}

/// Projects workloads onto a pricing table
///
/// Holds no mutable state; one instance can serve any number of threads.
#[derive(Debug, Clone)]
pub struct ProjectionCalculator {
    pricing: Arc<PricingTable>,
}

impl ProjectionCalculator {
    pub fn new(pricing: Arc<PricingTable>) -> Self {
        Self { pricing }
    }

    /// Estimate the cost of `request`
    ///
    /// # Errors
    ///
    /// - `UnknownModel` if the model has no pricing entry
    /// - `InvalidArgument` for a non-positive average, zero conversations
    ///   or an input ratio outside `[0, 1]`
    pub fn project(&self, request: &ProjectionRequest) -> Result<Projection> {
        request.validate()?;
        let pricing = self.pricing.price_for(&request.model)?;

        let conversations = request.conversation_count as f64;
        let output_ratio = 1.0 - request.input_ratio;
        let input_tokens = request.avg_tokens_per_conversation * request.input_ratio * conversations;
        let output_tokens = request.avg_tokens_per_conversation * output_ratio * conversations;

        let input_cost = cost_for_tokens(input_tokens, pricing.input_price_per_million);
        let output_cost = cost_for_tokens(output_tokens, pricing.output_price_per_million);
        let total_cost = input_cost + output_cost;

        debug!(
            "Projected ${:.4} for {} conversations on {}",
            total_cost, request.conversation_count, pricing.model
        );

        Ok(Projection {
            model: pricing.model,
            conversation_count: request.conversation_count,
            avg_tokens_per_conversation: request.avg_tokens_per_conversation,
            input_ratio: request.input_ratio,
            input_tokens,
            output_tokens,
            input_cost,
            output_cost,
            total_cost,
            cost_per_conversation: total_cost / conversations,
        })
    }

    /// Project the same workload onto every model in the table
    ///
    /// Results follow the table's model order. Used for side-by-side
    /// comparisons; the request's own model is ignored.
    pub fn project_all(&self, request: &ProjectionRequest) -> Result<Vec<Projection>> {
        self.pricing
            .entries()
            .map(|entry| {
                let per_model = ProjectionRequest {
                    model: entry.model.as_str().to_string(),
                    ..request.clone()
                };
                self.project(&per_model)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> ProjectionCalculator {
        ProjectionCalculator::new(Arc::new(PricingTable::embedded().unwrap()))
    }

    #[test]
    fn test_default_split() {
        let projection = calculator()
            .project(&ProjectionRequest::new(1000.0, 100, "gpt-4o"))
            .unwrap();

        // 40k input tokens at $2.50/M, 60k output tokens at $10/M
        assert!((projection.input_tokens - 40_000.0).abs() < 1e-9);
        assert!((projection.output_tokens - 60_000.0).abs() < 1e-9);
        assert!((projection.input_cost - 0.1).abs() < 1e-9);
        assert!((projection.output_cost - 0.6).abs() < 1e-9);
        assert!((projection.total_cost - 0.7).abs() < 1e-9);
        assert!((projection.cost_per_conversation - 0.007).abs() < 1e-12);
    }

    #[test]
    fn test_custom_input_ratio() {
        let all_input = calculator()
            .project(&ProjectionRequest::new(1000.0, 1000, "gpt-4o").with_input_ratio(1.0))
            .unwrap();
        assert_eq!(all_input.output_cost, 0.0);
        assert!((all_input.total_cost - 2.5).abs() < 1e-9);

        let all_output = calculator()
            .project(&ProjectionRequest::new(1000.0, 1000, "gpt-4o").with_input_ratio(0.0))
            .unwrap();
        assert_eq!(all_output.input_cost, 0.0);
        assert!((all_output.total_cost - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model() {
        assert!(matches!(
            calculator().project(&ProjectionRequest::new(100.0, 10, "not-a-real-model")),
            Err(TokenCostError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_invalid_arguments() {
        let calc = calculator();
        for request in [
            ProjectionRequest::new(0.0, 10, "gpt-4o"),
            ProjectionRequest::new(-5.0, 10, "gpt-4o"),
            ProjectionRequest::new(f64::INFINITY, 10, "gpt-4o"),
            ProjectionRequest::new(100.0, 0, "gpt-4o"),
            ProjectionRequest::new(100.0, 10, "gpt-4o").with_input_ratio(1.5),
            ProjectionRequest::new(100.0, 10, "gpt-4o").with_input_ratio(f64::NAN),
        ] {
            assert!(
                matches!(
                    calc.project(&request),
                    Err(TokenCostError::InvalidArgument(_))
                ),
                "expected rejection for {request:?}"
            );
        }
    }

    #[test]
    fn test_project_all_orders_by_table() {
        let projections = calculator()
            .project_all(&ProjectionRequest::new(500.0, 200, "gpt-4o"))
            .unwrap();
        let models: Vec<ModelId> = projections.iter().map(|p| p.model).collect();
        assert_eq!(models, ModelId::ALL.to_vec());

        let mini = &projections[0];
        let premium = &projections[1];
        assert!(premium.total_cost > mini.total_cost);
    }
}
