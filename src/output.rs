//! Output formatting module for tokencost
//!
//! This module provides formatters for tracker summaries, per-model
//! reports, projections and the pricing table:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output
//!
//! CSV is not a formatter here: it is the tracker's own export format,
//! see [`crate::export`].
//!
//! # Examples
//!
//! ```
//! use tokencost::output::get_formatter;
//! use tokencost::tracker::TrackerSummary;
//!
//! let formatter = get_formatter(false);
//! println!("{}", formatter.format_summary(&TrackerSummary::default()));
//! ```

use crate::tracker::{ModelReport, TrackerSummary};
use prettytable::{Table, format, row};
use serde_json::json;
use tokencost_pricing::{PricingTable, Projection};

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format every session plus running totals
    fn format_summary(&self, summary: &TrackerSummary) -> String;

    /// Format the per-model breakdown
    fn format_model_report(&self, report: &[ModelReport]) -> String;

    /// Format one or more workload projections
    fn format_projections(&self, projections: &[Projection]) -> String;

    /// Format the pricing table
    fn format_pricing(&self, pricing: &PricingTable) -> String;
}

/// Table formatter for human-readable output
pub struct TableFormatter;

impl TableFormatter {
    /// Format a number with thousands separators
    fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    /// Format a cost; per-call amounts are far below a cent
    fn format_currency(amount: f64) -> String {
        format!("${amount:.6}")
    }

    fn new_table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }
}

impl OutputFormatter for TableFormatter {
    fn format_summary(&self, summary: &TrackerSummary) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "#",
            b -> "Model",
            b -> "Description",
            b -> "Prompt",
            b -> "Completion",
            b -> "Total",
            b -> "Cost",
            b -> "Time (ms)"
        ]);

        for session in &summary.sessions {
            table.add_row(row![
                r -> session.id,
                session.model,
                session.description,
                r -> Self::format_number(session.usage.prompt_tokens),
                r -> Self::format_number(session.usage.completion_tokens),
                r -> Self::format_number(session.usage.total_tokens),
                r -> Self::format_currency(session.costs.total_cost),
                r -> session.response_time_ms
            ]);
        }

        table.add_row(row![
            b -> "TOTAL",
            "",
            b -> format!("{} conversations", summary.conversation_count),
            "",
            "",
            b -> Self::format_number(summary.total_tokens),
            b -> Self::format_currency(summary.total_cost),
            ""
        ]);

        format!(
            "{}\nAverage cost per conversation: {}\n",
            table,
            Self::format_currency(summary.average_cost_per_session())
        )
    }

    fn format_model_report(&self, report: &[ModelReport]) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Model",
            b -> "Conversations",
            b -> "Total Tokens",
            b -> "Total Cost",
            b -> "Avg Cost"
        ]);

        for entry in report {
            table.add_row(row![
                entry.model,
                r -> entry.count,
                r -> Self::format_number(entry.total_tokens),
                r -> Self::format_currency(entry.total_cost),
                r -> Self::format_currency(entry.total_cost / entry.count.max(1) as f64)
            ]);
        }

        table.to_string()
    }

    fn format_projections(&self, projections: &[Projection]) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Model",
            b -> "Conversations",
            b -> "Input Tokens",
            b -> "Output Tokens",
            b -> "Input Cost",
            b -> "Output Cost",
            b -> "Total Cost",
            b -> "Per Conversation"
        ]);

        for p in projections {
            table.add_row(row![
                p.model,
                r -> Self::format_number(p.conversation_count),
                r -> Self::format_number(p.input_tokens.round() as u64),
                r -> Self::format_number(p.output_tokens.round() as u64),
                r -> format!("${:.2}", p.input_cost),
                r -> format!("${:.2}", p.output_cost),
                r -> format!("${:.2}", p.total_cost),
                r -> Self::format_currency(p.cost_per_conversation)
            ]);
        }

        table.to_string()
    }

    fn format_pricing(&self, pricing: &PricingTable) -> String {
        let mut table = Self::new_table();
        table.set_titles(row![
            b -> "Model",
            b -> "Input / 1M tokens",
            b -> "Output / 1M tokens"
        ]);

        for entry in pricing.entries() {
            table.add_row(row![
                entry.model,
                r -> format!("${:.2}", entry.input_price_per_million),
                r -> format!("${:.2}", entry.output_price_per_million)
            ]);
        }

        table.to_string()
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_summary(&self, summary: &TrackerSummary) -> String {
        let output = json!({
            "sessions": summary.sessions,
            "totals": {
                "total_cost": summary.total_cost,
                "total_tokens": summary.total_tokens,
                "conversation_count": summary.conversation_count,
                "average_cost_per_conversation": summary.average_cost_per_session(),
            }
        });
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_model_report(&self, report: &[ModelReport]) -> String {
        let output = json!({ "models": report });
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_projections(&self, projections: &[Projection]) -> String {
        let output = json!({ "projections": projections });
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_pricing(&self, pricing: &PricingTable) -> String {
        let entries: Vec<_> = pricing.entries().collect();
        let output = json!({ "pricing": entries });
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Get the appropriate formatter
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::CostTracker;
    use std::sync::Arc;
    use tokencost_core::types::{ModelId, UsageRecord};
    use tokencost_pricing::{ProjectionCalculator, ProjectionRequest};

    fn populated_tracker() -> CostTracker {
        let tracker = CostTracker::new(Arc::new(PricingTable::embedded().unwrap()));
        tracker
            .record_session(UsageRecord::new(1200, 800), "gpt-4o", "Long answer", 900, "...")
            .unwrap();
        tracker
            .record_session(UsageRecord::new(50, 30), "gpt-4o-mini", "Greeting", 300, "Hi")
            .unwrap();
        tracker
    }

    #[test]
    fn test_format_number() {
        assert_eq!(TableFormatter::format_number(0), "0");
        assert_eq!(TableFormatter::format_number(999), "999");
        assert_eq!(TableFormatter::format_number(1000), "1,000");
        assert_eq!(TableFormatter::format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(TableFormatter::format_currency(0.0), "$0.000000");
        assert_eq!(TableFormatter::format_currency(7.5), "$7.500000");
    }

    #[test]
    fn test_table_summary_lists_sessions_and_totals() {
        let output = TableFormatter.format_summary(&populated_tracker().summary());
        assert!(output.contains("Long answer"));
        assert!(output.contains("Greeting"));
        assert!(output.contains("gpt-4o-mini"));
        assert!(output.contains("TOTAL"));
        assert!(output.contains("2 conversations"));
        assert!(output.contains("2,080"));
    }

    #[test]
    fn test_table_pricing() {
        let output = TableFormatter.format_pricing(&PricingTable::embedded().unwrap());
        assert!(output.contains("gpt-3.5-turbo"));
        assert!(output.contains("$2.50"));
        assert!(output.contains("$10.00"));
    }

    #[test]
    fn test_json_summary_totals() {
        let output = JsonFormatter.format_summary(&populated_tracker().summary());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["sessions"].as_array().unwrap().len(), 2);
        assert_eq!(value["sessions"][0]["model"], "gpt-4o");
        assert_eq!(value["totals"]["conversation_count"], 2);
        assert_eq!(value["totals"]["total_tokens"], 2080);
    }

    #[test]
    fn test_json_model_report() {
        let tracker = populated_tracker();
        let output = JsonFormatter.format_model_report(&tracker.report_by_model());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let models = value["models"].as_array().unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[1]["model"], "gpt-4o-mini");
        assert_eq!(models[1]["count"], 1);
    }

    #[test]
    fn test_json_projection() {
        let calculator = ProjectionCalculator::new(Arc::new(PricingTable::embedded().unwrap()));
        let projection = calculator
            .project(&ProjectionRequest::new(1000.0, 100, "gpt-4o"))
            .unwrap();
        let output = JsonFormatter.format_projections(&[projection]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["projections"][0]["model"], "gpt-4o");
        assert_eq!(value["projections"][0]["conversation_count"], 100);
    }

    #[test]
    fn test_json_pricing_uses_canonical_names() {
        let output = JsonFormatter.format_pricing(&PricingTable::embedded().unwrap());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        let first = &value["pricing"][0];
        assert_eq!(first["model"], ModelId::Gpt4oMini.as_str());
        assert_eq!(first["input_price_per_million"], 0.15);
    }
}
