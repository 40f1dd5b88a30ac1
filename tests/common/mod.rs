//! Common test utilities for tokencost integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tokencost::{
    ModelId, PricingEntry, PricingTable, ProjectionCalculator, tracker::CostTracker,
};

/// Fixed timestamp so CSV output is stable
pub fn fixed_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap()
}

/// Built-in pricing, shared
pub fn embedded_pricing() -> Arc<PricingTable> {
    Arc::new(PricingTable::embedded().unwrap())
}

/// Two-tier table: gpt-4o-mini as the cheap tier, gpt-4o as premium
pub fn two_tier_pricing() -> Arc<PricingTable> {
    let table = PricingTable::empty()
        .with_entry(PricingEntry::new(ModelId::Gpt4oMini, 0.15, 0.60).unwrap())
        .unwrap()
        .with_entry(PricingEntry::new(ModelId::Gpt4o, 2.50, 10.00).unwrap())
        .unwrap();
    Arc::new(table)
}

pub fn tracker_with(pricing: Arc<PricingTable>) -> CostTracker {
    CostTracker::new(pricing).with_clock(fixed_clock)
}

pub fn projection_calculator() -> ProjectionCalculator {
    ProjectionCalculator::new(embedded_pricing())
}

/// Parse a CSV export with a standard reader, returning header and rows
pub fn parse_csv(text: &str) -> (Vec<String>, Vec<csv::StringRecord>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader.records().map(|r| r.unwrap()).collect();
    (headers, rows)
}
