//! Running cost tracker
//!
//! [`CostTracker`] accumulates priced sessions from completion calls made
//! elsewhere. It never talks to the network: callers hand it the usage a
//! completion returned and it appends a costed [`Session`] to its log.
//!
//! All mutation happens under one write lock, so a tracker shared through
//! an `Arc` across tasks still assigns ids `1, 2, 3, ...` without gaps and
//! never exposes totals that disagree with the session log.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tokencost::tracker::CostTracker;
//! use tokencost_core::types::UsageRecord;
//! use tokencost_pricing::PricingTable;
//!
//! let tracker = CostTracker::new(Arc::new(PricingTable::embedded().unwrap()));
//! let session = tracker
//!     .record_session(UsageRecord::new(50, 30), "gpt-4o-mini", "Greeting", 420, "Hello!")
//!     .unwrap();
//!
//! assert_eq!(session.id, 1);
//! assert_eq!(tracker.summary().conversation_count, 1);
//! ```

use crate::export::sessions_to_csv;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokencost_core::error::{Result, TokenCostError};
use tokencost_core::types::{ModelId, Session, UsageRecord};
use tokencost_pricing::{CostCalculator, PricingTable};
use tracing::debug;

/// Source of session timestamps
pub type Clock = fn() -> DateTime<Utc>;

/// Point-in-time copy of a tracker's state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackerSummary {
    /// Sessions in recording order
    pub sessions: Vec<Session>,
    /// Sum of every session's total cost
    pub total_cost: f64,
    /// Sum of every session's total tokens
    pub total_tokens: u64,
    /// Number of recorded sessions
    pub conversation_count: usize,
}

impl TrackerSummary {
    /// Mean cost per session, zero when nothing was recorded
    pub fn average_cost_per_session(&self) -> f64 {
        if self.conversation_count == 0 {
            0.0
        } else {
            self.total_cost / self.conversation_count as f64
        }
    }
}

/// Sessions of one model, aggregated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub model: ModelId,
    pub count: usize,
    pub total_cost: f64,
    pub total_tokens: u64,
}

#[derive(Debug, Default)]
struct TrackerState {
    sessions: Vec<Session>,
    total_cost: f64,
    total_tokens: u64,
}

/// Accumulates usage and cost over a sequence of completion calls
pub struct CostTracker {
    pricing: Arc<PricingTable>,
    state: RwLock<TrackerState>,
    clock: Clock,
}

impl CostTracker {
    /// Create an empty tracker pricing sessions against `pricing`
    pub fn new(pricing: Arc<PricingTable>) -> Self {
        Self {
            pricing,
            state: RwLock::new(TrackerState::default()),
            clock: Utc::now,
        }
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    // Nothing under the write guard can panic: fallible checks run before
    // the first mutation, so a poisoned lock still holds a consistent state.
    fn read_state(&self) -> RwLockReadGuard<'_, TrackerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, TrackerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Price a completed call and append it to the session log
    ///
    /// # Errors
    ///
    /// - `InvalidUsage` if `usage.total_tokens` disagrees with its parts
    /// - `UnknownModel` if `model_id` has no pricing entry
    /// - `InvalidUsage` if the running token total would overflow
    ///
    /// On error nothing is recorded.
    pub fn record_session(
        &self,
        usage: UsageRecord,
        model_id: &str,
        description: impl Into<String>,
        response_time_ms: u64,
        response_text: impl Into<String>,
    ) -> Result<Session> {
        usage.validate()?;
        let pricing = self.pricing.price_for(model_id)?;
        let costs = CostCalculator::calculate_from_pricing(&usage, pricing);
        let description = description.into();
        let response_text = response_text.into();
        let timestamp = (self.clock)();

        let mut state = self.write_state();
        let total_tokens = state
            .total_tokens
            .checked_add(usage.total_tokens)
            .ok_or_else(|| {
                TokenCostError::InvalidUsage(format!(
                    "running total of {} tokens cannot absorb {} more",
                    state.total_tokens, usage.total_tokens
                ))
            })?;
        let session = Session {
            id: state.sessions.len() as u64 + 1,
            model: pricing.model,
            description,
            usage,
            costs,
            response_time_ms,
            timestamp,
            response_text,
        };
        state.total_tokens = total_tokens;
        state.total_cost += costs.total_cost;
        state.sessions.push(session.clone());
        drop(state);

        debug!(
            "Recorded session #{} on {}: {} tokens, ${:.6}",
            session.id, session.model, usage.total_tokens, costs.total_cost
        );

        Ok(session)
    }

    /// Snapshot of every session and the running totals
    pub fn summary(&self) -> TrackerSummary {
        let state = self.read_state();
        TrackerSummary {
            sessions: state.sessions.clone(),
            total_cost: state.total_cost,
            total_tokens: state.total_tokens,
            conversation_count: state.sessions.len(),
        }
    }

    /// Per-model totals, in order of each model's first session
    pub fn report_by_model(&self) -> Vec<ModelReport> {
        let state = self.read_state();
        let mut reports: Vec<ModelReport> = Vec::new();

        for session in &state.sessions {
            match reports.iter_mut().find(|r| r.model == session.model) {
                Some(report) => {
                    report.count += 1;
                    report.total_cost += session.costs.total_cost;
                    report.total_tokens =
                        report.total_tokens.saturating_add(session.usage.total_tokens);
                }
                None => reports.push(ModelReport {
                    model: session.model,
                    count: 1,
                    total_cost: session.costs.total_cost,
                    total_tokens: session.usage.total_tokens,
                }),
            }
        }

        reports
    }

    /// Every session as CSV, header first, no trailing newline
    pub fn export_csv(&self) -> Result<String> {
        let state = self.read_state();
        sessions_to_csv(&state.sessions)
    }

    /// Number of recorded sessions
    pub fn session_count(&self) -> usize {
        self.read_state().sessions.len()
    }

    /// Running total cost
    pub fn total_cost(&self) -> f64 {
        self.read_state().total_cost
    }

    /// Running total tokens
    pub fn total_tokens(&self) -> u64 {
        self.read_state().total_tokens
    }

    /// Mean cost per session, zero when nothing was recorded
    pub fn average_cost_per_session(&self) -> f64 {
        let state = self.read_state();
        if state.sessions.is_empty() {
            0.0
        } else {
            state.total_cost / state.sessions.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokencost_pricing::PricingEntry;

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn tracker() -> CostTracker {
        CostTracker::new(Arc::new(PricingTable::embedded().unwrap())).with_clock(fixed_clock)
    }

    #[test]
    fn test_new_tracker_is_empty() {
        let tracker = tracker();
        let summary = tracker.summary();
        assert!(summary.sessions.is_empty());
        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.total_tokens, 0);
        assert_eq!(summary.conversation_count, 0);
        assert_eq!(tracker.average_cost_per_session(), 0.0);
        assert!(tracker.report_by_model().is_empty());
    }

    #[test]
    fn test_record_session_fills_every_field() {
        let tracker = tracker();
        let session = tracker
            .record_session(UsageRecord::new(1_000_000, 500_000), "gpt-4o", "Essay", 1234, "Once upon")
            .unwrap();

        assert_eq!(session.id, 1);
        assert_eq!(session.model, ModelId::Gpt4o);
        assert_eq!(session.description, "Essay");
        assert_eq!(session.response_time_ms, 1234);
        assert_eq!(session.response_text, "Once upon");
        assert_eq!(session.timestamp, fixed_clock());
        assert!((session.costs.input_cost - 2.50).abs() < 0.01);
        assert!((session.costs.output_cost - 5.00).abs() < 0.01);
        assert!((session.costs.total_cost - 7.50).abs() < 0.01);
    }

    #[test]
    fn test_ids_are_sequential_across_models() {
        let tracker = tracker();
        for (i, model) in ["gpt-4o-mini", "gpt-4o", "gpt-4o-mini", "gpt-3.5-turbo"]
            .into_iter()
            .enumerate()
        {
            let session = tracker
                .record_session(UsageRecord::new(10, 10), model, "", 1, "")
                .unwrap();
            assert_eq!(session.id, i as u64 + 1);
        }
    }

    #[test]
    fn test_totals_are_additive() {
        let tracker = tracker();
        let a = tracker
            .record_session(UsageRecord::new(100, 200), "gpt-4o", "a", 1, "")
            .unwrap();
        let b = tracker
            .record_session(UsageRecord::new(300, 400), "gpt-4o-mini", "b", 1, "")
            .unwrap();

        let summary = tracker.summary();
        assert!((summary.total_cost - (a.costs.total_cost + b.costs.total_cost)).abs() < 1e-12);
        assert_eq!(summary.total_tokens, 1000);
        assert_eq!(summary.conversation_count, 2);
        assert_eq!(tracker.total_tokens(), 1000);
        assert_eq!(tracker.session_count(), 2);
        assert!((tracker.total_cost() - summary.total_cost).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_model_leaves_state_untouched() {
        let tracker = tracker();
        tracker
            .record_session(UsageRecord::new(1, 1), "gpt-4o", "ok", 1, "")
            .unwrap();
        let before = tracker.summary();

        let err = tracker
            .record_session(UsageRecord::new(1, 1), "not-a-real-model", "bad", 1, "")
            .unwrap_err();
        assert!(matches!(err, TokenCostError::UnknownModel(_)));
        assert_eq!(tracker.summary(), before);

        let next = tracker
            .record_session(UsageRecord::new(1, 1), "gpt-4o", "ok", 1, "")
            .unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn test_invalid_usage_rejected() {
        let tracker = tracker();
        let usage = UsageRecord {
            prompt_tokens: 10,
            completion_tokens: 10,
            total_tokens: 25,
        };
        let err = tracker
            .record_session(usage, "gpt-4o", "bad", 1, "")
            .unwrap_err();
        assert!(matches!(err, TokenCostError::InvalidUsage(_)));
        assert_eq!(tracker.session_count(), 0);
    }

    #[test]
    fn test_summary_is_a_copy() {
        let tracker = tracker();
        tracker
            .record_session(UsageRecord::new(5, 5), "gpt-4o", "x", 1, "")
            .unwrap();

        let mut snapshot = tracker.summary();
        snapshot.sessions.clear();
        snapshot.total_cost = 999.0;

        let fresh = tracker.summary();
        assert_eq!(fresh.sessions.len(), 1);
        assert!(fresh.total_cost < 1.0);
        assert_eq!(tracker.summary(), fresh);
    }

    #[test]
    fn test_report_by_model_groups_in_first_appearance_order() {
        let tracker = tracker();
        tracker
            .record_session(UsageRecord::new(50, 30), "gpt-4o", "p1", 1, "")
            .unwrap();
        tracker
            .record_session(UsageRecord::new(50, 30), "gpt-4o-mini", "c1", 1, "")
            .unwrap();
        tracker
            .record_session(UsageRecord::new(50, 30), "gpt-4o", "p2", 1, "")
            .unwrap();

        let report = tracker.report_by_model();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].model, ModelId::Gpt4o);
        assert_eq!(report[0].count, 2);
        assert_eq!(report[0].total_tokens, 160);
        assert_eq!(report[1].model, ModelId::Gpt4oMini);
        assert_eq!(report[1].count, 1);
        assert!(report[0].total_cost > report[1].total_cost);
        assert_eq!(tracker.report_by_model(), report);
    }

    #[test]
    fn test_export_csv_rows_follow_recording_order() {
        let tracker = tracker();
        tracker
            .record_session(UsageRecord::new(50, 30), "gpt-4o-mini", "first", 10, "")
            .unwrap();
        tracker
            .record_session(UsageRecord::new(50, 30), "gpt-4o", "second, with comma", 20, "")
            .unwrap();

        let csv = tracker.export_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(r#""id","model","description""#));
        assert!(lines[1].starts_with(r#""1","gpt-4o-mini","first","#));
        assert!(lines[2].starts_with(r#""2","gpt-4o","second, with comma","#));
        assert!(lines[2].ends_with(r#","20","2024-05-01T09:00:00.000Z""#));
    }

    #[test]
    fn test_token_total_overflow_rejected_without_side_effects() {
        let pricing = PricingTable::empty()
            .with_entry(PricingEntry::new(ModelId::Gpt4oMini, 0.0, 0.0).unwrap())
            .unwrap()
            .with_entry(PricingEntry::new(ModelId::Gpt4o, 2.50, 10.00).unwrap())
            .unwrap();
        let tracker = CostTracker::new(Arc::new(pricing)).with_clock(fixed_clock);

        tracker
            .record_session(UsageRecord::new(u64::MAX, 0), "gpt-4o-mini", "huge", 1, "")
            .unwrap();
        let before = tracker.summary();

        let err = tracker
            .record_session(UsageRecord::new(1_000_000, 0), "gpt-4o", "one more", 1, "")
            .unwrap_err();
        assert!(matches!(err, TokenCostError::InvalidUsage(_)));

        let after = tracker.summary();
        assert_eq!(after, before);
        assert_eq!(after.conversation_count, 1);
        assert_eq!(after.total_tokens, u64::MAX);
        let session_costs: f64 = after.sessions.iter().map(|s| s.costs.total_cost).sum();
        assert_eq!(after.total_cost, session_costs);
        assert_eq!(after.total_cost, 0.0);

        let report = tracker.report_by_model();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].total_tokens, u64::MAX);

        // The lock is not poisoned and later calls still fit.
        let next = tracker
            .record_session(UsageRecord::new(0, 0), "gpt-4o", "empty", 1, "")
            .unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn test_average_cost_per_session() {
        let tracker = tracker();
        tracker
            .record_session(UsageRecord::new(1_000_000, 0), "gpt-4o", "", 1, "")
            .unwrap();
        tracker
            .record_session(UsageRecord::new(0, 0), "gpt-4o", "", 1, "")
            .unwrap();
        assert!((tracker.average_cost_per_session() - 1.25).abs() < 1e-9);
        assert!((tracker.summary().average_cost_per_session() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_recording_keeps_ids_unique() {
        let tracker = Arc::new(tracker());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|_| {
                            tracker
                                .record_session(UsageRecord::new(10, 20), "gpt-4o-mini", "t", 1, "")
                                .unwrap()
                                .id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=400).collect::<Vec<u64>>());

        let summary = tracker.summary();
        assert_eq!(summary.total_tokens, 400 * 30);
        let ordered: Vec<u64> = summary.sessions.iter().map(|s| s.id).collect();
        assert_eq!(ordered, (1..=400).collect::<Vec<u64>>());
    }
}
