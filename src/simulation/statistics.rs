//! Statistics collection
//!
//! This module contains the accumulators a replication updates while it runs
//! (counters, time-weighted levels, observation tallies) and the
//! [`RunStatistics`] structure grouping every metric the process reports.

use super::{SimulationError, SimulationResult};
use crate::types::CompletionState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-negative event counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Counter {
    value: u64,
}

impl Counter {
    /// Counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Add one
    pub fn increment(&mut self) {
        self.value += 1;
    }

    /// Add `amount`
    pub fn increment_by(&mut self, amount: u64) {
        self.value += amount;
    }

    /// Subtract one
    pub fn decrement(&mut self) -> SimulationResult<()> {
        self.decrement_by(1)
    }

    /// Subtract `amount`; going below zero is rejected and leaves the value unchanged
    pub fn decrement_by(&mut self, amount: u64) -> SimulationResult<()> {
        if amount > self.value {
            return Err(SimulationError::statistics_error(format!(
                "decrement by {} would take counter below zero (value {})",
                amount, self.value
            )));
        }
        self.value -= amount;
        Ok(())
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Level whose time-integrated average is tracked
///
/// Every change first integrates the previous level up to `now`. Window
/// averages cover the span since the previous [`TimeWeighted::close_window`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWeighted {
    value: f64,
    start: f64,
    last_change: f64,
    area: f64,
    window_start: f64,
    window_area: f64,
    maximum: f64,
}

impl TimeWeighted {
    /// Level `initial` observed from `start`
    pub fn new(initial: f64, start: f64) -> Self {
        Self {
            value: initial,
            start,
            last_change: start,
            area: 0.0,
            window_start: start,
            window_area: 0.0,
            maximum: initial,
        }
    }

    /// Current level
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Highest level seen
    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    fn advance(&mut self, now: f64) {
        let elapsed = (now - self.last_change).max(0.0);
        self.area += self.value * elapsed;
        self.window_area += self.value * elapsed;
        self.last_change = self.last_change.max(now);
    }

    /// Raise the level by `amount` at time `now`
    pub fn increment(&mut self, amount: f64, now: f64) -> SimulationResult<()> {
        if !(amount >= 0.0) {
            return Err(SimulationError::statistics_error(format!(
                "attempted increment by invalid amount {}",
                amount
            )));
        }
        self.advance(now);
        self.value += amount;
        self.maximum = self.maximum.max(self.value);
        Ok(())
    }

    /// Lower the level by `amount` at time `now`
    ///
    /// Negative amounts and decrements below zero are rejected without effect.
    pub fn decrement(&mut self, amount: f64, now: f64) -> SimulationResult<()> {
        if !(amount >= 0.0) {
            return Err(SimulationError::statistics_error(format!(
                "attempted a negative decrement of {}",
                amount
            )));
        }
        if amount > self.value {
            return Err(SimulationError::statistics_error(format!(
                "decrement by {} would take level below zero (value {})",
                amount, self.value
            )));
        }
        self.advance(now);
        self.value -= amount;
        Ok(())
    }

    /// Time-weighted average from the start up to `now`
    pub fn average(&self, now: f64) -> f64 {
        let span = now - self.start;
        if span <= 0.0 {
            return self.value;
        }
        let pending = self.value * (now - self.last_change).max(0.0);
        (self.area + pending) / span
    }

    /// Close the current window at `now` and return its average
    pub fn close_window(&mut self, now: f64) -> f64 {
        self.advance(now);
        let span = now - self.window_start;
        let average = if span > 0.0 { self.window_area / span } else { self.value };
        self.window_start = now;
        self.window_area = 0.0;
        average
    }
}

/// Summary of a stream of observations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Tally {
    count: u64,
    sum: f64,
    sum_squares: f64,
    min: f64,
    max: f64,
}

impl Tally {
    /// Empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation
    pub fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
        self.sum_squares += value * value;
    }

    /// Number of observations
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean, zero when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Sample variance, zero with fewer than two observations
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let n = self.count as f64;
        ((self.sum_squares - self.sum * self.sum / n) / (n - 1.0)).max(0.0)
    }

    /// Sample standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Smallest observation, zero when empty
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest observation, zero when empty
    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Per-stage counters of one replication
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StageCounters {
    /// Classification stage
    pub classification: Counter,
    /// Coding stage
    pub coding: Counter,
    /// Placement stage
    pub placement: Counter,
}

impl StageCounters {
    /// Sum over the stages
    pub fn total(&self) -> u64 {
        self.classification.value() + self.coding.value() + self.placement.value()
    }
}

/// Every metric one replication reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Documents created (arrivals and change orders)
    pub documents_created: Counter,
    /// Documents that left the system for any reason
    pub documents_disposed: Counter,
    /// Documents that left the system at the end of their route, not rejected
    pub documents_completed: Counter,
    /// Documents that went all the way through submission
    pub documents_submitted: Counter,
    /// Documents dropped because their category had no mapping
    pub documents_rejected: Counter,
    /// Packets created by batching and change orders
    pub packets_created: Counter,
    /// Packets that left the system
    pub packets_disposed: Counter,
    /// Packets that finished their route (submission or change-request intake)
    pub packets_completed: Counter,
    /// Documents classified by staff
    pub classified_manual: Counter,
    /// Documents classified by the automated classifier
    pub classified_auto: Counter,
    /// Coding passes completed
    pub coded: Counter,
    /// Placement visits completed
    pub placed: Counter,
    /// Standalone change orders per originating stage
    pub change_orders: StageCounters,
    /// Jobs sent back for rework per stage
    pub rework_jobs: StageCounters,
    /// Jobs that turned late per stage
    pub late_jobs: StageCounters,
    /// Workload units of packets waiting on client review
    pub awaiting_feedback: Counter,
    /// Event actions dropped after a recoverable error
    pub skipped_operations: Counter,
    /// System time of documents that went all the way through submission
    pub document_system_time: Tally,
    /// System time of every disposed document
    pub disposal_system_time: Tally,
    /// System time of regular packets
    pub packet_system_time: Tally,
    /// Documents in the system
    pub documents_in_system: TimeWeighted,
    /// Packets in the system
    pub packets_in_system: TimeWeighted,
    /// Documents per lifecycle state, indexed by [`CompletionState::index`]
    pub stage_load: Vec<TimeWeighted>,
    /// Weekly window averages of the stage load, one row per closed week
    pub weekly_stage_load: Vec<Vec<f64>>,
}

impl RunStatistics {
    /// Fresh statistics for a replication starting at `start`
    pub fn new(start: f64) -> Self {
        Self {
            documents_created: Counter::new(),
            documents_disposed: Counter::new(),
            documents_completed: Counter::new(),
            documents_submitted: Counter::new(),
            documents_rejected: Counter::new(),
            packets_created: Counter::new(),
            packets_disposed: Counter::new(),
            packets_completed: Counter::new(),
            classified_manual: Counter::new(),
            classified_auto: Counter::new(),
            coded: Counter::new(),
            placed: Counter::new(),
            change_orders: StageCounters::default(),
            rework_jobs: StageCounters::default(),
            late_jobs: StageCounters::default(),
            awaiting_feedback: Counter::new(),
            skipped_operations: Counter::new(),
            document_system_time: Tally::new(),
            disposal_system_time: Tally::new(),
            packet_system_time: Tally::new(),
            documents_in_system: TimeWeighted::new(0.0, start),
            packets_in_system: TimeWeighted::new(0.0, start),
            stage_load: CompletionState::ALL.iter().map(|_| TimeWeighted::new(0.0, start)).collect(),
            weekly_stage_load: Vec::new(),
        }
    }

    /// Move one document between lifecycle states in the stage load
    ///
    /// `None` on the left is a creation, `None` on the right a disposal.
    pub fn move_stage(
        &mut self,
        from: Option<CompletionState>,
        to: Option<CompletionState>,
        now: f64,
    ) -> SimulationResult<()> {
        if from == to {
            return Ok(());
        }
        if let Some(state) = from {
            self.stage_load[state.index()].decrement(1.0, now)?;
        }
        if let Some(state) = to {
            self.stage_load[state.index()].increment(1.0, now)?;
        }
        Ok(())
    }

    /// Close the weekly window of every stage-load level
    pub fn close_week(&mut self, now: f64) {
        let row = self.stage_load.iter_mut().map(|level| level.close_window(now)).collect();
        self.weekly_stage_load.push(row);
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "Documents: {} created, {} submitted, {} disposed | Packets: {} created, {} disposed | Late: {} | Rework: {}",
            self.documents_created,
            self.documents_submitted,
            self.documents_disposed,
            self.packets_created,
            self.packets_disposed,
            self.late_jobs.total(),
            self.rework_jobs.total()
        )
    }

    /// Multi-line breakdown for the console report
    pub fn detailed_breakdown(&self, now: f64) -> String {
        let mut breakdown = String::new();
        breakdown.push_str("=== Throughput ===\n");
        breakdown.push_str(&format!("  Documents created:    {}\n", self.documents_created));
        breakdown.push_str(&format!("  Documents completed:  {}\n", self.documents_completed));
        breakdown.push_str(&format!("  Documents submitted:  {}\n", self.documents_submitted));
        breakdown.push_str(&format!("  Documents disposed:   {}\n", self.documents_disposed));
        breakdown.push_str(&format!("  Documents rejected:   {}\n", self.documents_rejected));
        breakdown.push_str(&format!("  Packets created:      {}\n", self.packets_created));
        breakdown.push_str(&format!("  Packets disposed:     {}\n", self.packets_disposed));
        breakdown.push_str(&format!("  Packets completed:    {}\n", self.packets_completed));

        breakdown.push_str("\n=== Work Done ===\n");
        breakdown.push_str(&format!(
            "  Classified:           {} manual, {} automated\n",
            self.classified_manual, self.classified_auto
        ));
        breakdown.push_str(&format!("  Coding passes:        {}\n", self.coded));
        breakdown.push_str(&format!("  Placement visits:     {}\n", self.placed));

        breakdown.push_str("\n=== Rework & Lateness ===\n");
        for (stage, rework, late, orders) in [
            (
                "Classification",
                self.rework_jobs.classification,
                self.late_jobs.classification,
                self.change_orders.classification,
            ),
            ("Coding", self.rework_jobs.coding, self.late_jobs.coding, self.change_orders.coding),
            (
                "Placement",
                self.rework_jobs.placement,
                self.late_jobs.placement,
                self.change_orders.placement,
            ),
        ] {
            breakdown.push_str(&format!(
                "  {:<15} rework {:>6} | late {:>6} | change orders {:>4}\n",
                stage, rework, late, orders
            ));
        }

        breakdown.push_str("\n=== Flow Time (seconds) ===\n");
        breakdown.push_str(&format!(
            "  Document system time: mean {:.1}, std {:.1} over {}\n",
            self.document_system_time.mean(),
            self.document_system_time.std_dev(),
            self.document_system_time.count()
        ));
        breakdown.push_str(&format!(
            "  Packet system time:   mean {:.1}, std {:.1} over {}\n",
            self.packet_system_time.mean(),
            self.packet_system_time.std_dev(),
            self.packet_system_time.count()
        ));
        breakdown.push_str(&format!(
            "  Documents in system:  avg {:.1}, max {:.0}\n",
            self.documents_in_system.average(now),
            self.documents_in_system.maximum()
        ));

        breakdown.push_str("\n=== Stage Load (time-weighted) ===\n");
        for state in CompletionState::ALL {
            breakdown.push_str(&format!(
                "  {:<22} {:.1}\n",
                state.to_string(),
                self.stage_load[state.index()].average(now)
            ));
        }
        breakdown
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_rejects_underflow() {
        let mut counter = Counter::new();
        counter.increment_by(3);
        assert!(counter.decrement_by(4).is_err());
        assert_eq!(counter.value(), 3);
        counter.decrement().unwrap();
        assert_eq!(counter.value(), 2);
    }

    #[test]
    fn test_time_weighted_average() {
        let mut level = TimeWeighted::new(0.0, 0.0);
        level.increment(2.0, 0.0).unwrap();
        level.decrement(2.0, 10.0).unwrap();
        // 2 for 10s, then 0 for 10s
        assert!((level.average(20.0) - 1.0).abs() < 1e-12);
        assert_eq!(level.maximum(), 2.0);
    }

    #[test]
    fn test_time_weighted_rejects_invalid_changes() {
        let mut level = TimeWeighted::new(1.0, 0.0);
        assert!(level.decrement(-1.0, 1.0).is_err());
        assert!(level.decrement(2.0, 1.0).is_err());
        assert!(level.increment(f64::NAN, 1.0).is_err());
        assert_eq!(level.value(), 1.0);
    }

    #[test]
    fn test_time_weighted_windows() {
        let mut level = TimeWeighted::new(0.0, 0.0);
        level.increment(4.0, 0.0).unwrap();
        assert!((level.close_window(10.0) - 4.0).abs() < 1e-12);
        level.decrement(4.0, 15.0).unwrap();
        assert!((level.close_window(20.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_tally() {
        let mut tally = Tally::new();
        assert_eq!(tally.mean(), 0.0);
        for value in [2.0, 4.0, 6.0] {
            tally.record(value);
        }
        assert_eq!(tally.count(), 3);
        assert!((tally.mean() - 4.0).abs() < 1e-12);
        assert!((tally.variance() - 4.0).abs() < 1e-12);
        assert_eq!(tally.min(), 2.0);
        assert_eq!(tally.max(), 6.0);
    }

    #[test]
    fn test_stage_load_moves() {
        let mut stats = RunStatistics::new(0.0);
        stats.move_stage(None, Some(CompletionState::PendingClassification), 0.0).unwrap();
        stats
            .move_stage(
                Some(CompletionState::PendingClassification),
                Some(CompletionState::PendingCoding),
                5.0,
            )
            .unwrap();
        assert_eq!(stats.stage_load[0].value(), 0.0);
        assert_eq!(stats.stage_load[1].value(), 1.0);
        assert!(stats.move_stage(Some(CompletionState::PendingPlacement), None, 6.0).is_err());

        stats.close_week(10.0);
        assert_eq!(stats.weekly_stage_load.len(), 1);
        assert!((stats.weekly_stage_load[0][0] - 0.5).abs() < 1e-12);
        assert!((stats.weekly_stage_load[0][1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let mut stats = RunStatistics::new(0.0);
        stats.documents_created.increment_by(10);
        stats.late_jobs.coding.increment();
        let summary = stats.summary();
        assert!(summary.contains("10 created"));
        assert!(summary.contains("Late: 1"));
    }
}
