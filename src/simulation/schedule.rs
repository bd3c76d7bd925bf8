//! Work calendar
//!
//! Turns the configured day plan into the concrete list of timed events a
//! replication starts with: arrival batches, the open/close gate pairs of
//! every stage, packet batching and week boundaries.

use super::SimEvent;
use crate::types::{workday, DayPlan, SimulationConfig};
use std::collections::BTreeSet;
use std::fmt;

/// Start-of-day gate: drains a holding or rework queue into stations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GateOpen {
    /// New manual documents into classification (or the combined stage)
    ClassificationIntake,
    /// Classification rework queue
    ClassificationRework,
    /// Coding rework queues
    CodingRework,
    /// Placement holding queues
    PlacementIntake,
    /// Placement rework queues
    PlacementRework,
}

impl fmt::Display for GateOpen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOpen::ClassificationIntake => write!(f, "classification intake"),
            GateOpen::ClassificationRework => write!(f, "classification rework"),
            GateOpen::CodingRework => write!(f, "coding rework"),
            GateOpen::PlacementIntake => write!(f, "placement intake"),
            GateOpen::PlacementRework => write!(f, "placement rework"),
        }
    }
}

/// End-of-day gate: sweeps still-waiting jobs into escalation and rework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GateClose {
    /// Classification stations
    Classification,
    /// Coding stations
    Coding,
    /// Combined classification and coding stations
    Combined,
    /// Placement stations
    Placement,
}

impl fmt::Display for GateClose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateClose::Classification => write!(f, "classification"),
            GateClose::Coding => write!(f, "coding"),
            GateClose::Combined => write!(f, "combined classification and coding"),
            GateClose::Placement => write!(f, "placement"),
        }
    }
}

/// Mapping between working days and simulated seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkCalendar {
    day_length: f64,
    period_days: u32,
    combined: bool,
}

impl WorkCalendar {
    /// Calendar for `config`
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            day_length: config.day_length(),
            period_days: config.production_period_days,
            combined: config.routing.combined_stages,
        }
    }

    /// Productive seconds in one day
    pub fn day_length(&self) -> f64 {
        self.day_length
    }

    /// Start of day `day`
    pub fn day_start(&self, day: u32) -> f64 {
        day as f64 * self.day_length
    }

    /// When the gates of day `day` open (one second into the previous day)
    pub fn gate_open_time(&self, day: u32) -> f64 {
        self.day_start(day.saturating_sub(1)) + 1.0
    }

    /// When the gates of day `day` close
    pub fn gate_close_time(&self, day: u32) -> f64 {
        self.day_start(day)
    }

    /// One second before the end of week `week` (1-based)
    pub fn week_end(&self, week: u32) -> f64 {
        self.day_start(week * workday::DAYS_PER_WEEK) - 1.0
    }

    /// Length of a replication
    pub fn run_length(&self) -> f64 {
        self.day_start(self.period_days)
    }

    /// Full weeks in the production period
    pub fn weeks(&self) -> u32 {
        self.period_days / workday::DAYS_PER_WEEK
    }

    /// Every plan-driven event in deterministic order
    pub fn timeline(&self, plan: &DayPlan) -> Vec<(f64, SimEvent)> {
        let mut opens: BTreeSet<(u32, GateOpen)> = BTreeSet::new();
        let mut closes: BTreeSet<(u32, GateClose)> = BTreeSet::new();

        if self.combined {
            for &day in plan.classification_days.iter().chain(&plan.coding_days) {
                opens.insert((day, GateOpen::ClassificationIntake));
                closes.insert((day, GateClose::Combined));
            }
            for &day in &plan.rework_days {
                opens.insert((day, GateOpen::ClassificationRework));
                opens.insert((day, GateOpen::CodingRework));
                closes.insert((day, GateClose::Combined));
            }
        } else {
            for &day in &plan.classification_days {
                opens.insert((day, GateOpen::ClassificationIntake));
                closes.insert((day, GateClose::Classification));
            }
            for &day in &plan.coding_days {
                closes.insert((day, GateClose::Coding));
            }
            for &day in &plan.rework_days {
                opens.insert((day, GateOpen::ClassificationRework));
                opens.insert((day, GateOpen::CodingRework));
                closes.insert((day, GateClose::Classification));
                closes.insert((day, GateClose::Coding));
            }
        }
        for &day in &plan.placement_days {
            opens.insert((day, GateOpen::PlacementIntake));
            closes.insert((day, GateClose::Placement));
        }
        for &day in &plan.placement_rework_days {
            opens.insert((day, GateOpen::PlacementRework));
            closes.insert((day, GateClose::Placement));
        }

        let mut timeline = Vec::new();
        for &day in &plan.arrival_days {
            timeline.push((self.day_start(day), SimEvent::DocumentArrivals));
        }
        for (day, gate) in opens {
            timeline.push((self.gate_open_time(day), SimEvent::GateOpen(gate)));
        }
        for (day, gate) in closes {
            timeline.push((self.gate_close_time(day), SimEvent::GateClose(gate)));
        }
        for &week in &plan.batching_weeks {
            timeline.push((self.week_end(week), SimEvent::PacketBatching));
        }
        for week in 1..=self.weeks() {
            timeline.push((self.week_end(week), SimEvent::WeekBoundary(week)));
        }
        // Stable sort keeps the insertion order above among equal times
        timeline.sort_by(|a, b| a.0.total_cmp(&b.0));
        timeline
    }
}
