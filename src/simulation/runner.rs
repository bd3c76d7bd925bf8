//! Replication runner
//!
//! Runs independent replications of one configuration and summarises them.
//! Each replication gets a fresh [`Orchestrator`] and therefore a fresh run
//! context; with a base seed, replication `i` is seeded with `seed + i`.

use super::{Census, Orchestrator, RunStatistics, SimulationResult, Tally};
use crate::catalog::CategoryCatalog;
use crate::types::{RunId, SimulationConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;

/// Outcome of one replication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier of this run
    pub run_id: RunId,
    /// Replication index
    pub replication: usize,
    /// Seed used, if the run was seeded
    pub seed: Option<u64>,
    /// Wall-clock start
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds
    pub wall_clock_ms: u64,
    /// Simulated length of the run in seconds
    pub simulated_time: f64,
    /// Events handled
    pub events_processed: u64,
    /// Jobs still in the system at the end
    pub census: Census,
    /// Everything collected during the run
    pub statistics: RunStatistics,
}

impl RunReport {
    /// Headline metrics in a fixed order
    pub fn metrics(&self) -> Vec<(&'static str, f64)> {
        let stats = &self.statistics;
        let end = self.simulated_time;
        vec![
            ("documents_created", stats.documents_created.value() as f64),
            ("documents_completed", stats.documents_completed.value() as f64),
            ("documents_submitted", stats.documents_submitted.value() as f64),
            ("documents_disposed", stats.documents_disposed.value() as f64),
            ("documents_rejected", stats.documents_rejected.value() as f64),
            ("packets_created", stats.packets_created.value() as f64),
            ("packets_disposed", stats.packets_disposed.value() as f64),
            ("packets_completed", stats.packets_completed.value() as f64),
            ("classified_manual", stats.classified_manual.value() as f64),
            ("classified_auto", stats.classified_auto.value() as f64),
            ("coded", stats.coded.value() as f64),
            ("placed", stats.placed.value() as f64),
            ("rework_classification", stats.rework_jobs.classification.value() as f64),
            ("rework_coding", stats.rework_jobs.coding.value() as f64),
            ("rework_placement", stats.rework_jobs.placement.value() as f64),
            ("late_classification", stats.late_jobs.classification.value() as f64),
            ("late_coding", stats.late_jobs.coding.value() as f64),
            ("late_placement", stats.late_jobs.placement.value() as f64),
            ("change_orders_classification", stats.change_orders.classification.value() as f64),
            ("change_orders_coding", stats.change_orders.coding.value() as f64),
            ("change_orders_placement", stats.change_orders.placement.value() as f64),
            ("awaiting_feedback", stats.awaiting_feedback.value() as f64),
            ("skipped_operations", stats.skipped_operations.value() as f64),
            ("document_system_time_mean", stats.document_system_time.mean()),
            ("packet_system_time_mean", stats.packet_system_time.mean()),
            ("documents_in_system_avg", stats.documents_in_system.average(end)),
            ("packets_in_system_avg", stats.packets_in_system.average(end)),
            ("census_documents", self.census.documents as f64),
            ("census_packets", self.census.packets as f64),
        ]
    }
}

/// Spread of one metric across replications
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Mean
    pub mean: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
}

impl From<&Tally> for MetricSummary {
    fn from(tally: &Tally) -> Self {
        Self { mean: tally.mean(), std_dev: tally.std_dev(), min: tally.min(), max: tally.max() }
    }
}

/// Metrics of every replication, summarised
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicationSummary {
    /// Replications summarised
    pub replications: usize,
    /// Spread per metric name
    pub metrics: BTreeMap<String, MetricSummary>,
}

impl ReplicationSummary {
    /// Summarise `reports`
    pub fn from_reports(reports: &[RunReport]) -> Self {
        let mut tallies: BTreeMap<&'static str, Tally> = BTreeMap::new();
        for report in reports {
            for (name, value) in report.metrics() {
                tallies.entry(name).or_default().record(value);
            }
        }
        Self {
            replications: reports.len(),
            metrics: tallies
                .iter()
                .map(|(name, tally)| (name.to_string(), MetricSummary::from(tally)))
                .collect(),
        }
    }

    /// Summary of one metric
    pub fn metric(&self, name: &str) -> Option<&MetricSummary> {
        self.metrics.get(name)
    }

    /// Console table
    pub fn to_table(&self) -> String {
        let mut table = format!("=== Summary over {} replications ===\n", self.replications);
        table.push_str(&format!(
            "  {:<30} {:>12} {:>12} {:>12} {:>12}\n",
            "metric", "mean", "std dev", "min", "max"
        ));
        for (name, metric) in &self.metrics {
            table.push_str(&format!(
                "  {:<30} {:>12.2} {:>12.2} {:>12.2} {:>12.2}\n",
                name, metric.mean, metric.std_dev, metric.min, metric.max
            ));
        }
        table
    }
}

/// Every replication of one configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationSet {
    /// One report per replication, in index order
    pub reports: Vec<RunReport>,
    /// Spread of the headline metrics
    pub summary: ReplicationSummary,
}

/// Runs replications of one configuration
#[derive(Debug, Clone)]
pub struct ReplicationRunner {
    config: SimulationConfig,
    catalog: CategoryCatalog,
}

impl ReplicationRunner {
    /// Runner for `config` over `catalog`
    pub fn new(config: SimulationConfig, catalog: CategoryCatalog) -> Self {
        Self { config, catalog }
    }

    /// Configuration being replicated
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run replication `index`
    pub fn run_replication(&self, index: usize) -> SimulationResult<RunReport> {
        let _span = crate::perf_span!("replication", replication = index).entered();
        let started_at = Utc::now();
        let clock = Instant::now();
        let seed = self.config.replication_seed(index);

        let mut orchestrator = Orchestrator::new(&self.config, self.catalog.clone(), seed)?;
        orchestrator.run()?;

        let report = RunReport {
            run_id: RunId::new(),
            replication: index,
            seed,
            started_at,
            wall_clock_ms: clock.elapsed().as_millis() as u64,
            simulated_time: orchestrator.work_calendar().run_length(),
            events_processed: orchestrator.events_processed(),
            census: orchestrator.census(),
            statistics: orchestrator.statistics().clone(),
        };
        info!(
            component = "simulation",
            replication = index,
            run_id = %report.run_id,
            events = report.events_processed,
            submitted = report.statistics.documents_submitted.value(),
            wall_clock_ms = report.wall_clock_ms,
            "Replication finished"
        );
        Ok(report)
    }

    /// Run every configured replication
    pub fn run_all(&self) -> SimulationResult<ReplicationSet> {
        self.run_many(self.config.replications)
    }

    /// Run the first `count` replications
    pub fn run_many(&self, count: usize) -> SimulationResult<ReplicationSet> {
        info!("Running {} replications", count);
        let reports = (0..count)
            .map(|index| self.run_replication(index))
            .collect::<SimulationResult<Vec<_>>>()?;
        let summary = ReplicationSummary::from_reports(&reports);
        Ok(ReplicationSet { reports, summary })
    }
}
