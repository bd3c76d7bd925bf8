//! End-to-end tests of the document flow
//!
//! Each test runs one or more short replications and checks a property that
//! must hold whatever the random draws: nothing created is lost, rework is
//! triggered once per failure, lateness is counted once per job.

use docflow_sim::catalog::CategoryCatalog;
use docflow_sim::resources::Distribution;
use docflow_sim::simulation::{Orchestrator, ReplicationRunner};
use docflow_sim::types::{DayPlan, DivisionRule, SimulationConfig};

/// Two arrival weeks with every stage working at least once after each arrival
fn two_week_config() -> SimulationConfig {
    SimulationConfig {
        production_period_days: 10,
        arrival_mean: 300.0,
        arrival_std_dev: 30.0,
        replications: 1,
        day_plan: DayPlan {
            arrival_days: vec![0, 5],
            classification_days: vec![1, 6],
            coding_days: vec![2, 7],
            rework_days: vec![4, 9],
            placement_days: vec![6, 7, 8],
            placement_rework_days: vec![9, 10],
            batching_weeks: vec![1],
        },
        ..Default::default()
    }
}

fn run(config: &SimulationConfig, seed: u64) -> Orchestrator {
    config.validate().unwrap();
    let mut orchestrator = Orchestrator::new(config, CategoryCatalog::default(), Some(seed)).unwrap();
    orchestrator.run().unwrap();
    orchestrator
}

fn assert_conserved(orchestrator: &Orchestrator) {
    let stats = orchestrator.statistics();
    let census = orchestrator.census();
    assert_eq!(
        stats.documents_created.value(),
        stats.documents_disposed.value() + census.documents,
        "documents leaked"
    );
    assert_eq!(
        stats.packets_created.value(),
        stats.packets_disposed.value() + census.packets,
        "packets leaked"
    );
    assert!(stats.documents_submitted.value() <= stats.documents_disposed.value());
}

/// Every document and packet is either still in the system or disposed
#[test]
fn test_conservation_across_seeds() {
    let config = two_week_config();
    for seed in 1..=4 {
        let orchestrator = run(&config, seed);
        assert!(orchestrator.statistics().documents_created.value() > 0);
        assert_conserved(&orchestrator);
        assert_eq!(orchestrator.statistics().skipped_operations.value(), 0);
    }
}

/// Conservation holds under every staffing and queue layout
#[test]
fn test_conservation_across_layouts() {
    let mut single_queues = two_week_config();
    single_queues.routing.classification_single_queue = true;
    single_queues.routing.coding_single_queue = true;
    single_queues.routing.placement_single_queue = true;

    let mut combined = two_week_config();
    combined.routing.combined_stages = true;

    let mut dedicated = two_week_config();
    dedicated.staffing.classification_employees = 3;
    dedicated.staffing.classification_trainees = 2;
    dedicated.routing.classification_rule = DivisionRule::TrainingAware;
    dedicated.routing.coding_rule = DivisionRule::UniformRandom;
    dedicated.routing.placement_rule = DivisionRule::UniformRandom;

    let mut coders_in_training = two_week_config();
    coders_in_training.staffing.coding_trainees = 2;
    coders_in_training.routing.classification_rule = DivisionRule::TrainingAware;

    for config in [single_queues, combined, dedicated, coders_in_training] {
        let orchestrator = run(&config, 8);
        assert_conserved(&orchestrator);
    }
}

/// Conservation also holds part-way through a run, with jobs still in service
#[test]
fn test_conservation_mid_run() {
    let config = two_week_config();
    let mut orchestrator = Orchestrator::new(&config, CategoryCatalog::default(), Some(5)).unwrap();
    let calendar = *orchestrator.work_calendar();
    for day in 1..=10 {
        orchestrator.run_until(calendar.gate_close_time(day) - 100.0).unwrap();
        assert_conserved(&orchestrator);
    }
}

/// Nothing fails the first-time-right check, so nothing is reworked
#[test]
fn test_perfect_quality_never_reworks() {
    let mut config = two_week_config();
    config.quality.ftr_classification = 1.0;
    config.quality.ftr_coding = 1.0;
    config.quality.ftr_placement = 1.0;

    let orchestrator = run(&config, 3);
    let rework = &orchestrator.statistics().rework_jobs;
    assert_eq!(rework.classification.value(), 0);
    assert_eq!(rework.coding.value(), 0);
    assert_eq!(rework.placement.value(), 0);
    assert!(orchestrator.statistics().placed.value() > 0);
}

/// One arrival batch, no change orders, and enough placement and rework
/// cycles after it for every document to reach submission
fn drained_config(period: u32, day_plan: DayPlan) -> SimulationConfig {
    let mut config = SimulationConfig {
        production_period_days: period,
        arrival_mean: 40.0,
        arrival_std_dev: 0.0,
        classification_only_percentage: 0.0,
        replications: 1,
        day_plan,
        change_order_gap: Distribution::Constant { value: 1.0e12 },
        ..Default::default()
    };
    config.quality.ftr_classification = 1.0;
    config.quality.ftr_coding = 1.0;
    config.quality.ftr_placement = 1.0;
    config
}

fn assert_drained(orchestrator: &Orchestrator) {
    let stats = orchestrator.statistics();
    let census = orchestrator.census();
    assert_eq!(census.documents, 0, "documents left in the system");
    assert_eq!(census.packets, 0, "packets left in the system");
    assert_eq!(stats.documents_disposed.value(), stats.documents_created.value());
    assert_eq!(stats.documents_submitted.value(), stats.documents_created.value());
    assert_eq!(stats.documents_completed.value(), stats.documents_created.value());
    assert_eq!(stats.packets_disposed.value(), stats.packets_created.value());
    assert_eq!(stats.packets_completed.value(), stats.packets_created.value());
    assert_eq!(stats.skipped_operations.value(), 0);
}

/// Each packet visits placement once per workload unit: seven visits send it
/// straight back, the eighth forwards it to validation
#[test]
fn test_every_packet_is_placed_once_per_workload_unit() {
    let config = drained_config(
        10,
        DayPlan {
            arrival_days: vec![0],
            classification_days: vec![1],
            coding_days: vec![2],
            rework_days: vec![],
            placement_days: vec![6],
            placement_rework_days: vec![7, 8],
            batching_weeks: vec![1],
        },
    );
    assert_eq!(config.workload_factor, 8);

    let orchestrator = run(&config, 21);
    let stats = orchestrator.statistics();
    assert!(stats.packets_created.value() > 0);
    assert_eq!(stats.placed.value(), 8 * stats.packets_created.value());
    assert_eq!(stats.rework_jobs.total(), 0);
    assert_drained(&orchestrator);
}

/// Classification and coding always fail: every document goes back to each
/// stage exactly once, and the second pass clears the credit instead of
/// earning another one
#[test]
fn test_failed_classification_and_coding_are_reworked_once() {
    let mut config = drained_config(
        35,
        DayPlan {
            arrival_days: vec![0],
            classification_days: vec![1],
            coding_days: vec![2],
            rework_days: vec![7, 12, 17, 22, 27],
            placement_days: vec![6, 11, 16, 21, 26, 31],
            placement_rework_days: vec![8, 13, 18, 23, 28, 33],
            batching_weeks: vec![1, 2, 3, 4, 5, 6],
        },
    );
    config.quality.ftr_classification = 0.0;
    config.quality.ftr_coding = 0.0;

    let orchestrator = run(&config, 12);
    let stats = orchestrator.statistics();
    let created = stats.documents_created.value();
    assert!(created > 0);
    assert_eq!(stats.rework_jobs.classification.value(), created);
    assert_eq!(stats.rework_jobs.coding.value(), created);
    // First pass, after reclassification (fails), after coding rework (clears)
    assert_eq!(stats.coded.value(), 3 * created);
    assert_drained(&orchestrator);
}

/// Single-round packets that always fail placement go back from validation exactly once
#[test]
fn test_failed_placement_is_reworked_once() {
    let mut config = two_week_config();
    config.workload_factor = 1;
    config.quality.ftr_classification = 1.0;
    config.quality.ftr_coding = 1.0;
    config.quality.ftr_placement = 0.0;

    let orchestrator = run(&config, 13);
    let stats = orchestrator.statistics();
    let reworked = stats.rework_jobs.placement.value();
    assert!(reworked > 0);
    assert!(reworked <= stats.packets_created.value());
    assert_conserved(&orchestrator);
}

/// With several rounds the credit is settled by the next round, before validation
#[test]
fn test_placement_credit_is_settled_between_rounds() {
    let mut config = two_week_config();
    config.quality.ftr_placement = 0.0;

    let orchestrator = run(&config, 13);
    assert_eq!(orchestrator.statistics().rework_jobs.placement.value(), 0);
    assert_conserved(&orchestrator);
}

/// The same seed replays the same run
#[test]
fn test_seeded_replications_are_reproducible() {
    let config = SimulationConfig { seed: Some(77), replications: 2, ..two_week_config() };
    let runner = ReplicationRunner::new(config, CategoryCatalog::default());
    let first = runner.run_all().unwrap();
    let second = runner.run_all().unwrap();
    for (a, b) in first.reports.iter().zip(&second.reports) {
        assert_eq!(a.metrics(), b.metrics());
        assert_eq!(a.events_processed, b.events_processed);
    }
}

/// An unseeded run still completes and conserves
#[test]
fn test_unseeded_run() {
    let config = two_week_config();
    let mut orchestrator = Orchestrator::new(&config, CategoryCatalog::default(), None).unwrap();
    orchestrator.run().unwrap();
    assert_conserved(&orchestrator);
}
