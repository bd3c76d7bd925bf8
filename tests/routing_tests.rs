//! Tests for workload division across parallel stations
//!
//! Covers the round robin cycle, the per-batch assignment plan, and the
//! training-aware split whose comparison flips when coders do the classifying.

use docflow_sim::routing::{AssignmentPlan, CategoryRouting, TrainingSplit, WorkloadRouter};
use docflow_sim::simulation::SimulationError;
use docflow_sim::types::{CategoryId, DivisionRule, SimulationConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn rng() -> StdRng {
    StdRng::seed_from_u64(2024)
}

/// Seven arrivals over three stations
#[test]
fn test_round_robin_over_three_stations() {
    let router = WorkloadRouter::new(DivisionRule::RoundRobin, 3);
    let mut plan = AssignmentPlan::new();
    plan.extend_batch(&router, 7, &mut rng()).unwrap();
    let order: Vec<usize> = (0..7).map(|_| plan.next_station().unwrap()).collect();
    assert_eq!(order, vec![0, 1, 2, 0, 1, 2, 0]);
    assert!(plan.is_empty());
}

/// Draining more arrivals than were planned is an error, not a silent default
#[test]
fn test_exhausted_plan_is_a_routing_error() {
    let router = WorkloadRouter::new(DivisionRule::UniformRandom, 4);
    let mut plan = AssignmentPlan::new();
    plan.extend_batch(&router, 1, &mut rng()).unwrap();
    assert!(plan.next_station().unwrap() < 4);
    assert!(matches!(plan.next_station(), Err(SimulationError::RoutingError(_))));
}

fn classification_config(dedicated: bool) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.staffing.coding_employees = 1;
    config.staffing.coding_trainees = 1;
    if dedicated {
        config.staffing.classification_employees = 1;
        config.staffing.classification_trainees = 1;
    } else {
        config.staffing.classification_employees = 0;
        config.staffing.classification_trainees = 0;
    }
    config.training_workload_share = 0.4;
    config
}

fn route_training_aware(config: &SimulationConfig, batch: usize) -> Vec<usize> {
    let split = TrainingSplit::for_config(config);
    let router = WorkloadRouter::with_split(DivisionRule::TrainingAware, 2, split);
    let mut rng = rng();
    (0..batch).map(|seq| router.route(seq, batch, &mut rng).unwrap()).collect()
}

/// A dedicated team gives trainees the tail of the batch
#[test]
fn test_training_aware_with_classification_team() {
    let config = classification_config(true);
    // 10 / 2 * 0.4 * 1 = 2: arrivals 1..=7 anywhere (one trained member, so
    // station 0), arrivals 8..=10 to the trainee
    assert_eq!(route_training_aware(&config, 10), vec![0, 0, 0, 0, 0, 0, 0, 1, 1, 1]);
}

/// Without a dedicated team the comparison is inverted and trainees get the head
#[test]
fn test_training_aware_without_classification_team_is_inverted() {
    let config = classification_config(false);
    assert_eq!(route_training_aware(&config, 10), vec![1, 1, 1, 1, 1, 1, 1, 1, 0, 0]);
}

/// Coding and placement route by category, fixed once per replication
#[test]
fn test_category_routing_is_fixed_per_category() {
    let router = WorkloadRouter::new(DivisionRule::UniformRandom, 3);
    let categories: Vec<CategoryId> = (1..=6).map(CategoryId).collect();
    let routing = CategoryRouting::assign(&router, categories.clone(), &mut rng()).unwrap();
    assert_eq!(routing.len(), 6);
    for category in categories {
        let station = routing.station_for(category).unwrap();
        assert!(station < 3);
        assert_eq!(routing.station_for(category).unwrap(), station);
    }
    assert!(routing.station_for(CategoryId(99)).is_err());
}

/// The training-aware rule is refused outside classification
#[test]
fn test_training_aware_category_routing_is_refused() {
    let split = TrainingSplit { trained: 1, trainees: 1, share: 0.4, dedicated: true };
    let router = WorkloadRouter::with_split(DivisionRule::TrainingAware, 2, split);
    let result = CategoryRouting::assign(&router, [CategoryId(1)], &mut rng());
    assert!(matches!(result, Err(SimulationError::RoutingError(_))));
}
