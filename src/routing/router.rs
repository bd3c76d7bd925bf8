//! Workload division rules
//!
//! A [`WorkloadRouter`] maps a job to one of several parallel stations. Manual
//! arrivals are routed by their position in the arrival batch; coding and
//! placement are routed by category through a [`CategoryRouting`] table fixed
//! when the replication starts.

use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{CategoryId, DivisionRule, SimulationConfig};
use rand::Rng;
use std::collections::BTreeMap;

/// Trained/trainee split of the team doing classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSplit {
    /// Trained members (occupying the lowest station indices)
    pub trained: usize,
    /// Members still in training
    pub trainees: usize,
    /// Share of a station's fair workload a trainee takes
    pub share: f64,
    /// Whether there is a dedicated classification team
    pub dedicated: bool,
}

impl TrainingSplit {
    /// Split of whichever team classifies under `config`
    ///
    /// Combined stations are staffed by coders, so the coding team is split
    /// there even when a classification team exists.
    pub fn for_config(config: &SimulationConfig) -> Self {
        let staffing = &config.staffing;
        let share = config.training_workload_share;
        if staffing.has_dedicated_classification() && !config.routing.combined_stages {
            Self {
                trained: staffing.classification_employees as usize,
                trainees: staffing.classification_trainees as usize,
                share,
                dedicated: true,
            }
        } else {
            Self {
                trained: staffing.coding_employees as usize,
                trainees: staffing.coding_trainees as usize,
                share,
                dedicated: false,
            }
        }
    }

    fn pool(&self) -> usize {
        self.trained + self.trainees
    }

    /// Workload (in arrivals) reserved for trainees in a batch of `batch`
    fn trainee_workload(&self, batch: usize) -> f64 {
        let pool = self.pool();
        if pool == 0 {
            return 0.0;
        }
        // Integer division first, as the operations team computes it
        ((batch / pool) as f64) * self.share * ((pool - self.trained) as f64)
    }

    fn any_member<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.trained > 1 {
            rng.gen_range(0..self.pool())
        } else {
            0
        }
    }

    fn trainee<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.trainees > 1 {
            rng.gen_range(self.trained..self.pool())
        } else {
            self.trained
        }
    }

    /// Station for 0-based position `seq` in a batch of `batch` arrivals
    ///
    /// With a dedicated team, early arrivals go anywhere and the tail of the
    /// batch goes to trainees. Without one the comparison is the other way
    /// round: the tail goes anywhere and the head goes to trainees.
    pub fn pick<R: Rng + ?Sized>(&self, seq: usize, batch: usize, rng: &mut R) -> usize {
        let arrival = (seq + 1) as f64;
        let threshold = batch as f64 - self.trainee_workload(batch);
        let to_anyone = if self.dedicated { arrival < threshold } else { arrival > threshold };
        if to_anyone {
            self.any_member(rng)
        } else {
            self.trainee(rng)
        }
    }
}

/// Maps jobs to one of `stations` parallel stations under a division rule
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadRouter {
    rule: DivisionRule,
    stations: usize,
    split: Option<TrainingSplit>,
}

impl WorkloadRouter {
    /// Router for round robin or uniform random division
    pub fn new(rule: DivisionRule, stations: usize) -> Self {
        Self { rule, stations, split: None }
    }

    /// Router that can also apply the training-aware split
    pub fn with_split(rule: DivisionRule, stations: usize, split: TrainingSplit) -> Self {
        Self { rule, stations, split: Some(split) }
    }

    /// Division rule
    pub fn rule(&self) -> DivisionRule {
        self.rule
    }

    /// Number of parallel stations
    pub fn stations(&self) -> usize {
        self.stations
    }

    /// Station index for 0-based position `seq` in a batch of `batch`
    pub fn route<R: Rng + ?Sized>(
        &self,
        seq: usize,
        batch: usize,
        rng: &mut R,
    ) -> SimulationResult<usize> {
        if self.stations == 0 {
            return Err(SimulationError::routing_error("no stations to route to"));
        }
        if self.stations == 1 {
            return Ok(0);
        }
        let index = match self.rule {
            DivisionRule::RoundRobin => seq % self.stations,
            DivisionRule::UniformRandom => rng.gen_range(0..self.stations),
            DivisionRule::TrainingAware => match &self.split {
                Some(split) => split.pick(seq, batch, rng),
                None => {
                    return Err(SimulationError::routing_error(
                        "training-aware division without a training split",
                    ))
                }
            },
        };
        if index >= self.stations {
            return Err(SimulationError::routing_error(format!(
                "station index {} out of range for {} stations",
                index, self.stations
            )));
        }
        Ok(index)
    }
}

/// Fixed category to station table for coding and placement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryRouting {
    table: BTreeMap<CategoryId, usize>,
}

impl CategoryRouting {
    /// Assign every category, in the given order, to a station
    ///
    /// Round robin uses the category's ordinal; uniform random draws once per
    /// category.
    pub fn assign<R: Rng + ?Sized>(
        router: &WorkloadRouter,
        categories: impl IntoIterator<Item = CategoryId>,
        rng: &mut R,
    ) -> SimulationResult<Self> {
        if router.rule() == DivisionRule::TrainingAware {
            return Err(SimulationError::routing_error(
                "training-aware division only applies to classification",
            ));
        }
        let mut table = BTreeMap::new();
        for (ordinal, category) in categories.into_iter().enumerate() {
            table.insert(category, router.route(ordinal, 0, rng)?);
        }
        Ok(Self { table })
    }

    /// Station of `category`
    pub fn station_for(&self, category: CategoryId) -> SimulationResult<usize> {
        self.table.get(&category).copied().ok_or(SimulationError::MissingCategoryError(category))
    }

    /// Number of routed categories
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no category is routed
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn route_batch(router: &WorkloadRouter, batch: usize) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(11);
        (0..batch).map(|seq| router.route(seq, batch, &mut rng).unwrap()).collect()
    }

    #[test]
    fn test_round_robin_cycles() {
        let router = WorkloadRouter::new(DivisionRule::RoundRobin, 3);
        assert_eq!(route_batch(&router, 7), vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_uniform_random_stays_in_range() {
        let router = WorkloadRouter::new(DivisionRule::UniformRandom, 4);
        let routes = route_batch(&router, 200);
        assert!(routes.iter().all(|&i| i < 4));
        assert!((0..4).all(|i| routes.contains(&i)));
    }

    #[test]
    fn test_single_station_always_zero() {
        for rule in [DivisionRule::RoundRobin, DivisionRule::UniformRandom] {
            let router = WorkloadRouter::new(rule, 1);
            assert!(route_batch(&router, 5).iter().all(|&i| i == 0));
        }
    }

    #[test]
    fn test_no_stations_is_an_error() {
        let router = WorkloadRouter::new(DivisionRule::RoundRobin, 0);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(router.route(0, 1, &mut rng), Err(SimulationError::RoutingError(_))));
    }

    #[test]
    fn test_training_split_with_dedicated_team() {
        let split = TrainingSplit { trained: 1, trainees: 1, share: 0.4, dedicated: true };
        let router = WorkloadRouter::with_split(DivisionRule::TrainingAware, 2, split);
        // 10 / 2 * 0.4 * 1 = 2 arrivals reserved: arrivals 8..=10 reach the trainee
        assert_eq!(route_batch(&router, 10), vec![0, 0, 0, 0, 0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_training_split_without_dedicated_team_is_inverted() {
        let split = TrainingSplit { trained: 1, trainees: 1, share: 0.4, dedicated: false };
        let router = WorkloadRouter::with_split(DivisionRule::TrainingAware, 2, split);
        // Same threshold, opposite comparison: only arrivals 9 and 10 reach trained staff
        assert_eq!(route_batch(&router, 10), vec![1, 1, 1, 1, 1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_training_split_random_picks_stay_on_their_side() {
        let split = TrainingSplit { trained: 3, trainees: 2, share: 0.4, dedicated: true };
        let router = WorkloadRouter::with_split(DivisionRule::TrainingAware, 5, split);
        let routes = route_batch(&router, 50);
        // 50 / 5 * 0.4 * 2 = 8: arrivals 42..=50 only go to trainees
        assert!(routes[41..].iter().all(|&i| (3..5).contains(&i)));
        assert!(routes.iter().all(|&i| i < 5));
    }

    #[test]
    fn test_split_follows_the_classifying_team() {
        let mut config = SimulationConfig::default();
        config.staffing.classification_employees = 2;
        config.staffing.classification_trainees = 1;
        config.staffing.coding_trainees = 3;
        let split = TrainingSplit::for_config(&config);
        assert!(split.dedicated);
        assert_eq!((split.trained, split.trainees), (2, 1));

        config.routing.combined_stages = true;
        let split = TrainingSplit::for_config(&config);
        assert!(!split.dedicated);
        assert_eq!((split.trained, split.trainees), (5, 3));
        assert_eq!(split.share, 0.4);
    }

    #[test]
    fn test_category_routing_by_ordinal() {
        let router = WorkloadRouter::new(DivisionRule::RoundRobin, 2);
        let mut rng = StdRng::seed_from_u64(0);
        let categories = [CategoryId(3), CategoryId(5), CategoryId(9)];
        let routing = CategoryRouting::assign(&router, categories, &mut rng).unwrap();
        assert_eq!(routing.station_for(CategoryId(3)).unwrap(), 0);
        assert_eq!(routing.station_for(CategoryId(5)).unwrap(), 1);
        assert_eq!(routing.station_for(CategoryId(9)).unwrap(), 0);
        assert!(matches!(
            routing.station_for(CategoryId(4)),
            Err(SimulationError::MissingCategoryError(CategoryId(4)))
        ));
    }
}
