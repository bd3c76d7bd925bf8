//! Workload routing
//!
//! # Overview
//!
//! - **WorkloadRouter**: division rules 1 (round robin), 2 (uniform random) and
//!   3 (training-aware split of the classification team)
//! - **CategoryRouting**: fixed category to station table for coding and placement
//! - **AssignmentPlan**: per-batch memoized assignments consumed by the next gate drain
//!
//! # Usage Example
//!
//! ```rust
//! use docflow_sim::routing::*;
//! use docflow_sim::types::DivisionRule;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let router = WorkloadRouter::new(DivisionRule::RoundRobin, 3);
//! let mut rng = StdRng::seed_from_u64(1);
//! let mut plan = AssignmentPlan::new();
//! plan.extend_batch(&router, 7, &mut rng).unwrap();
//! let stations: Vec<usize> = (0..7).map(|_| plan.next_station().unwrap()).collect();
//! assert_eq!(stations, vec![0, 1, 2, 0, 1, 2, 0]);
//! ```

pub mod plan;
pub mod router;

pub use plan::*;
pub use router::*;
