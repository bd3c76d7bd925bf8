//! Memoized station assignments
//!
//! When a batch of manual arrivals lands in the intake queue, each arrival gets
//! its station immediately and the result is queued here. The next gate drain
//! consumes the plan in the same order it consumes the intake queue.

use super::WorkloadRouter;
use crate::simulation::{SimulationError, SimulationResult};
use rand::Rng;
use std::collections::VecDeque;

/// Ordered station assignments waiting to be consumed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentPlan {
    assignments: VecDeque<usize>,
}

impl AssignmentPlan {
    /// Empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a batch of `batch` arrivals and append the results
    pub fn extend_batch<R: Rng + ?Sized>(
        &mut self,
        router: &WorkloadRouter,
        batch: usize,
        rng: &mut R,
    ) -> SimulationResult<()> {
        let mut routed = Vec::with_capacity(batch);
        for seq in 0..batch {
            routed.push(router.route(seq, batch, rng)?);
        }
        self.assignments.extend(routed);
        Ok(())
    }

    /// Station of the next arrival in line
    ///
    /// Running out of assignments means the intake queue and the plan went out
    /// of step; that is never papered over.
    pub fn next_station(&mut self) -> SimulationResult<usize> {
        self.assignments.pop_front().ok_or_else(|| {
            SimulationError::routing_error("assignment plan exhausted before the intake queue")
        })
    }

    /// Assignments not yet consumed
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether every assignment was consumed
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
