//! The parametric queueing station
//!
//! One station type serves every stage. What differs between stages is data
//! fixed at construction: the service policy, the queue discipline, the pool
//! of servers and the receiver that completed jobs are handed to.

use super::{JobQueue, ServicePolicy};
use crate::entities::Job;
use crate::resources::ResourcePool;
use crate::simulation::{RunContext, SimEvent, SimulationError, SimulationResult, TimeWeighted};
use crate::types::{EmployeeId, QueueDiscipline, StationId};
use std::fmt;
use tracing::trace;

/// Where a station sends the jobs it completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Category assignment after the automated classifier
    AfterAutoClassification,
    /// Classification outcome (or combined classification and coding)
    AfterClassification,
    /// Coding outcome
    AfterCoding,
    /// One placement round done
    AfterPlacement,
    /// Validation outcome
    AfterValidation,
    /// NIL report written, hand to the client
    AfterNilReport,
    /// Client review done
    AfterClientReview,
    /// Pass the job on to another station unchanged
    Forward(StationId),
    /// Submission done, leave the system
    AfterSubmission,
    /// Leave the system
    Dispose,
}

/// A queue, a pool of servers and a service policy
#[derive(Debug)]
pub struct Station {
    id: StationId,
    name: String,
    policy: ServicePolicy,
    queue: JobQueue<Job>,
    pool: ResourcePool,
    receiver: Receiver,
    in_system: TimeWeighted,
}

impl Station {
    /// Build a station
    pub fn new(
        id: StationId,
        name: impl Into<String>,
        policy: ServicePolicy,
        discipline: QueueDiscipline,
        pool: ResourcePool,
        receiver: Receiver,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            policy,
            queue: JobQueue::new(discipline),
            pool,
            receiver,
            in_system: TimeWeighted::new(0.0, 0.0),
        }
    }

    /// Identifier
    pub fn id(&self) -> StationId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service policy
    pub fn policy(&self) -> ServicePolicy {
        self.policy
    }

    /// Receiver of completed jobs
    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    /// Servers this station may seize
    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// Jobs waiting (not in service)
    pub fn queue(&self) -> &JobQueue<Job> {
        &self.queue
    }

    /// Jobs waiting or in service here
    pub fn number_in_system(&self) -> &TimeWeighted {
        &self.in_system
    }

    /// Accept a job and start serving it if a server is idle
    pub fn receive(&mut self, job: Job, ctx: &mut RunContext) -> SimulationResult<()> {
        if job.kind() != self.policy.accepts() {
            return Err(SimulationError::JobKindMismatch {
                station: self.to_string(),
                expected: self.policy.accepts(),
                actual: job.kind(),
            });
        }
        self.in_system.increment(1.0, ctx.now())?;
        self.queue.enqueue(job);
        if self.pool.has_idle(&ctx.workforce) {
            self.serve_next(ctx)?;
        }
        Ok(())
    }

    /// Seize the first idle server and start the next job
    ///
    /// Returns `false` when there is nothing to do: the queue is empty or every
    /// server is busy. The job stays queued in the latter case.
    pub fn serve_next(&mut self, ctx: &mut RunContext) -> SimulationResult<bool> {
        let Some(member) = self.pool.first_idle(&ctx.workforce) else {
            return Ok(false);
        };
        let Some(job) = self.queue.remove_next() else {
            return Ok(false);
        };
        let training = ctx.workforce.get(member).map(|e| e.training).unwrap_or(false);
        let duration = self.policy.duration(&job, training, &ctx.service_times, &mut ctx.rng)?;

        ctx.workforce.seize(member)?;
        trace!(station = %self.id, %member, job = %job.label(), duration, "service started");
        if let Err(error) = ctx
            .calendar
            .schedule(duration, SimEvent::ServiceComplete { station: self.id, member, job })
        {
            ctx.workforce.release(member)?;
            return Err(error);
        }
        Ok(true)
    }

    /// Book the end of a service and return where the job goes next
    ///
    /// The server is released before anything else can fail.
    pub fn complete(&mut self, member: EmployeeId, ctx: &mut RunContext) -> SimulationResult<Receiver> {
        ctx.workforce.release(member)?;
        self.in_system.decrement(1.0, ctx.now())?;
        if !self.queue.is_empty() {
            self.serve_next(ctx)?;
        }
        Ok(self.receiver)
    }

    /// Take every waiting job out of the queue, in arrival order
    ///
    /// Jobs already in service are unaffected.
    pub fn evacuate(&mut self, now: f64) -> SimulationResult<Vec<Job>> {
        let jobs = self.queue.drain_all();
        self.in_system.decrement(jobs.len() as f64, now)?;
        Ok(jobs)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
