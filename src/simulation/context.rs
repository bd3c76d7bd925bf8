//! Per-replication run context
//!
//! Everything a replication mutates besides its stations and queues lives here:
//! the event calendar, the random stream, the workforce and the identifier
//! allocator. The context is created per replication and handed explicitly to
//! whatever needs it, so replications never share state.

use super::{EventCalendar, GateClose, GateOpen};
use crate::entities::Job;
use crate::resources::{ServiceTimeTable, Workforce};
use crate::types::{EmployeeId, IdAllocator, SimulationConfig, StationId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Everything that can happen in a replication
#[derive(Debug)]
pub enum SimEvent {
    /// A batch of new documents arrives
    DocumentArrivals,
    /// A standalone change order arrives
    ChangeOrder,
    /// A stage opens for the day
    GateOpen(GateOpen),
    /// A stage closes for the day
    GateClose(GateClose),
    /// Coded documents are batched into packets
    PacketBatching,
    /// A working week ends
    WeekBoundary(u32),
    /// A server finished a job
    ServiceComplete {
        /// Station the job was served at
        station: StationId,
        /// Server that served it
        member: EmployeeId,
        /// The job itself, owned by the event while in service
        job: Job,
    },
}

impl SimEvent {
    /// Short label for logs
    pub fn label(&self) -> String {
        match self {
            SimEvent::DocumentArrivals => "document arrivals".to_string(),
            SimEvent::ChangeOrder => "change order".to_string(),
            SimEvent::GateOpen(gate) => format!("open {}", gate),
            SimEvent::GateClose(gate) => format!("close {}", gate),
            SimEvent::PacketBatching => "packet batching".to_string(),
            SimEvent::WeekBoundary(week) => format!("end of week {}", week),
            SimEvent::ServiceComplete { station, job, .. } => {
                format!("{} done at {}", job.label(), station)
            }
        }
    }
}

/// Mutable state of one replication outside the station network
#[derive(Debug)]
pub struct RunContext {
    /// Future-event list and clock
    pub calendar: EventCalendar<SimEvent>,
    /// Random stream of this replication
    pub rng: StdRng,
    /// Every server of this replication
    pub workforce: Workforce,
    /// Service-time distributions
    pub service_times: ServiceTimeTable,
    /// Job identifier source
    pub ids: IdAllocator,
}

impl RunContext {
    /// Fresh context for `config`, seeded when `seed` is given
    pub fn new(config: &SimulationConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => {
                debug!("Using deterministic seed: {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => {
                debug!("Using entropy-based random seed");
                StdRng::from_entropy()
            }
        };
        Self {
            calendar: EventCalendar::new(),
            rng,
            workforce: Workforce::from_staffing(&config.staffing),
            service_times: ServiceTimeTable::new(&config.service_times, config.training_slowdown),
            ids: IdAllocator::new(),
        }
    }

    /// Current simulated time
    pub fn now(&self) -> f64 {
        self.calendar.now()
    }

    /// A uniform percentage draw in `[0, 1)`
    pub fn percentage(&mut self) -> f64 {
        self.rng.gen_range(0.0..100.0) / 100.0
    }

    /// First-time-right check against `probability`
    ///
    /// Fails when the drawn percentage exceeds the success probability.
    pub fn first_time_right(&mut self, probability: f64) -> bool {
        self.percentage() <= probability
    }
}
