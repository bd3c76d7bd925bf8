//! Simulation engine
//!
//! This module holds the event calendar, the per-run context, the day-boundary
//! schedule, the orchestrator that moves documents and packets between
//! stations, and the runner that repeats a configuration over several seeds.
//!
//! # Overview
//!
//! - **Orchestrator**: owns the stations and queues of one run and handles
//!   every event in time order
//! - **WorkCalendar**: turns the day plan into gate openings, gate closings,
//!   arrivals, batching and week boundaries
//! - **EventCalendar**: future-event list with stable ordering and rescheduling
//! - **RunStatistics**: counters, time-weighted averages and tallies of one run
//! - **ReplicationRunner**: independent replications and their summary
//! - **SimulationError**: error type shared by the engine
//!
//! # Usage Example
//!
//! ```rust
//! use docflow_sim::catalog::CategoryCatalog;
//! use docflow_sim::simulation::*;
//! use docflow_sim::types::*;
//!
//! let config = SimulationConfig {
//!     production_period_days: 5,
//!     arrival_mean: 50.0,
//!     arrival_std_dev: 5.0,
//!     seed: Some(7),
//!     ..Default::default()
//! };
//!
//! let mut orchestrator = Orchestrator::new(&config, CategoryCatalog::default(), config.seed)?;
//! orchestrator.run()?;
//!
//! let stats = orchestrator.statistics();
//! let census = orchestrator.census();
//! assert_eq!(
//!     stats.documents_created.value(),
//!     stats.documents_disposed.value() + census.documents,
//! );
//! # Ok::<(), SimulationError>(())
//! ```

pub mod calendar;
pub mod context;
pub mod error;
mod gates;
pub mod lifecycle;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod schedule;
pub mod statistics;

pub use calendar::*;
pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use logging::*;
pub use orchestrator::*;
pub use report::*;
pub use runner::*;
pub use schedule::*;
pub use statistics::*;
