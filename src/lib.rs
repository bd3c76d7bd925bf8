//! Document Flow Simulator
//!
//! A discrete-event queueing model of a multi-stage document processing
//! operation: documents arrive in daily batches, are classified (by people or by
//! an automated classifier), coded, grouped into packets by category, placed in
//! several rounds, validated, reported to the client and finally submitted.
//!
//! # Overview
//!
//! Work only happens on the days a stage is scheduled. Stage gates open at the
//! start of those days and close at the end; anything still waiting when a gate
//! closes is swept into the stage's rework queue and counts one day towards its
//! lateness threshold. Quality failures send work back for rework exactly once
//! per failure, and every document and packet is accounted for from creation to
//! disposal.
//!
//! ## Key Features
//!
//! - **Parametric stations**: one station type, parameterised by its service
//!   policy and by what happens to a job when service completes
//! - **Staffing model**: trained and trainee employees per role, with a
//!   training slowdown and an optional training-aware workload split
//! - **Workload routing**: round robin, random and training-aware division
//!   rules, with optional single shared queues
//! - **Day-boundary gates**: stage working days and packet batching weeks from
//!   a configurable day plan
//! - **Replications**: independent seeded runs summarised per metric, exported
//!   as JSON or CSV
//!
//! ## Quick Start
//!
//! ```rust
//! use docflow_sim::*;
//!
//! let config = SimulationConfig {
//!     production_period_days: 5,
//!     arrival_mean: 60.0,
//!     arrival_std_dev: 6.0,
//!     replications: 2,
//!     seed: Some(11),
//!     ..Default::default()
//! };
//! config.validate()?;
//!
//! let runner = ReplicationRunner::new(config, CategoryCatalog::default());
//! let set = runner.run_all()?;
//! assert_eq!(set.reports.len(), 2);
//! println!("{}", set.summary.to_table());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: identifiers, enums and configuration
//! - [`entities`]: documents, packets and the job sum type
//! - [`resources`]: employees, resource pools and service-time distributions
//! - [`station`]: the parametric service station and its queue
//! - [`routing`]: division rules and per-batch assignment plans
//! - [`catalog`]: category attribute counts and cumulative probabilities
//! - [`simulation`]: event calendar, orchestrator, statistics and replications
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Types     │    │  Entities   │    │  Resources  │
//! │             │    │             │    │             │
//! │ Identifiers │◄───┤ Document    │    │ Workforce   │
//! │ Enums       │    │ Packet      │    │ Pools       │
//! │ Config      │    │ Job         │    │ Service     │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!        ▲                   ▲                   ▲
//!        │                   │                   │
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Catalog    │    │  Station    │    │ Simulation  │
//! │             │    │             │    │             │
//! │ Categories  │◄───┤ Queue       │◄───┤ Orchestrator│
//! │ Attributes  │    │ Policy      │    │ Gates       │
//! │             │    │ Receiver    │    │ Replications│
//! └─────────────┘    └─────────────┘    └─────────────┘
//!                                               ▲
//!                                               │
//!                                        ┌─────────────┐
//!                                        │  Routing    │
//!                                        └─────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod catalog;
pub mod entities;
pub mod resources;
pub mod routing;
pub mod simulation;
pub mod station;
pub mod types;

// Core types and identifiers
pub use types::{
    CategoryId, CompletionState, ConfigValidationError, DayPlan, DivisionRule, DocumentId,
    EmployeeId, OutputFormat, PacketId, ReworkStatus, RunId, SimulationConfig, StationId,
};

pub use catalog::CategoryCatalog;
pub use entities::{Document, Job, Packet};
pub use resources::{Distribution, ResourcePool, Workforce};
pub use routing::{AssignmentPlan, WorkloadRouter};
pub use station::{Receiver, ServicePolicy, Station};

// Simulation types and functionality
pub use simulation::{
    Census, Orchestrator, ReplicationRunner, ReplicationSet, ReplicationSummary, RunReport,
    RunStatistics, SimulationError, SimulationResult,
};
