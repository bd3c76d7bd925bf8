//! Queueing stations
//!
//! # Overview
//!
//! - **JobQueue**: FIFO or priority waiting line, also used for holding and rework queues
//! - **ServicePolicy**: the stage-specific service-time rule a station is built with
//! - **Station**: queue + server pool + policy + fixed receiver of completed jobs
//!
//! A station never decides where a completed job goes; it reports its
//! [`Receiver`] and the orchestrator applies the business rules.

pub mod queue;
pub mod service;
#[allow(clippy::module_inception)]
pub mod station;

pub use queue::*;
pub use service::*;
pub use station::*;
