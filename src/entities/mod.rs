//! Job entities
//!
//! # Overview
//!
//! - **Document**: the unit job, classified, coded and placed
//! - **Packet**: a batch of coded documents of one category, placed in rounds
//! - **Job**: the closed sum over both kinds that stations and receivers carry
//! - **Escalation**: end-of-day lateness counters shared by both kinds
//!
//! Neither entity is `Clone`. Disposal takes the entity by value, so a job that
//! has left the system cannot be touched again.

pub mod document;
pub mod job;
pub mod packet;

pub use document::*;
pub use job::*;
pub use packet::*;
