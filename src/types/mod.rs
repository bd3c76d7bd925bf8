//! Core types and identifiers for the document processing simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: sequential job and station identifiers plus UUID-based run IDs
//! - **Enums**: lifecycle states, rework credits, division rules and support sub-stages
//! - **Configuration**: simulation configuration with validation, CLI and JSON file support
//!
//! # Usage Example
//!
//! ```rust
//! use docflow_sim::types::*;
//!
//! let mut ids = IdAllocator::new();
//! let first = ids.next_document();
//! assert_eq!(first.to_string(), "DOC_00000000");
//!
//! let config = SimulationConfig {
//!     production_period_days: 20,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! assert_eq!(CompletionState::PendingCoding.code(), 1);
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
