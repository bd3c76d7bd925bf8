//! Error types and handling
//!
//! This module contains the error taxonomy of the simulation and the policy that
//! decides whether an error raised inside an event action aborts only that action
//! or the whole replication.

use crate::types::{CategoryId, JobKind};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(String),

    /// Event calendar misuse (negative delay, unknown handle)
    #[error("Event calendar error: {0}")]
    CalendarError(String),

    /// Counter or accumulator misuse (negative amount, underflow)
    #[error("Statistics error: {0}")]
    StatisticsError(String),

    /// A category has no entry in the category tables
    #[error("No category mapping for {0}")]
    MissingCategoryError(CategoryId),

    /// Assignment plan or routing table inconsistent with the jobs it routes
    #[error("Routing error: {0}")]
    RoutingError(String),

    /// Seize and release out of step
    #[error("Resource invariant violated: {0}")]
    ResourceInvariantError(String),

    /// A station received a job of the wrong kind
    #[error("Station {station} expects {expected} jobs, got {actual}")]
    JobKindMismatch {
        /// Station label
        station: String,
        /// Kind the station serves
        expected: JobKind,
        /// Kind it was handed
        actual: JobKind,
    },

    /// A job reached a receiver in a state it cannot leave from
    #[error("Invalid state transition: {0}")]
    InvalidTransitionError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// CSV read or write error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl SimulationError {
    /// Create a configuration error
    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create an event calendar error
    pub fn calendar_error(msg: impl Into<String>) -> Self {
        Self::CalendarError(msg.into())
    }

    /// Create a statistics error
    pub fn statistics_error(msg: impl Into<String>) -> Self {
        Self::StatisticsError(msg.into())
    }

    /// Create a routing error
    pub fn routing_error(msg: impl Into<String>) -> Self {
        Self::RoutingError(msg.into())
    }

    /// Create a resource invariant error
    pub fn resource_invariant_error(msg: impl Into<String>) -> Self {
        Self::ResourceInvariantError(msg.into())
    }

    /// Create an invalid transition error
    pub fn invalid_transition_error(msg: impl Into<String>) -> Self {
        Self::InvalidTransitionError(msg.into())
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors abort only the event action that raised them. Everything
    /// else would leave queues or resources inconsistent and aborts the replication.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimulationError::ConfigurationError(_) => false,
            SimulationError::CalendarError(_) => false,
            SimulationError::StatisticsError(_) => true,
            SimulationError::MissingCategoryError(_) => true,
            SimulationError::RoutingError(_) => false,
            SimulationError::ResourceInvariantError(_) => false,
            SimulationError::JobKindMismatch { .. } => false,
            SimulationError::InvalidTransitionError(_) => false,
            SimulationError::IoError(_) => true,
            SimulationError::SerializationError(_) => true,
            SimulationError::CsvError(_) => true,
        }
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::CalendarError(_) => "Calendar",
            SimulationError::StatisticsError(_) => "Statistics",
            SimulationError::MissingCategoryError(_) => "Missing Category",
            SimulationError::RoutingError(_) => "Routing",
            SimulationError::ResourceInvariantError(_) => "Resource Invariant",
            SimulationError::JobKindMismatch { .. } => "Job Kind",
            SimulationError::InvalidTransitionError(_) => "Invalid Transition",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
            SimulationError::CsvError(_) => "CSV",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

/// What to do after an event action failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Drop the current unit of work and continue with the next event
    Skip,
    /// Abort the replication
    Abort,
}

/// Error recovery context
#[derive(Debug, Clone)]
pub struct RecoveryContext {
    /// The recovery strategy to use for recoverable errors
    pub strategy: RecoveryStrategy,
    /// Whether to log the error
    pub log_error: bool,
    /// Additional context information
    pub context: String,
}

impl Default for RecoveryContext {
    fn default() -> Self {
        Self { strategy: RecoveryStrategy::Skip, log_error: true, context: String::new() }
    }
}

impl RecoveryContext {
    /// Create a new recovery context with skip strategy
    pub fn skip() -> Self {
        Self { strategy: RecoveryStrategy::Skip, ..Default::default() }
    }

    /// Add context information
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// Decides between skipping and aborting for errors raised inside event actions
#[derive(Debug)]
pub struct ErrorPolicy {
    /// Whether to continue on recoverable errors
    pub continue_on_recoverable: bool,
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self { continue_on_recoverable: true }
    }
}

impl ErrorPolicy {
    /// Create a new error policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy that aborts on every error
    pub fn strict() -> Self {
        Self { continue_on_recoverable: false }
    }

    /// Handle an error with the given recovery context
    pub fn handle_error(
        &self,
        error: &SimulationError,
        context: &RecoveryContext,
    ) -> RecoveryStrategy {
        if context.log_error {
            match error.category() {
                "Configuration" | "Calendar" | "Routing" | "Resource Invariant" | "Job Kind"
                | "Invalid Transition" => {
                    error!("Critical error in {}: {}", error.category(), error);
                }
                "Missing Category" | "Statistics" => {
                    warn!("Recoverable error in {}: {}", error.category(), error);
                }
                _ => {
                    info!("Error in {}: {}", error.category(), error);
                }
            }

            if !context.context.is_empty() {
                debug!("Error context: {}", context.context);
            }
        }

        if !error.is_recoverable() {
            warn!("Non-recoverable error encountered, aborting replication");
            return RecoveryStrategy::Abort;
        }

        if !self.continue_on_recoverable {
            return RecoveryStrategy::Abort;
        }

        context.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let config_error = SimulationError::configuration_error("Invalid config");
        assert!(matches!(config_error, SimulationError::ConfigurationError(_)));
        assert_eq!(config_error.to_string(), "Configuration validation failed: Invalid config");

        let routing_error = SimulationError::routing_error("plan exhausted");
        assert_eq!(routing_error.to_string(), "Routing error: plan exhausted");

        let missing = SimulationError::MissingCategoryError(CategoryId(42));
        assert_eq!(missing.to_string(), "No category mapping for CAT_42");
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let sim_error: SimulationError = io_error.into();
        assert!(matches!(sim_error, SimulationError::IoError(_)));
    }

    #[test]
    fn test_error_recoverability() {
        assert!(!SimulationError::configuration_error("x").is_recoverable());
        assert!(!SimulationError::routing_error("x").is_recoverable());
        assert!(!SimulationError::resource_invariant_error("x").is_recoverable());
        assert!(!SimulationError::calendar_error("x").is_recoverable());
        assert!(SimulationError::statistics_error("x").is_recoverable());
        assert!(SimulationError::MissingCategoryError(CategoryId(1)).is_recoverable());
        let mismatch = SimulationError::JobKindMismatch {
            station: "STN_000".to_string(),
            expected: JobKind::Packet,
            actual: JobKind::Document,
        };
        assert!(!mismatch.is_recoverable());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(SimulationError::calendar_error("x").category(), "Calendar");
        assert_eq!(SimulationError::statistics_error("x").category(), "Statistics");
        assert_eq!(SimulationError::invalid_transition_error("x").category(), "Invalid Transition");
        assert_eq!(
            SimulationError::MissingCategoryError(CategoryId(1)).category(),
            "Missing Category"
        );
    }

    #[test]
    fn test_policy_skips_recoverable_and_aborts_fatal() {
        let policy = ErrorPolicy::new();
        let context = RecoveryContext::skip().with_context("end of classification day");

        let skipped = policy.handle_error(&SimulationError::statistics_error("underflow"), &context);
        assert_eq!(skipped, RecoveryStrategy::Skip);

        let aborted = policy.handle_error(&SimulationError::routing_error("shortfall"), &context);
        assert_eq!(aborted, RecoveryStrategy::Abort);
    }

    #[test]
    fn test_strict_policy_aborts_everything() {
        let policy = ErrorPolicy::strict();
        let context = RecoveryContext::skip();
        let strategy = policy.handle_error(&SimulationError::statistics_error("underflow"), &context);
        assert_eq!(strategy, RecoveryStrategy::Abort);
    }
}
