//! Service-time tables
//!
//! Maps each operation an employee or automated server can perform to the
//! distribution of one unit of that operation, separately for trained staff and
//! staff in training.

use super::Distribution;
use crate::types::{ServiceTimeConfig, SupportTask};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of work whose duration is drawn from the service-time table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Classifying one document
    Classification,
    /// Coding one attribute
    Coding,
    /// Placing one level of one document
    Placement,
    /// One workload unit of a support sub-stage
    Support(SupportTask),
    /// Automated classification of one document
    AutomatedClassification,
    /// Client review of one NIL report
    ClientReview,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Classification => write!(f, "Classification"),
            Operation::Coding => write!(f, "Coding"),
            Operation::Placement => write!(f, "Placement"),
            Operation::Support(task) => write!(f, "{}", task),
            Operation::AutomatedClassification => write!(f, "Automated Classification"),
            Operation::ClientReview => write!(f, "Client Review"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    trained: Distribution,
    training: Distribution,
}

impl Entry {
    fn new(trained: Distribution, slowdown: f64) -> Self {
        Self { trained, training: trained.slowed_by(slowdown) }
    }

    fn automated(dist: Distribution) -> Self {
        Self { trained: dist, training: dist }
    }
}

/// Per-operation service-time distributions
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceTimeTable {
    classification: Entry,
    coding: Entry,
    placement: Entry,
    validation: Entry,
    nil_report: Entry,
    feedback: Entry,
    submission: Entry,
    placement_change_request: Entry,
    automated_classification: Entry,
    client_review: Entry,
}

impl ServiceTimeTable {
    /// Build the table, deriving training distributions with `training_slowdown`
    pub fn new(config: &ServiceTimeConfig, training_slowdown: f64) -> Self {
        Self {
            classification: Entry::new(config.classification, training_slowdown),
            coding: Entry::new(config.coding, training_slowdown),
            placement: Entry::new(config.placement, training_slowdown),
            validation: Entry::new(config.validation, training_slowdown),
            nil_report: Entry::new(config.nil_report, training_slowdown),
            feedback: Entry::new(config.feedback, training_slowdown),
            submission: Entry::new(config.submission, training_slowdown),
            placement_change_request: Entry::new(
                config.placement_change_request,
                training_slowdown,
            ),
            automated_classification: Entry::automated(config.automated_classification),
            client_review: Entry::automated(config.client_review),
        }
    }

    fn entry(&self, operation: Operation) -> &Entry {
        match operation {
            Operation::Classification => &self.classification,
            Operation::Coding => &self.coding,
            Operation::Placement => &self.placement,
            Operation::Support(SupportTask::Validation) => &self.validation,
            Operation::Support(SupportTask::NilReport) => &self.nil_report,
            Operation::Support(SupportTask::Feedback) => &self.feedback,
            Operation::Support(SupportTask::Submission) => &self.submission,
            Operation::Support(SupportTask::PlacementChangeRequest) => {
                &self.placement_change_request
            }
            Operation::AutomatedClassification => &self.automated_classification,
            Operation::ClientReview => &self.client_review,
        }
    }

    /// Distribution of one unit of `operation`
    pub fn distribution(&self, operation: Operation, training: bool) -> &Distribution {
        let entry = self.entry(operation);
        if training {
            &entry.training
        } else {
            &entry.trained
        }
    }

    /// Draw the duration of one unit of `operation`
    pub fn sample<R: Rng + ?Sized>(&self, operation: Operation, training: bool, rng: &mut R) -> f64 {
        self.distribution(operation, training).sample(rng)
    }
}

impl Default for ServiceTimeTable {
    fn default() -> Self {
        Self::new(&ServiceTimeConfig::default(), crate::types::defaults::TRAINING_SLOWDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trainees_are_slower() {
        let table = ServiceTimeTable::default();
        let trained = table.distribution(Operation::Coding, false).mean();
        let training = table.distribution(Operation::Coding, true).mean();
        assert!((training - trained * 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_automated_operations_ignore_training() {
        let table = ServiceTimeTable::default();
        assert_eq!(
            table.distribution(Operation::ClientReview, true),
            table.distribution(Operation::ClientReview, false)
        );
        assert_eq!(table.distribution(Operation::ClientReview, false).mean(), 23_040.0);
    }

    #[test]
    fn test_support_tasks_have_their_own_entries() {
        let table = ServiceTimeTable::default();
        let validation = table.distribution(Operation::Support(SupportTask::Validation), false);
        let nil = table.distribution(Operation::Support(SupportTask::NilReport), false);
        assert_eq!(validation.mean(), 5.23);
        assert_eq!(nil.mean(), 12.55);
        let change = table
            .distribution(Operation::Support(SupportTask::PlacementChangeRequest), false);
        assert_eq!(change, table.distribution(Operation::Placement, false));
    }
}
