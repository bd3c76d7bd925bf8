//! Service-time policies
//!
//! Each station is built with one policy. The policy fixes the job kind the
//! station accepts and turns a job plus the serving employee into a service
//! duration.

use crate::entities::{Document, Job, Packet};
use crate::resources::{Operation, ServiceTimeTable};
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{penalties, CompletionState, JobKind, SupportTask};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a station computes the duration of one service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServicePolicy {
    /// One classification draw
    Classification,
    /// One coding draw per attribute
    Coding,
    /// Classification and coding in one sitting, with the context-switch penalty
    Combined,
    /// One draw per document per level, discounted on repeat rounds
    Placement,
    /// One draw per workload unit of the packet
    Support(SupportTask),
    /// Automated classification of one document
    AutomatedClassification,
    /// Client review of one packet
    ClientReview,
}

impl ServicePolicy {
    /// Job kind stations with this policy serve
    pub fn accepts(&self) -> JobKind {
        match self {
            ServicePolicy::Classification
            | ServicePolicy::Coding
            | ServicePolicy::Combined
            | ServicePolicy::AutomatedClassification => JobKind::Document,
            ServicePolicy::Placement | ServicePolicy::Support(_) | ServicePolicy::ClientReview => {
                JobKind::Packet
            }
        }
    }

    /// Duration of serving `job` by an employee with the given training status
    pub fn duration<R: Rng + ?Sized>(
        &self,
        job: &Job,
        training: bool,
        table: &ServiceTimeTable,
        rng: &mut R,
    ) -> SimulationResult<f64> {
        let duration = match (self, job) {
            (ServicePolicy::Classification, Job::Document(_)) => {
                table.sample(Operation::Classification, training, rng)
            }
            (ServicePolicy::Coding, Job::Document(doc)) => coding_time(doc, training, table, rng),
            (ServicePolicy::Combined, Job::Document(doc)) => {
                if doc.completion == CompletionState::PendingClassification {
                    let mut total = table.sample(Operation::Classification, training, rng);
                    if !doc.only_classification {
                        total += coding_time(doc, training, table, rng);
                        total *= penalties::CONTEXT_SWITCH;
                    }
                    total
                } else {
                    coding_time(doc, training, table, rng)
                }
            }
            (ServicePolicy::Placement, Job::Packet(packet)) => {
                placement_time(packet, training, table, rng)
            }
            (ServicePolicy::Support(task), Job::Packet(packet)) => (0..packet.workload_factor)
                .map(|_| table.sample(Operation::Support(*task), training, rng).abs())
                .sum(),
            (ServicePolicy::AutomatedClassification, Job::Document(_)) => {
                table.sample(Operation::AutomatedClassification, false, rng)
            }
            (ServicePolicy::ClientReview, Job::Packet(_)) => {
                table.sample(Operation::ClientReview, false, rng)
            }
            (policy, job) => {
                return Err(SimulationError::JobKindMismatch {
                    station: policy.to_string(),
                    expected: policy.accepts(),
                    actual: job.kind(),
                })
            }
        };
        // Normal draws can go negative; the calendar only accepts forward delays
        Ok(duration.max(0.0))
    }
}

fn coding_time<R: Rng + ?Sized>(
    doc: &Document,
    training: bool,
    table: &ServiceTimeTable,
    rng: &mut R,
) -> f64 {
    (0..doc.attribute_count).map(|_| table.sample(Operation::Coding, training, rng)).sum()
}

fn placement_time<R: Rng + ?Sized>(
    packet: &Packet,
    training: bool,
    table: &ServiceTimeTable,
    rng: &mut R,
) -> f64 {
    let levels = packet.levels_to_place as f64;
    let total: f64 = packet
        .documents
        .iter()
        .map(|_| table.sample(Operation::Placement, training, rng).abs() * levels)
        .sum();
    if packet.rounds_completed > 0 {
        total * penalties::REPEAT_ROUND_DISCOUNT
    } else {
        total
    }
}

impl fmt::Display for ServicePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServicePolicy::Classification => write!(f, "Classification"),
            ServicePolicy::Coding => write!(f, "Coding"),
            ServicePolicy::Combined => write!(f, "Classification + Coding"),
            ServicePolicy::Placement => write!(f, "Placement"),
            ServicePolicy::Support(task) => write!(f, "{}", task),
            ServicePolicy::AutomatedClassification => write!(f, "Automated Classification"),
            ServicePolicy::ClientReview => write!(f, "Client Review"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Distribution;
    use crate::types::{CategoryId, DocumentId, PacketId, ServiceTimeConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn constant_table() -> ServiceTimeTable {
        let constant = |value| Distribution::Constant { value };
        let config = ServiceTimeConfig {
            classification: constant(10.0),
            coding: constant(3.0),
            placement: constant(2.0),
            validation: constant(1.0),
            nil_report: constant(4.0),
            feedback: constant(5.0),
            submission: constant(6.0),
            placement_change_request: constant(2.0),
            automated_classification: constant(1.0),
            client_review: constant(100.0),
        };
        ServiceTimeTable::new(&config, 2.5)
    }

    fn document(attributes: u32, only_classification: bool) -> Document {
        let mut doc = Document::new(DocumentId(0), 0.0);
        doc.classify(CategoryId(1), attributes, only_classification);
        doc.completion = CompletionState::PendingClassification;
        doc
    }

    fn packet(documents: usize, rounds_completed: u32) -> Packet {
        let docs = (0..documents).map(|i| Document::new(DocumentId(i as u64), 0.0)).collect();
        let mut packet = Packet::new(PacketId(0), 0.0, CategoryId(1), docs, 8, 8);
        packet.rounds_completed = rounds_completed;
        packet
    }

    fn duration(policy: ServicePolicy, job: &Job, training: bool) -> f64 {
        let mut rng = StdRng::seed_from_u64(0);
        policy.duration(job, training, &constant_table(), &mut rng).unwrap()
    }

    #[test]
    fn test_coding_sums_per_attribute() {
        let job = Job::from(document(4, false));
        assert_eq!(duration(ServicePolicy::Coding, &job, false), 12.0);
        assert_eq!(duration(ServicePolicy::Coding, &job, true), 30.0);
    }

    #[test]
    fn test_combined_applies_context_switch_penalty() {
        let job = Job::from(document(4, false));
        let expected = (10.0 + 12.0) * penalties::CONTEXT_SWITCH;
        assert!((duration(ServicePolicy::Combined, &job, false) - expected).abs() < 1e-9);

        // Classification-only documents are classified without penalty
        let only = Job::from(document(4, true));
        assert_eq!(duration(ServicePolicy::Combined, &only, false), 10.0);

        // Already classified: coding only
        let mut coded = document(4, false);
        coded.completion = CompletionState::PendingCoding;
        assert_eq!(duration(ServicePolicy::Combined, &Job::from(coded), false), 12.0);
    }

    #[test]
    fn test_placement_levels_and_repeat_discount() {
        let first = Job::from(packet(3, 0));
        assert_eq!(duration(ServicePolicy::Placement, &first, false), 3.0 * 2.0 * 8.0);
        let repeat = Job::from(packet(3, 1));
        let expected = 48.0 * penalties::REPEAT_ROUND_DISCOUNT;
        assert!((duration(ServicePolicy::Placement, &repeat, false) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_support_sums_per_workload_unit() {
        let job = Job::from(packet(1, 8));
        assert_eq!(duration(ServicePolicy::Support(SupportTask::NilReport), &job, false), 32.0);
    }

    #[test]
    fn test_kind_mismatch_is_an_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let job = Job::from(document(1, false));
        let result = ServicePolicy::Placement.duration(&job, false, &constant_table(), &mut rng);
        assert!(matches!(result, Err(SimulationError::JobKindMismatch { .. })));
        assert_eq!(ServicePolicy::Placement.accepts(), JobKind::Packet);
        assert_eq!(ServicePolicy::Combined.accepts(), JobKind::Document);
    }
}
