//! The job sum type and the state shared by both job kinds

use super::{Document, Packet};
use crate::types::JobKind;
use serde::Serialize;

/// Anything that can wait in a [`JobQueue`](crate::station::JobQueue)
pub trait Queued {
    /// Current priority (higher is served first under priority discipline)
    fn priority(&self) -> i32;
}

/// Day-boundary escalation counters
///
/// Every end-of-day sweep that finds a job still waiting raises its priority
/// and counts the day. Past the stage threshold the job turns late, which
/// raises the priority once more. Completing the stage resets both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Escalation {
    /// Consecutive end-of-day sweeps the job was caught waiting
    pub days_not_finished: u32,
    /// Past the stage's lateness threshold
    pub late: bool,
    /// Dynamic priority
    pub priority: i32,
}

impl Escalation {
    /// Fresh state with the given starting priority
    pub fn new(priority: i32) -> Self {
        Self { days_not_finished: 0, late: false, priority }
    }

    /// Apply one end-of-day sweep with the stage's lateness threshold
    ///
    /// Returns `true` only on the transition into `late`.
    pub fn end_of_day(&mut self, late_threshold: u32) -> bool {
        self.days_not_finished += 1;
        self.priority += 1;
        if self.days_not_finished > late_threshold {
            let newly_late = !self.late;
            self.late = true;
            self.priority += 1;
            newly_late
        } else {
            false
        }
    }

    /// Reset after the job completed a stage
    pub fn complete_stage(&mut self) {
        self.days_not_finished = 0;
        if self.late {
            self.late = false;
            self.priority -= 1;
        }
    }
}

/// A job of either kind
///
/// Stations hold `Job`s; receivers match on the variant they expect.
#[derive(Debug, PartialEq, Serialize)]
pub enum Job {
    /// A unit document
    Document(Document),
    /// A placement packet
    Packet(Packet),
}

impl Job {
    /// Kind of the wrapped job
    pub fn kind(&self) -> JobKind {
        match self {
            Job::Document(_) => JobKind::Document,
            Job::Packet(_) => JobKind::Packet,
        }
    }

    /// Documents represented by this job (a packet counts its contents)
    pub fn document_count(&self) -> usize {
        match self {
            Job::Document(_) => 1,
            Job::Packet(packet) => packet.len(),
        }
    }

    /// Escalation state of the wrapped job
    pub fn escalation_mut(&mut self) -> &mut Escalation {
        match self {
            Job::Document(doc) => &mut doc.escalation,
            Job::Packet(packet) => &mut packet.escalation,
        }
    }

    /// Short label for logs
    pub fn label(&self) -> String {
        match self {
            Job::Document(doc) => doc.id.to_string(),
            Job::Packet(packet) => packet.id.to_string(),
        }
    }
}

impl Queued for Job {
    fn priority(&self) -> i32 {
        match self {
            Job::Document(doc) => doc.escalation.priority,
            Job::Packet(packet) => packet.escalation.priority,
        }
    }
}

impl From<Document> for Job {
    fn from(doc: Document) -> Self {
        Job::Document(doc)
    }
}

impl From<Packet> for Job {
    fn from(packet: Packet) -> Self {
        Job::Packet(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryId, DocumentId, PacketId};

    #[test]
    fn test_lateness_counted_once() {
        let mut escalation = Escalation::new(1);
        assert!(!escalation.end_of_day(2));
        assert!(!escalation.end_of_day(2));
        assert_eq!(escalation.priority, 3);
        assert!(escalation.end_of_day(2));
        assert!(escalation.late);
        assert_eq!(escalation.priority, 5);
        // Already late: escalates priority but is not a new transition
        assert!(!escalation.end_of_day(2));
        assert_eq!(escalation.priority, 7);
    }

    #[test]
    fn test_complete_stage_resets() {
        let mut escalation = Escalation::new(1);
        escalation.end_of_day(0);
        assert!(escalation.late);
        assert_eq!(escalation.priority, 3);
        escalation.complete_stage();
        assert!(!escalation.late);
        assert_eq!(escalation.days_not_finished, 0);
        assert_eq!(escalation.priority, 2);
    }

    #[test]
    fn test_job_kind_and_counts() {
        let doc = Job::from(Document::new(DocumentId(0), 0.0));
        assert_eq!(doc.kind(), JobKind::Document);
        assert_eq!(doc.document_count(), 1);

        let docs = vec![Document::new(DocumentId(1), 0.0), Document::new(DocumentId(2), 0.0)];
        let packet = Job::from(Packet::new(PacketId(0), 0.0, CategoryId(1), docs, 8, 8));
        assert_eq!(packet.kind(), JobKind::Packet);
        assert_eq!(packet.document_count(), 2);
        assert_eq!(packet.label(), "PKT_00000000");
    }
}
