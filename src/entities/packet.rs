//! Placement packets
//!
//! A packet bundles the coded documents of one category. Placement is
//! multi-round: a packet visits a placement station once per unit of its
//! workload factor before it may move on to validation.

use super::{Document, Escalation, Queued};
use crate::types::{defaults, CategoryId, PacketId, ReworkStatus};
use serde::Serialize;

/// A batch of documents placed together
#[derive(Debug, PartialEq, Serialize)]
pub struct Packet {
    /// Identifier
    pub id: PacketId,
    /// Simulated creation time
    pub created_at: f64,
    /// Category shared by every document in the packet
    pub category: CategoryId,
    /// Documents bound to the packet, in batching order
    pub documents: Vec<Document>,
    /// Placement rounds needed, independent of the number of documents
    pub workload_factor: u32,
    /// Placement rounds completed so far
    pub rounds_completed: u32,
    /// Shelf levels placed per document per round
    pub levels_to_place: u32,
    /// Outstanding deferred rework credit
    pub rework_status: ReworkStatus,
    /// Synthetic packet created by a change order
    pub rework_event: bool,
    /// The change order this packet represents has been worked
    pub rework_done: bool,
    /// The client returned feedback on the NIL report
    pub client_feedback: bool,
    /// Day-boundary escalation state
    pub escalation: Escalation,
}

impl Packet {
    /// New packet over `documents`
    pub fn new(
        id: PacketId,
        created_at: f64,
        category: CategoryId,
        documents: Vec<Document>,
        workload_factor: u32,
        levels_to_place: u32,
    ) -> Self {
        Self {
            id,
            created_at,
            category,
            documents,
            workload_factor,
            rounds_completed: 0,
            levels_to_place,
            rework_status: ReworkStatus::Clear,
            rework_event: false,
            rework_done: false,
            client_feedback: false,
            escalation: Escalation::new(defaults::BASE_PRIORITY),
        }
    }

    /// Mark as a synthetic change-order packet with elevated priority
    pub fn into_change_order(mut self) -> Self {
        self.rework_event = true;
        self.escalation.priority = defaults::ELEVATED_PRIORITY;
        self
    }

    /// Count one placement visit and report whether placement is finished
    ///
    /// Never counts beyond the workload factor, so a packet sent back from
    /// validation finishes on its next visit.
    pub fn advance_round(&mut self) -> bool {
        if self.rounds_completed < self.workload_factor {
            self.rounds_completed += 1;
        }
        self.is_placed()
    }

    /// Whether every placement round has been completed
    pub fn is_placed(&self) -> bool {
        self.rounds_completed == self.workload_factor
    }

    /// Remove and return the documents carrying a classification or coding credit
    ///
    /// Relative order is preserved on both sides.
    pub fn release_reworked(&mut self) -> Vec<Document> {
        let (reworked, kept): (Vec<Document>, Vec<Document>) =
            self.documents.drain(..).partition(|doc| {
                matches!(doc.rework_status, ReworkStatus::Classification | ReworkStatus::Coding)
            });
        self.documents = kept;
        reworked
    }

    /// Number of documents bound to the packet
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the packet carries no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Queued for Packet {
    fn priority(&self) -> i32 {
        self.escalation.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentId;

    fn packet_with(statuses: &[ReworkStatus]) -> Packet {
        let documents = statuses
            .iter()
            .enumerate()
            .map(|(i, &status)| {
                let mut doc = Document::new(DocumentId(i as u64), 0.0);
                doc.rework_status = status;
                doc
            })
            .collect();
        Packet::new(PacketId(0), 0.0, CategoryId(1), documents, 8, 8)
    }

    #[test]
    fn test_eighth_round_finishes_placement() {
        let mut packet = packet_with(&[ReworkStatus::Clear]);
        for _ in 0..7 {
            assert!(!packet.advance_round());
        }
        assert!(packet.advance_round());
        assert_eq!(packet.rounds_completed, 8);
        // A further visit stays finished without overcounting
        assert!(packet.advance_round());
        assert_eq!(packet.rounds_completed, 8);
    }

    #[test]
    fn test_release_reworked_keeps_order() {
        let mut packet = packet_with(&[
            ReworkStatus::Clear,
            ReworkStatus::Coding,
            ReworkStatus::Clear,
            ReworkStatus::Classification,
        ]);
        let released = packet.release_reworked();
        let released_ids: Vec<u64> = released.iter().map(|d| d.id.0).collect();
        let kept_ids: Vec<u64> = packet.documents.iter().map(|d| d.id.0).collect();
        assert_eq!(released_ids, vec![1, 3]);
        assert_eq!(kept_ids, vec![0, 2]);
    }

    #[test]
    fn test_change_order_packet() {
        let packet = packet_with(&[ReworkStatus::Clear]).into_change_order();
        assert!(packet.rework_event);
        assert_eq!(packet.escalation.priority, 2);
    }
}
