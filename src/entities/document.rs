//! Unit documents
//!
//! A document is the smallest job: it is classified into a category, has one
//! coding pass per attribute of that category, and is then batched with other
//! documents of the same category into a placement packet.

use super::{Escalation, Queued};
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{defaults, CategoryId, CompletionState, DocumentId, ReworkStatus};
use serde::Serialize;

/// A unit document travelling through the network
///
/// Documents are not `Clone`: a document exists in exactly one
/// place at a time and disposal consumes it.
#[derive(Debug, PartialEq, Serialize)]
pub struct Document {
    /// Identifier
    pub id: DocumentId,
    /// Simulated creation time
    pub created_at: f64,
    /// Category, known once classified
    pub category: Option<CategoryId>,
    /// Attributes to code, known once classified
    pub attribute_count: u32,
    /// Lifecycle position
    pub completion: CompletionState,
    /// Outstanding deferred rework credit
    pub rework_status: ReworkStatus,
    /// Synthetic document created by a change order
    pub rework_event: bool,
    /// The change order this document represents has been worked
    pub rework_done: bool,
    /// Leaves the system after classification
    pub only_classification: bool,
    /// Day-boundary escalation state
    pub escalation: Escalation,
}

impl Document {
    /// New document from a regular arrival
    pub fn new(id: DocumentId, created_at: f64) -> Self {
        Self {
            id,
            created_at,
            category: None,
            attribute_count: 0,
            completion: CompletionState::PendingClassification,
            rework_status: ReworkStatus::Clear,
            rework_event: false,
            rework_done: false,
            only_classification: false,
            escalation: Escalation::new(defaults::BASE_PRIORITY),
        }
    }

    /// New synthetic document representing a standalone change order
    pub fn change_order(id: DocumentId, created_at: f64) -> Self {
        Self { rework_event: true, ..Self::new(id, created_at) }
    }

    /// Start with the given priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.escalation.priority = priority;
        self
    }

    /// Record the outcome of classification
    pub fn classify(&mut self, category: CategoryId, attribute_count: u32, only_classification: bool) {
        self.category = Some(category);
        self.attribute_count = attribute_count;
        self.only_classification = only_classification;
    }

    /// Category, or an error if the document was never classified
    pub fn require_category(&self) -> SimulationResult<CategoryId> {
        self.category.ok_or_else(|| {
            SimulationError::invalid_transition_error(format!(
                "{} reached a category-dependent stage unclassified",
                self.id
            ))
        })
    }

    /// Whether disposal of this document counts as a full completion
    pub fn counts_as_submitted(&self) -> bool {
        !self.only_classification && !self.rework_event
    }

    /// Current priority
    pub fn priority(&self) -> i32 {
        self.escalation.priority
    }
}

impl Queued for Document {
    fn priority(&self) -> i32 {
        self.escalation.priority
    }
}
