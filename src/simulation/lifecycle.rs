//! Job lifecycle
//!
//! Arrivals, change orders, the completion receivers of every stage and
//! disposal. Disposal consumes the job: once a document or packet is handed to
//! one of the `dispose_*` methods it no longer exists anywhere in the network.
//!
//! First-time-right failures never loop a job back on the spot. They leave a
//! [`ReworkStatus`] credit on the job, which is cleared on the next visit to the
//! stage that owns it. Document credits are collected by placement, which
//! releases the affected documents back to classification or coding rework.

use super::{Orchestrator, SimEvent, SimulationError, SimulationResult};
use crate::entities::{Document, Job, Packet};
use crate::resources::Distribution;
use crate::types::{
    defaults, CategoryId, ChangeOrderKind, CompletionState, ReworkStatus, SimulationConfig,
};
use tracing::{debug, instrument, trace, warn};

/// Change-order types 1 to 3, equally likely
const CHANGE_ORDER_KINDS: Distribution = Distribution::DiscreteUniform { min: 1, max: 3 };

/// How one arrival batch splits up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrivalMix {
    /// Documents arriving
    pub volume: u64,
    /// Documents eligible for classification
    pub eligible: u64,
    /// Eligible documents handled by the automated classifier
    pub automated: u64,
    /// Manual documents with elevated priority
    pub important: u64,
    /// Manual documents with base priority
    pub proactive: u64,
}

impl ArrivalMix {
    /// Split `volume` arrivals by the shares configured in `config`
    ///
    /// Both manual shares apply to the eligible documents the automated
    /// classifier leaves over; every share is floored.
    pub fn split(volume: u64, config: &SimulationConfig) -> Self {
        let eligible = (config.eligible_percentage * volume as f64).floor() as u64;
        let automated = (config.auto_classification_percentage * eligible as f64).floor() as u64;
        let remaining = eligible.saturating_sub(automated) as f64;
        Self {
            volume,
            eligible,
            automated,
            important: (config.important_percentage * remaining).floor() as u64,
            proactive: (config.proactive_percentage * remaining).floor() as u64,
        }
    }

    /// Documents classified by hand
    pub fn manual(&self) -> u64 {
        self.important + self.proactive
    }
}

/// Statistics updates only fail on misuse; log and carry on
fn logged(result: SimulationResult<()>) {
    if let Err(error) = result {
        warn!("Statistics update failed: {}", error);
    }
}

impl Orchestrator {
    /// Draw the size of an arrival batch, redrawing negative volumes
    fn draw_volume(&mut self) -> u64 {
        let distribution = Distribution::normal(
            self.config.arrival_mean,
            self.config.arrival_std_dev * self.config.arrival_std_dev,
        );
        loop {
            let volume = distribution.sample_int(&mut self.ctx.rng);
            if volume >= 0 {
                return volume as u64;
            }
        }
    }

    #[instrument(skip(self), fields(now = self.ctx.now()))]
    pub(super) fn document_arrivals(&mut self) -> SimulationResult<()> {
        let volume = self.draw_volume();
        let mix = ArrivalMix::split(volume, &self.config);
        let combined = self.config.routing.combined_stages;

        for _ in 0..mix.automated {
            let doc = self.create_document(false);
            self.send(self.layout.automated, doc)?;
        }

        let mut admitted = 0;
        let mut rejected = 0;
        for index in 0..mix.manual() {
            let priority = if index < mix.important {
                defaults::ELEVATED_PRIORITY
            } else {
                defaults::BASE_PRIORITY
            };
            let mut doc = self.create_document(false).with_priority(priority);
            if combined {
                if let Err(error) = self.draw_classification(&mut doc) {
                    warn!("Rejecting {} at arrival: {}", doc.id, error);
                    self.retire_rejected(doc);
                    rejected += 1;
                    continue;
                }
            }
            self.classification_intake.enqueue(doc);
            admitted += 1;
        }
        self.classification_plan.extend_batch(
            &self.classification_router,
            admitted,
            &mut self.ctx.rng,
        )?;
        self.schedule_change_order()?;

        crate::sim_event!(
            info,
            "Documents arrived",
            volume = mix.volume,
            eligible = mix.eligible,
            automated = mix.automated,
            manual = admitted,
            rejected = rejected,
        );
        Ok(())
    }

    /// Keep exactly one change order pending, moving it if one already is
    pub(super) fn schedule_change_order(&mut self) -> SimulationResult<()> {
        let gap = self.config.change_order_gap.sample(&mut self.ctx.rng).max(0.0);
        match self.change_order {
            Some(handle) if self.ctx.calendar.is_pending(handle) => {
                self.ctx.calendar.reschedule(handle, gap)
            }
            _ => {
                self.change_order = Some(self.ctx.calendar.schedule(gap, SimEvent::ChangeOrder)?);
                Ok(())
            }
        }
    }

    #[instrument(skip(self), fields(now = self.ctx.now()))]
    pub(super) fn change_order_arrives(&mut self) -> SimulationResult<()> {
        self.schedule_change_order()?;

        let draw = CHANGE_ORDER_KINDS.sample_int(&mut self.ctx.rng);
        let kind = ChangeOrderKind::try_from(draw).map_err(SimulationError::configuration_error)?;
        debug!("Change order of kind {:?}", kind);

        match kind {
            ChangeOrderKind::Classification => {
                let doc = self.create_document(true);
                self.stats.change_orders.classification.increment();
                self.classification_rework.enqueue(doc);
            }
            ChangeOrderKind::Coding => {
                let mut doc = self.create_document(true);
                self.stats.change_orders.coding.increment();
                if let Err(error) = self.draw_category(&mut doc) {
                    return self.reject(doc, error);
                }
                self.set_completion(&mut doc, CompletionState::PendingCoding);
                let index = match doc.require_category().and_then(|c| self.coding_index(c)) {
                    Ok(index) => index,
                    Err(error) => return self.reject(doc, error),
                };
                self.coding_rework[index].enqueue(doc);
            }
            ChangeOrderKind::Placement => {
                let mut doc = self.create_document(true);
                self.stats.change_orders.placement.increment();
                if let Err(error) = self.draw_category(&mut doc) {
                    return self.reject(doc, error);
                }
                self.set_completion(&mut doc, CompletionState::PendingPlacement);
                let category = doc.require_category()?;
                let packet = self.create_packet(category, vec![doc]).into_change_order();
                self.send(self.layout.change_request, packet)?;
            }
        }
        Ok(())
    }

    /// Category and attribute count, without the classification-only draw
    fn draw_category(&mut self, doc: &mut Document) -> SimulationResult<()> {
        let category = self.catalog.classify(self.ctx.percentage())?;
        let attributes = self.catalog.attribute_count(category)?;
        doc.classify(category, attributes, false);
        Ok(())
    }

    /// Full classification outcome: category, attribute count and whether the
    /// document leaves after classification
    fn draw_classification(&mut self, doc: &mut Document) -> SimulationResult<()> {
        let category = self.catalog.classify(self.ctx.percentage())?;
        let attributes = self.catalog.attribute_count(category)?;
        let only = self.ctx.percentage() < self.config.classification_only_percentage;
        doc.classify(category, attributes, only);
        Ok(())
    }

    /// Settle a stage's credit: clear it if it is this stage's, otherwise draw
    /// first-time-right on a clean job
    fn settle_credit(&mut self, status: &mut ReworkStatus, stage: ReworkStatus, ftr: f64) {
        if *status == stage {
            *status = ReworkStatus::Clear;
        } else if *status == ReworkStatus::Clear && !self.ctx.first_time_right(ftr) {
            *status = stage;
        }
    }

    pub(super) fn after_auto_classification(&mut self, mut doc: Document) -> SimulationResult<()> {
        doc.escalation.days_not_finished = 0;
        self.stats.classified_auto.increment();
        if let Err(error) = self.draw_classification(&mut doc) {
            return self.reject(doc, error);
        }
        self.set_completion(&mut doc, CompletionState::PendingCoding);
        if doc.only_classification || doc.rework_event {
            self.dispose_document(doc);
            return Ok(());
        }
        let ftr = self.config.quality.ftr_classification;
        self.settle_credit(&mut doc.rework_status, ReworkStatus::Classification, ftr);
        self.hold_for_coding(doc)
    }

    pub(super) fn after_classification(&mut self, mut doc: Document) -> SimulationResult<()> {
        let combined = self.config.routing.combined_stages;
        // Combined stations also serve documents that only need coding
        if combined && doc.completion == CompletionState::PendingCoding {
            return self.after_coding(doc);
        }

        doc.escalation.complete_stage();
        self.stats.classified_manual.increment();
        if !combined {
            if let Err(error) = self.draw_classification(&mut doc) {
                return self.reject(doc, error);
            }
        }
        self.set_completion(&mut doc, CompletionState::PendingCoding);
        if doc.only_classification || doc.rework_event {
            self.dispose_document(doc);
            return Ok(());
        }
        let ftr = self.config.quality.ftr_classification;
        self.settle_credit(&mut doc.rework_status, ReworkStatus::Classification, ftr);

        if combined {
            self.after_coding(doc)
        } else {
            self.hold_for_coding(doc)
        }
    }

    /// Park a classified document until its coding station opens
    fn hold_for_coding(&mut self, doc: Document) -> SimulationResult<()> {
        match doc.require_category().and_then(|c| self.coding_index(c)) {
            Ok(index) => {
                self.coding_holding[index].enqueue(doc);
                Ok(())
            }
            Err(error) => self.reject(doc, error),
        }
    }

    pub(super) fn after_coding(&mut self, mut doc: Document) -> SimulationResult<()> {
        doc.escalation.complete_stage();
        self.stats.coded.increment();
        if doc.rework_event {
            self.dispose_document(doc);
            return Ok(());
        }
        let ftr = self.config.quality.ftr_coding;
        self.settle_credit(&mut doc.rework_status, ReworkStatus::Coding, ftr);
        self.set_completion(&mut doc, CompletionState::PendingPlacement);

        let category = match doc.require_category() {
            Ok(category) => category,
            Err(error) => return self.reject(doc, error),
        };
        match self.category_holding.get_mut(&category) {
            Some(queue) => {
                queue.enqueue(doc);
                Ok(())
            }
            None => self.reject(doc, SimulationError::MissingCategoryError(category)),
        }
    }

    pub(super) fn after_placement(&mut self, mut packet: Packet) -> SimulationResult<()> {
        self.stats.placed.increment();
        packet.escalation.complete_stage();
        if packet.rework_event {
            self.dispose_packet(packet);
            return Ok(());
        }

        // A document that cannot go back is retired; the rest and the packet carry on
        let mut first_error = None;
        if packet.rework_status == ReworkStatus::Placement {
            packet.rework_status = ReworkStatus::Clear;
        } else {
            let ftr = self.config.quality.ftr_placement;
            self.settle_credit(&mut packet.rework_status, ReworkStatus::Placement, ftr);
            for doc in packet.release_reworked() {
                if let Err(error) = self.send_back_for_rework(doc) {
                    first_error.get_or_insert(error);
                }
            }
        }

        let forwarded = if packet.advance_round() {
            self.move_packet_documents(&mut packet, CompletionState::PendingValidation);
            packet.escalation.priority = defaults::BASE_PRIORITY;
            self.send(self.layout.validation, packet)
        } else {
            packet.escalation.priority += 1;
            self.return_to_placement(packet)
        };
        match first_error {
            Some(error) => forwarded.and(Err(error)),
            None => forwarded,
        }
    }

    /// A document whose credit surfaced at placement re-enters the stage that owns it
    fn send_back_for_rework(&mut self, mut doc: Document) -> SimulationResult<()> {
        trace!(document = %doc.id, status = %doc.rework_status, "released for rework");
        match doc.rework_status {
            ReworkStatus::Classification => {
                self.stats.rework_jobs.classification.increment();
                self.set_completion(&mut doc, CompletionState::PendingClassification);
                self.classification_rework.enqueue(doc);
                Ok(())
            }
            ReworkStatus::Coding => {
                self.stats.rework_jobs.coding.increment();
                self.set_completion(&mut doc, CompletionState::PendingCoding);
                match doc.require_category().and_then(|c| self.coding_index(c)) {
                    Ok(index) => {
                        self.coding_rework[index].enqueue(doc);
                        Ok(())
                    }
                    Err(error) => self.reject(doc, error),
                }
            }
            status => {
                let error = SimulationError::invalid_transition_error(format!(
                    "{} released from placement with {}",
                    doc.id, status
                ));
                self.retire_rejected(doc);
                Err(error)
            }
        }
    }

    /// Straight back into the packet's placement station, skipping the gates
    fn return_to_placement(&mut self, packet: Packet) -> SimulationResult<()> {
        match self.placement_index(packet.category) {
            Ok(index) => self.send(self.layout.placement[index], packet),
            Err(error) => {
                self.stats.documents_rejected.increment_by(packet.len() as u64);
                self.retire_packet(packet, false);
                Err(error)
            }
        }
    }

    pub(super) fn after_validation(&mut self, mut packet: Packet) -> SimulationResult<()> {
        if packet.rework_status == ReworkStatus::Placement {
            self.stats.rework_jobs.placement.increment();
            self.move_packet_documents(&mut packet, CompletionState::PendingPlacement);
            return self.return_to_placement(packet);
        }
        self.move_packet_documents(&mut packet, CompletionState::PendingClientStage);
        self.send(self.layout.nil_report, packet)
    }

    pub(super) fn after_nil_report(&mut self, packet: Packet) -> SimulationResult<()> {
        self.stats.awaiting_feedback.increment_by(packet.workload_factor as u64);
        self.send(self.layout.client_review, packet)
    }

    pub(super) fn after_client_review(&mut self, mut packet: Packet) -> SimulationResult<()> {
        logged(self.stats.awaiting_feedback.decrement_by(packet.workload_factor as u64));
        if self.ctx.percentage() < self.config.feedback_percentage {
            packet.client_feedback = true;
            self.send(self.layout.feedback, packet)
        } else {
            self.send(self.layout.submission, packet)
        }
    }

    /// New document, counted into the system
    pub(super) fn create_document(&mut self, rework_event: bool) -> Document {
        let id = self.ctx.ids.next_document();
        let now = self.ctx.now();
        let doc = if rework_event { Document::change_order(id, now) } else { Document::new(id, now) };
        self.stats.documents_created.increment();
        logged(self.stats.documents_in_system.increment(1.0, now));
        logged(self.stats.move_stage(None, Some(doc.completion), now));
        doc
    }

    /// New packet over `documents`, counted into the system
    pub(super) fn create_packet(
        &mut self,
        category: CategoryId,
        documents: Vec<Document>,
    ) -> Packet {
        let id = self.ctx.ids.next_packet();
        let now = self.ctx.now();
        self.stats.packets_created.increment();
        logged(self.stats.packets_in_system.increment(1.0, now));
        Packet::new(
            id,
            now,
            category,
            documents,
            self.config.workload_factor,
            self.config.levels_to_place,
        )
    }

    pub(super) fn set_completion(&mut self, doc: &mut Document, state: CompletionState) {
        logged(self.stats.move_stage(Some(doc.completion), Some(state), self.ctx.now()));
        doc.completion = state;
    }

    fn move_packet_documents(&mut self, packet: &mut Packet, state: CompletionState) {
        for doc in packet.documents.iter_mut() {
            self.set_completion(doc, state);
        }
    }

    /// Take a document out of the system with a recoverable error
    fn reject(&mut self, doc: Document, error: SimulationError) -> SimulationResult<()> {
        warn!("Rejecting {}: {}", doc.id, error);
        self.retire_rejected(doc);
        Err(error)
    }

    fn retire_rejected(&mut self, doc: Document) {
        self.stats.documents_rejected.increment();
        self.retire_document(doc, false);
    }

    /// Dispose a document, counting it as submitted when it went the whole way
    pub(super) fn dispose_document(&mut self, doc: Document) {
        let submitted = doc.counts_as_submitted();
        self.stats.documents_completed.increment();
        self.retire_document(doc, submitted);
    }

    fn retire_document(&mut self, doc: Document, submitted: bool) {
        let now = self.ctx.now();
        let system_time = now - doc.created_at;
        logged(self.stats.move_stage(Some(doc.completion), None, now));
        logged(self.stats.documents_in_system.decrement(1.0, now));
        self.stats.documents_disposed.increment();
        self.stats.disposal_system_time.record(system_time);
        if submitted {
            self.stats.documents_submitted.increment();
            self.stats.document_system_time.record(system_time);
        }
        trace!(document = %doc.id, submitted, system_time, "document disposed");
    }

    /// Dispose a packet and every document bound to it
    pub(super) fn dispose_packet(&mut self, packet: Packet) {
        self.retire_packet(packet, true);
    }

    fn retire_packet(&mut self, packet: Packet, completed: bool) {
        let now = self.ctx.now();
        if !packet.rework_event {
            self.stats.packet_system_time.record(now - packet.created_at);
        }
        self.stats.packets_disposed.increment();
        if completed {
            self.stats.packets_completed.increment();
        }
        logged(self.stats.packets_in_system.decrement(1.0, now));
        trace!(packet = %packet.id, documents = packet.len(), "packet disposed");
        for doc in packet.documents {
            if completed {
                self.dispose_document(doc);
            } else {
                self.retire_document(doc, false);
            }
        }
    }

    /// Dispose whatever kind of job this is
    pub(super) fn dispose_job(&mut self, job: Job) {
        match job {
            Job::Document(doc) => self.dispose_document(doc),
            Job::Packet(packet) => self.dispose_packet(packet),
        }
    }
}
