//! Workflow orchestrator
//!
//! The orchestrator owns every station, holding queue, rework queue and routing
//! table of one replication. It is the only component that schedules events or
//! disposes jobs. Business rules live in two sibling modules: `gates` (the
//! day-boundary gates and packet batching) and `lifecycle` (arrivals, change
//! orders, the completion receivers and disposal).

use super::{
    ErrorPolicy, EventHandle, RecoveryContext, RecoveryStrategy, RunContext, RunStatistics,
    SimEvent, SimulationError, SimulationResult, WorkCalendar,
};
use crate::catalog::CategoryCatalog;
use crate::entities::{Document, Job, Packet};
use crate::resources::{ResourcePool, Role, Workforce};
use crate::routing::{AssignmentPlan, CategoryRouting, TrainingSplit, WorkloadRouter};
use crate::station::{JobQueue, Receiver, ServicePolicy, Station};
use crate::types::{
    CategoryId, EmployeeId, QueueDiscipline, SimulationConfig, StationId, SupportTask,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Station identifiers per stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationLayout {
    /// Automated classifier
    pub automated: StationId,
    /// Stations doing classification (the combined stations in combined mode)
    pub classification: Vec<StationId>,
    /// Stations doing coding (the combined stations in combined mode)
    pub coding: Vec<StationId>,
    /// Placement stations
    pub placement: Vec<StationId>,
    /// Validation
    pub validation: StationId,
    /// NIL report
    pub nil_report: StationId,
    /// Client review
    pub client_review: StationId,
    /// Feedback processing
    pub feedback: StationId,
    /// Submission
    pub submission: StationId,
    /// Placement change requests
    pub change_request: StationId,
}

/// Jobs still in the system at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Census {
    /// Documents, including those bound to packets
    pub documents: u64,
    /// Packets
    pub packets: u64,
}

impl Census {
    fn add_job(&mut self, job: &Job) {
        match job {
            Job::Document(_) => self.documents += 1,
            Job::Packet(packet) => self.add_packet(packet),
        }
    }

    fn add_packet(&mut self, packet: &Packet) {
        self.packets += 1;
        self.documents += packet.len() as u64;
    }
}

/// Jobs parked in rework queues, per stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReworkBacklog {
    /// Documents waiting for classification rework
    pub classification: usize,
    /// Documents waiting for coding rework
    pub coding: usize,
    /// Packets waiting for placement rework
    pub placement: usize,
}

/// One replication of the document flow
#[derive(Debug)]
pub struct Orchestrator {
    pub(super) config: SimulationConfig,
    pub(super) catalog: CategoryCatalog,
    pub(super) work_calendar: WorkCalendar,
    pub(super) ctx: RunContext,
    pub(super) stats: RunStatistics,
    pub(super) policy: ErrorPolicy,
    pub(super) stations: Vec<Station>,
    pub(super) layout: StationLayout,
    pub(super) classification_intake: JobQueue<Document>,
    pub(super) classification_rework: JobQueue<Document>,
    pub(super) coding_holding: Vec<JobQueue<Document>>,
    pub(super) coding_rework: Vec<JobQueue<Document>>,
    pub(super) category_holding: BTreeMap<CategoryId, JobQueue<Document>>,
    pub(super) placement_holding: Vec<JobQueue<Packet>>,
    pub(super) placement_rework: Vec<JobQueue<Packet>>,
    pub(super) classification_router: WorkloadRouter,
    pub(super) classification_plan: AssignmentPlan,
    pub(super) coding_routing: CategoryRouting,
    pub(super) placement_routing: CategoryRouting,
    pub(super) change_order: Option<EventHandle>,
    started: bool,
    events_processed: u64,
}

impl Orchestrator {
    /// Build a replication for `config` over the categories of `catalog`
    #[instrument(skip(config, catalog), fields(period_days = config.production_period_days, combined = config.routing.combined_stages))]
    pub fn new(
        config: &SimulationConfig,
        catalog: CategoryCatalog,
        seed: Option<u64>,
    ) -> SimulationResult<Self> {
        config.validate().map_err(|e| SimulationError::configuration_error(e.to_string()))?;

        let mut ctx = RunContext::new(config, seed);
        let (stations, layout) = build_stations(config, &ctx.workforce);
        let discipline = config.routing.queue_discipline;

        let classification_router = WorkloadRouter::with_split(
            config.routing.classification_rule,
            layout.classification.len(),
            TrainingSplit::for_config(config),
        );
        let coding_router = WorkloadRouter::new(config.routing.coding_rule, layout.coding.len());
        let placement_router =
            WorkloadRouter::new(config.routing.placement_rule, layout.placement.len());
        let coding_routing =
            CategoryRouting::assign(&coding_router, catalog.categories(), &mut ctx.rng)?;
        let placement_routing =
            CategoryRouting::assign(&placement_router, catalog.categories(), &mut ctx.rng)?;

        let queues = |count: usize| -> Vec<JobQueue<Document>> {
            (0..count).map(|_| JobQueue::new(discipline)).collect()
        };
        let packet_queues = |count: usize| -> Vec<JobQueue<Packet>> {
            (0..count).map(|_| JobQueue::new(discipline)).collect()
        };

        info!(
            "Initialized replication with {} stations, {} categories, {} servers",
            stations.len(),
            catalog.len(),
            ctx.workforce.len()
        );

        Ok(Self {
            work_calendar: WorkCalendar::new(config),
            stats: RunStatistics::new(0.0),
            policy: ErrorPolicy::new(),
            classification_intake: JobQueue::new(discipline),
            classification_rework: JobQueue::new(discipline),
            coding_holding: queues(layout.coding.len()),
            coding_rework: queues(layout.coding.len()),
            category_holding: catalog.categories().map(|c| (c, JobQueue::new(discipline))).collect(),
            placement_holding: packet_queues(layout.placement.len()),
            placement_rework: packet_queues(layout.placement.len()),
            classification_router,
            classification_plan: AssignmentPlan::new(),
            coding_routing,
            placement_routing,
            change_order: None,
            started: false,
            events_processed: 0,
            config: config.clone(),
            catalog,
            ctx,
            stations,
            layout,
        })
    }

    /// Replace the error policy
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Configuration of this replication
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Statistics collected so far
    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    /// Current simulated time
    pub fn now(&self) -> f64 {
        self.ctx.now()
    }

    /// Every server of this replication
    pub fn workforce(&self) -> &Workforce {
        &self.ctx.workforce
    }

    /// Station identifiers per stage
    pub fn layout(&self) -> &StationLayout {
        &self.layout
    }

    /// Look up a station
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.0)
    }

    /// All stations
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Events handled so far
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Day arithmetic of this replication
    pub fn work_calendar(&self) -> &WorkCalendar {
        &self.work_calendar
    }

    /// Run the whole production period
    pub fn run(&mut self) -> SimulationResult<()> {
        let end = self.work_calendar.run_length();
        self.run_until(end)
    }

    /// Handle every event due at or before `limit`
    ///
    /// Can be called repeatedly with increasing limits.
    #[instrument(skip(self), fields(now = self.ctx.now()))]
    pub fn run_until(&mut self, limit: f64) -> SimulationResult<()> {
        self.start()?;

        while let Some(time) = self.ctx.calendar.peek_time() {
            if time > limit {
                break;
            }
            let Some((_, _, event)) = self.ctx.calendar.pop_next() else {
                break;
            };
            self.events_processed += 1;
            let label = event.label();

            if let Err(error) = self.dispatch(event) {
                let _span = crate::error_span!("event_failed", event = label.as_str()).entered();
                let context = RecoveryContext::skip().with_context(format!(
                    "{} at t={:.1}",
                    label,
                    self.ctx.now()
                ));
                match self.policy.handle_error(&error, &context) {
                    RecoveryStrategy::Skip => self.stats.skipped_operations.increment(),
                    RecoveryStrategy::Abort => return Err(error),
                }
            }
        }

        debug!(
            "Stopped at t={:.1} after {} events, {} pending",
            self.ctx.now(),
            self.events_processed,
            self.ctx.calendar.len()
        );
        Ok(())
    }

    fn start(&mut self) -> SimulationResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        let timeline = self.work_calendar.timeline(&self.config.day_plan);
        debug!("Scheduling {} calendar events", timeline.len());
        for (time, event) in timeline {
            self.ctx.calendar.schedule_at(time, event)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, event: SimEvent) -> SimulationResult<()> {
        match event {
            SimEvent::DocumentArrivals => self.document_arrivals(),
            SimEvent::ChangeOrder => self.change_order_arrives(),
            SimEvent::GateOpen(gate) => self.open_gate(gate),
            SimEvent::GateClose(gate) => self.close_gate(gate),
            SimEvent::PacketBatching => self.batch_packets(),
            SimEvent::WeekBoundary(week) => {
                self.stats.close_week(self.ctx.now());
                crate::sim_event!(
                    info,
                    "Week closed",
                    week = week,
                    documents_in_system = self.stats.documents_in_system.value(),
                    submitted = self.stats.documents_submitted.value(),
                );
                Ok(())
            }
            SimEvent::ServiceComplete { station, member, job } => {
                self.service_complete(station, member, job)
            }
        }
    }

    fn service_complete(
        &mut self,
        station: StationId,
        member: EmployeeId,
        job: Job,
    ) -> SimulationResult<()> {
        let receiver = self
            .stations
            .get_mut(station.0)
            .ok_or_else(|| SimulationError::routing_error(format!("unknown station {}", station)))?
            .complete(member, &mut self.ctx)?;
        self.wake_stations_sharing(member)?;
        self.deliver(receiver, job)
    }

    /// Support stations share their servers; a release wakes every station waiting on it
    fn wake_stations_sharing(&mut self, member: EmployeeId) -> SimulationResult<()> {
        for station in &mut self.stations {
            if !station.queue().is_empty() && station.pool().members().contains(&member) {
                station.serve_next(&mut self.ctx)?;
            }
        }
        Ok(())
    }

    /// Hand a completed job to its receiver
    fn deliver(&mut self, receiver: Receiver, job: Job) -> SimulationResult<()> {
        match receiver {
            Receiver::AfterAutoClassification => {
                let doc = self.expect_document(job, "automated classification")?;
                self.after_auto_classification(doc)
            }
            Receiver::AfterClassification => {
                let doc = self.expect_document(job, "classification")?;
                self.after_classification(doc)
            }
            Receiver::AfterCoding => {
                let doc = self.expect_document(job, "coding")?;
                self.after_coding(doc)
            }
            Receiver::AfterPlacement => {
                let packet = self.expect_packet(job, "placement")?;
                self.after_placement(packet)
            }
            Receiver::AfterValidation => {
                let packet = self.expect_packet(job, "validation")?;
                self.after_validation(packet)
            }
            Receiver::AfterNilReport => {
                let packet = self.expect_packet(job, "NIL report")?;
                self.after_nil_report(packet)
            }
            Receiver::AfterClientReview => {
                let packet = self.expect_packet(job, "client review")?;
                self.after_client_review(packet)
            }
            Receiver::Forward(next) => self.send(next, job),
            Receiver::AfterSubmission => {
                let packet = self.expect_packet(job, "submission")?;
                self.dispose_packet(packet);
                Ok(())
            }
            Receiver::Dispose => {
                self.dispose_job(job);
                Ok(())
            }
        }
    }

    pub(super) fn expect_document(&self, job: Job, stage: &str) -> SimulationResult<Document> {
        match job {
            Job::Document(doc) => Ok(doc),
            Job::Packet(packet) => Err(SimulationError::invalid_transition_error(format!(
                "{} reached the {} receiver",
                packet.id, stage
            ))),
        }
    }

    pub(super) fn expect_packet(&self, job: Job, stage: &str) -> SimulationResult<Packet> {
        match job {
            Job::Packet(packet) => Ok(packet),
            Job::Document(doc) => Err(SimulationError::invalid_transition_error(format!(
                "{} reached the {} receiver",
                doc.id, stage
            ))),
        }
    }

    /// Send a job to a station
    pub(super) fn send(&mut self, station: StationId, job: impl Into<Job>) -> SimulationResult<()> {
        let target = self
            .stations
            .get_mut(station.0)
            .ok_or_else(|| SimulationError::routing_error(format!("unknown station {}", station)))?;
        target.receive(job.into(), &mut self.ctx)
    }

    /// Index of the coding station (and its queues) responsible for `category`
    pub(super) fn coding_index(&self, category: CategoryId) -> SimulationResult<usize> {
        self.coding_routing.station_for(category)
    }

    /// Index of the placement station (and its queues) responsible for `category`
    pub(super) fn placement_index(&self, category: CategoryId) -> SimulationResult<usize> {
        self.placement_routing.station_for(category)
    }

    /// Count every job still in a queue or in service
    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for station in &self.stations {
            for job in station.queue().iter() {
                census.add_job(job);
            }
        }
        for event in self.ctx.calendar.pending() {
            if let SimEvent::ServiceComplete { job, .. } = event {
                census.add_job(job);
            }
        }

        let document_queues = [&self.classification_intake, &self.classification_rework]
            .into_iter()
            .chain(&self.coding_holding)
            .chain(&self.coding_rework)
            .chain(self.category_holding.values());
        for queue in document_queues {
            census.documents += queue.len() as u64;
        }
        for queue in self.placement_holding.iter().chain(&self.placement_rework) {
            for packet in queue.iter() {
                census.add_packet(packet);
            }
        }
        census
    }

    /// Jobs waiting in rework queues
    pub fn rework_backlog(&self) -> ReworkBacklog {
        ReworkBacklog {
            classification: self.classification_rework.len(),
            coding: self.coding_rework.iter().map(JobQueue::len).sum(),
            placement: self.placement_rework.iter().map(JobQueue::len).sum(),
        }
    }

    /// Documents waiting in the classification intake queue
    pub fn intake_len(&self) -> usize {
        self.classification_intake.len()
    }
}

fn pools(members: &[EmployeeId], single_queue: bool) -> Vec<ResourcePool> {
    if single_queue {
        vec![ResourcePool::new(members.to_vec())]
    } else {
        members.iter().map(|&member| ResourcePool::single(member)).collect()
    }
}

/// Create every station and record where each stage lives
fn build_stations(config: &SimulationConfig, workforce: &Workforce) -> (Vec<Station>, StationLayout) {
    let discipline: QueueDiscipline = config.routing.queue_discipline;
    let mut stations: Vec<Station> = Vec::new();
    let mut add = |name: String, policy: ServicePolicy, pool: ResourcePool, receiver: Receiver| {
        let id = StationId(stations.len());
        stations.push(Station::new(id, name, policy, discipline, pool, receiver));
        id
    };

    let coders = workforce.members(Role::Coding);
    let automated = workforce.members(Role::AutomatedClassifier);
    let clients = workforce.members(Role::Client);
    let support = ResourcePool::new(workforce.members(Role::Support));

    let automated = add(
        "Automated Classification".to_string(),
        ServicePolicy::AutomatedClassification,
        ResourcePool::new(automated),
        Receiver::AfterAutoClassification,
    );

    let (classification, coding) = if config.routing.combined_stages {
        let combined: Vec<StationId> = pools(&coders, config.routing.coding_single())
            .into_iter()
            .enumerate()
            .map(|(i, pool)| {
                add(
                    format!("Classification + Coding {}", i),
                    ServicePolicy::Combined,
                    pool,
                    Receiver::AfterClassification,
                )
            })
            .collect();
        (combined.clone(), combined)
    } else {
        let classifiers = if config.staffing.has_dedicated_classification() {
            workforce.members(Role::Classification)
        } else {
            coders.clone()
        };
        let classification: Vec<StationId> =
            pools(&classifiers, config.routing.classification_single())
                .into_iter()
                .enumerate()
                .map(|(i, pool)| {
                    add(
                        format!("Classification {}", i),
                        ServicePolicy::Classification,
                        pool,
                        Receiver::AfterClassification,
                    )
                })
                .collect();
        let coding: Vec<StationId> = pools(&coders, config.routing.coding_single())
            .into_iter()
            .enumerate()
            .map(|(i, pool)| {
                add(format!("Coding {}", i), ServicePolicy::Coding, pool, Receiver::AfterCoding)
            })
            .collect();
        (classification, coding)
    };

    let placers = workforce.members(Role::Placement);
    let placement: Vec<StationId> = pools(&placers, config.routing.placement_single_queue)
        .into_iter()
        .enumerate()
        .map(|(i, pool)| {
            add(format!("Placement {}", i), ServicePolicy::Placement, pool, Receiver::AfterPlacement)
        })
        .collect();

    let validation = add(
        "Validation".to_string(),
        ServicePolicy::Support(SupportTask::Validation),
        support.clone(),
        Receiver::AfterValidation,
    );
    let nil_report = add(
        "NIL Report".to_string(),
        ServicePolicy::Support(SupportTask::NilReport),
        support.clone(),
        Receiver::AfterNilReport,
    );
    let client_review = add(
        "Client Review".to_string(),
        ServicePolicy::ClientReview,
        ResourcePool::new(clients),
        Receiver::AfterClientReview,
    );
    let submission = add(
        "Submission".to_string(),
        ServicePolicy::Support(SupportTask::Submission),
        support.clone(),
        Receiver::AfterSubmission,
    );
    let feedback = add(
        "Feedback".to_string(),
        ServicePolicy::Support(SupportTask::Feedback),
        support.clone(),
        Receiver::Forward(submission),
    );
    let change_request = add(
        "Placement Change Request".to_string(),
        ServicePolicy::Support(SupportTask::PlacementChangeRequest),
        support,
        Receiver::Dispose,
    );

    let layout = StationLayout {
        automated,
        classification,
        coding,
        placement,
        validation,
        nil_report,
        client_review,
        feedback,
        submission,
        change_request,
    };
    (stations, layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DayPlan;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            production_period_days: 10,
            arrival_mean: 60.0,
            arrival_std_dev: 10.0,
            seed: Some(7),
            day_plan: DayPlan {
                arrival_days: vec![0, 5],
                classification_days: vec![1, 3, 6, 8],
                coding_days: vec![2, 4, 7, 9],
                rework_days: vec![5, 10],
                placement_days: vec![6, 7, 8, 9],
                placement_rework_days: vec![5, 10],
                batching_weeks: vec![1],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_layout_one_station_per_employee() {
        let orchestrator =
            Orchestrator::new(&small_config(), CategoryCatalog::default(), Some(1)).unwrap();
        let layout = orchestrator.layout();
        // No classification team: coders classify
        assert_eq!(layout.classification.len(), 5);
        assert_eq!(layout.coding.len(), 5);
        assert_eq!(layout.placement.len(), 5);
        assert_ne!(layout.classification, layout.coding);
        // auto + 5 + 5 + 5 + six support and client stations
        assert_eq!(orchestrator.stations().len(), 22);
    }

    #[test]
    fn test_single_queue_and_combined_layouts() {
        let mut config = small_config();
        config.routing.placement_single_queue = true;
        config.routing.combined_stages = true;
        config.routing.combined_single_queue = true;
        let orchestrator = Orchestrator::new(&config, CategoryCatalog::default(), Some(1)).unwrap();
        let layout = orchestrator.layout();
        assert_eq!(layout.placement.len(), 1);
        assert_eq!(layout.coding.len(), 1);
        assert_eq!(layout.classification, layout.coding);
        let combined = orchestrator.station(layout.coding[0]).unwrap();
        assert_eq!(combined.policy(), ServicePolicy::Combined);
        assert_eq!(combined.pool().len(), 5);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = small_config();
        config.eligible_percentage = 1.5;
        let result = Orchestrator::new(&config, CategoryCatalog::default(), Some(1));
        assert!(matches!(result, Err(SimulationError::ConfigurationError(_))));
    }

    #[test]
    fn test_run_conserves_documents() {
        let mut orchestrator =
            Orchestrator::new(&small_config(), CategoryCatalog::default(), Some(3)).unwrap();
        orchestrator.run().unwrap();
        let stats = orchestrator.statistics();
        let census = orchestrator.census();
        assert!(stats.documents_created.value() > 0);
        assert_eq!(
            stats.documents_created.value(),
            stats.documents_disposed.value() + census.documents
        );
        assert_eq!(stats.packets_created.value(), stats.packets_disposed.value() + census.packets);
        assert_eq!(stats.skipped_operations.value(), 0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = || {
            let mut orchestrator =
                Orchestrator::new(&small_config(), CategoryCatalog::default(), Some(9)).unwrap();
            orchestrator.run().unwrap();
            (
                orchestrator.statistics().documents_created.value(),
                orchestrator.statistics().documents_disposed.value(),
                orchestrator.events_processed(),
            )
        };
        assert_eq!(run(), run());
    }
}
